//! Command-line front end: play a game at the console, simulate many automated
//! games in parallel, or check a map file.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use risk_engine::{
    board::GameMap,
    console::{self, Decider, LineDecider},
    game::Game,
    game_config::{GameConfig, PlayerConfig},
    map_file,
    odds::OddsTable,
    strategy::StrategyKind,
    validator,
};

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "risk_engine")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play one game, with human seats answered on the console
    Play {
        /// Map file (default: the bundled world map)
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// JSON table setup; overrides --players and --human
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of players when no config is given
        #[arg(short, long, default_value = "3")]
        players: usize,

        /// Take the first seat yourself
        #[arg(long)]
        human: bool,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Stop after this many rounds without a winner
        #[arg(short, long)]
        turn_limit: Option<u32>,

        /// Precomputed conquest odds shown to human players
        #[arg(long)]
        odds_table: Option<PathBuf>,

        /// Write the final game state as JSON
        #[arg(long)]
        dump_state: Option<PathBuf>,
    },

    /// Run many automated games in parallel and count the winners
    Simulate {
        /// Map file (default: the bundled world map)
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Strategies, one per seat
        #[arg(
            short = 'S',
            long,
            value_delimiter = ',',
            default_value = "aggressive,benevolent,random,cheater"
        )]
        strategies: Vec<StrategyKind>,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Rounds per game before it is called a draw
        #[arg(short, long, default_value = "100")]
        turn_limit: u32,

        /// Print the tally as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a map file is playable
    Validate {
        /// Map file to check
        #[arg(short, long)]
        map: PathBuf,
    },
}

fn load_map(path: Option<&PathBuf>) -> Result<GameMap, map_file::MapFileError> {
    match path {
        Some(path) => map_file::load_map(path),
        None => map_file::default_map(),
    }
}

/// A decider that declines everything. Stands in for seats nobody answers.
fn silent_decider() -> Box<dyn Decider> {
    Box::new(LineDecider::new(std::io::empty(), std::io::sink()))
}

#[allow(clippy::too_many_arguments)]
fn play(
    map: Option<PathBuf>,
    config: Option<PathBuf>,
    players: usize,
    human: bool,
    seed: Option<u64>,
    turn_limit: Option<u32>,
    odds_table: Option<PathBuf>,
    dump_state: Option<PathBuf>,
) -> CliResult {
    let map = load_map(map.as_ref())?;
    let mut config = match config {
        Some(path) => GameConfig::load_from_file(path)?,
        None => {
            let mut config = GameConfig::default_for(players);
            if human {
                if let Some(seat) = config.players.first_mut() {
                    *seat = PlayerConfig {
                        name: "You".to_string(),
                        strategy: StrategyKind::Human,
                    };
                }
            }
            config
        }
    };
    if seed.is_some() {
        config.seed = seed;
    }
    if turn_limit.is_some() {
        config.turn_limit = turn_limit;
    }

    let mut game = Game::from_config(map, &config, |_| Box::new(console::stdio_decider()))?;
    if let Some(path) = odds_table {
        let odds = OddsTable::load(&path)?;
        for player in &mut game.players {
            player.strategy.set_odds_table(odds.clone());
        }
    }

    let outcome = game.run()?;
    match outcome.winner.and_then(|id| game.player(id)) {
        Some(winner) => println!(
            "{} ({}) wins after {} rounds",
            winner.name,
            winner.strategy.kind(),
            outcome.rounds
        ),
        None => println!("No winner after {} rounds", outcome.rounds),
    }

    if let Some(path) = dump_state {
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &game.get_game_state())?;
        tracing::info!(path = %path.display(), "game state written");
    }
    Ok(())
}

fn simulate(
    map: Option<PathBuf>,
    strategies: Vec<StrategyKind>,
    games: u64,
    seed: u64,
    turn_limit: u32,
    json: bool,
) -> CliResult {
    let map = load_map(map.as_ref())?;
    let config = GameConfig {
        players: strategies
            .iter()
            .enumerate()
            .map(|(i, strategy)| PlayerConfig {
                name: format!("Player {} ({strategy})", i + 1),
                strategy: *strategy,
            })
            .collect(),
        seed: None,
        turn_limit: Some(turn_limit),
    };
    config.validate_automated()?;
    validator::check(&map)?;

    let start = Instant::now();
    let winners: Vec<Option<String>> = (0..games)
        .into_par_iter()
        .map(|i| -> risk_engine::GameResult<Option<String>> {
            let mut config = config.clone();
            config.seed = Some(seed.wrapping_add(i));
            let mut game = Game::from_config(map.clone(), &config, |_| silent_decider())?;
            let outcome = game.run()?;
            let winner = outcome
                .winner
                .and_then(|id| game.player(id))
                .map(|p| p.name.clone());
            Ok(winner)
        })
        .collect::<Result<_, risk_engine::GameError>>()?;

    let mut tally: BTreeMap<String, u64> = config
        .players
        .iter()
        .map(|p| (p.name.clone(), 0))
        .collect();
    let mut draws = 0u64;
    for winner in winners {
        match winner {
            Some(name) => *tally.entry(name).or_insert(0) += 1,
            None => draws += 1,
        }
    }
    tracing::info!(games, elapsed = ?start.elapsed(), "simulation finished");

    if json {
        let report = serde_json::json!({ "games": games, "wins": tally, "draws": draws });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{games} games, {turn_limit} round limit");
        for (name, wins) in &tally {
            println!("  {name:<28} {wins:>6}");
        }
        println!("  {:<28} {draws:>6}", "draws");
    }
    Ok(())
}

fn validate(map: PathBuf) -> CliResult {
    let map = map_file::load_map(&map)?;
    validator::check(&map)?;
    println!(
        "Map is valid: {} countries in {} continents",
        map.country_count(),
        map.continents().count()
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("risk_engine=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match args.command {
        Commands::Play {
            map,
            config,
            players,
            human,
            seed,
            turn_limit,
            odds_table,
            dump_state,
        } => play(map, config, players, human, seed, turn_limit, odds_table, dump_state),

        Commands::Simulate {
            map,
            strategies,
            games,
            seed,
            turn_limit,
            json,
        } => simulate(map, strategies, games, seed, turn_limit, json),

        Commands::Validate { map } => validate(map),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
