//! Computes the conquest odds table once and stores it for `play --odds-table`.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use risk_engine::odds::OddsTable;

#[derive(Parser, Debug)]
#[command(name = "precompute_conquest_odds")]
#[command(about = "Precompute the probability of conquering a country", long_about = None)]
struct Args {
    /// Largest attacking army in the table
    #[arg(default_value = "100")]
    max_attackers: u32,

    /// Largest defending army in the table
    #[arg(default_value = "100")]
    max_defenders: u32,

    /// Where to write the table
    #[arg(short, long, default_value = "conquest_odds.bin")]
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let start = Instant::now();
    let table = OddsTable::compute(args.max_attackers, args.max_defenders);
    tracing::info!(
        attackers = args.max_attackers,
        defenders = args.max_defenders,
        elapsed = ?start.elapsed(),
        "odds table computed"
    );

    match table.save(&args.output) {
        Ok(()) => {
            tracing::info!(path = %args.output.display(), "odds table written");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
