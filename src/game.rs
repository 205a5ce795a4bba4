// game.rs
use crate::board::GameMap;
use crate::combat::AttackPhaseState;
use crate::console::Decider;
use crate::error::{GameError, GameResult};
use crate::game_config::{GameConfig, PlayerConfig};
use crate::player::{Player, PlayerId, PlayerSummary};
use crate::startup;
use crate::strategy::{self, AttackDecision, FortifyDecision};
use crate::turn_phase::TurnPhase;
use crate::validator;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

/// Snapshot of a running game for reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub current_player: String,
    pub current_turn: usize,
    pub round: u32,
    pub turns_played: u32,
    pub turn_phase: TurnPhase,
    pub reinforcement_armies: u32,
    pub winner: Option<PlayerId>,
    pub players: Vec<PlayerSummary>,
    pub map: GameMap,
}

/// How a finished game ended.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner: Option<PlayerId>,
    pub rounds: u32,
    pub turns_played: u32,
}

/// One game session: the map, the players in seating order and the phase
/// machine state. Everything is owned here and mutated through `&mut self`.
#[derive(Debug)]
pub struct Game {
    pub map: GameMap,
    pub players: Vec<Player>,
    pub num_players: usize,
    pub current_turn: usize,
    pub round: u32,
    pub turns_played: u32,
    pub turn_phase: TurnPhase,
    pub reinforcement_armies: u32,
    pub turn_limit: Option<u32>,
    pub winner: Option<PlayerId>,
    pub(crate) rng: ChaCha8Rng,
}

impl Game {
    /// Takes a validated map and a seated table. The game starts in
    /// [`TurnPhase::Startup`]; nothing is dealt until the first [`step`](Self::step).
    pub fn new(
        map: GameMap,
        players: Vec<Player>,
        seed: Option<u64>,
        turn_limit: Option<u32>,
    ) -> GameResult<Self> {
        validator::check(&map)?;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            return Err(GameError::Config(format!(
                "a game needs {MIN_PLAYERS} to {MAX_PLAYERS} players, got {}",
                players.len()
            )));
        }
        let mut ids = HashSet::new();
        if let Some(duplicate) = players.iter().find(|p| !ids.insert(p.id)) {
            return Err(GameError::DuplicateEntity(format!("player id {}", duplicate.id)));
        }

        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            map,
            num_players: players.len(),
            players,
            current_turn: 0,
            round: 0,
            turns_played: 0,
            turn_phase: TurnPhase::Startup,
            reinforcement_armies: 0,
            turn_limit,
            winner: None,
            rng,
        })
    }

    /// Seats the players described by `config`. Human seats get their input
    /// source from `human_decider`.
    pub fn from_config<F>(map: GameMap, config: &GameConfig, human_decider: F) -> GameResult<Self>
    where
        F: FnMut(&PlayerConfig) -> Box<dyn Decider>,
    {
        config.validate()?;
        let players = config.generate_players(human_decider)?;
        Self::new(map, players, config.seed, config.turn_limit)
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_turn]
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn is_over(&self) -> bool {
        self.turn_phase == TurnPhase::GameOver
    }

    /// Plays until the game is over.
    pub fn run(&mut self) -> GameResult<GameOutcome> {
        while !self.is_over() {
            self.step()?;
        }
        Ok(self.outcome())
    }

    pub fn outcome(&self) -> GameOutcome {
        GameOutcome {
            winner: self.winner,
            rounds: self.round,
            turns_played: self.turns_played,
        }
    }

    pub fn get_game_state(&self) -> GameState {
        GameState {
            current_player: self.current_player().name.clone(),
            current_turn: self.current_turn,
            round: self.round,
            turns_played: self.turns_played,
            turn_phase: self.turn_phase,
            reinforcement_armies: self.reinforcement_armies,
            winner: self.winner,
            players: self.players.iter().map(|p| p.summary(&self.map)).collect(),
            map: self.map.clone(),
        }
    }

    pub(crate) fn run_startup(&mut self) -> GameResult<()> {
        startup::assign_turn_order(&mut self.players);
        let ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        startup::assign_countries_to_players(&mut self.map, &ids, &mut self.rng)?;

        let allotment = startup::initial_army_calculation(self.num_players, self.map.country_count())?;
        startup::place_initial_armies(&mut self.map, &mut self.players, allotment, &mut self.rng)?;

        tracing::info!(
            players = self.num_players,
            countries = self.map.country_count(),
            allotment,
            "startup complete"
        );
        Ok(())
    }

    pub(crate) fn reinforce(&mut self) -> GameResult<()> {
        let index = self.current_turn;
        let player_id = self.players[index].id;
        let armies = self.reinforcement_armies;
        if armies == 0 {
            return Ok(());
        }

        let plan = self.players[index]
            .strategy
            .decide_reinforcement(player_id, &self.map, armies, &mut self.rng);
        match plan {
            strategy::ReinforcementPlan::Place(placements) => {
                startup::apply_placements(&mut self.map, player_id, &placements, armies)?;
                tracing::debug!(player = player_id, ?placements, "reinforced");
            }
            strategy::ReinforcementPlan::DoubleAll => {
                let owned: Vec<String> = self.map.conquered_countries(player_id).into_iter().collect();
                strategy::double_armies(&mut self.map, &owned)?;
                tracing::debug!(player = player_id, countries = owned.len(), "cheater doubled armies");
            }
        }
        self.reinforcement_armies = 0;
        Ok(())
    }

    /// Lets the current player declare attacks until it declines, runs out of
    /// legal attacks or owns the whole map.
    pub(crate) fn attack(&mut self) -> GameResult<()> {
        let index = self.current_turn;
        let player_id = self.players[index].id;

        while self.map.owner_of_all().is_none() {
            let decision = self.players[index]
                .strategy
                .decide_attack(player_id, &self.map, &mut self.rng);
            match decision {
                AttackDecision::Decline => break,
                AttackDecision::CheatConquer => {
                    let standing = self.standing_players();
                    let taken = strategy::cheat_conquer(player_id, &mut self.map)?;
                    tracing::info!(player = player_id, ?taken, "cheater took neighbouring countries");
                    self.report_eliminations(&standing);
                }
                AttackDecision::Attack { from, to, dice } => {
                    self.declare_attack(index, &from, &to, dice)?;
                }
            }
        }
        Ok(())
    }

    /// Resolves one attack by the player at `attacker_index`.
    pub fn declare_attack(
        &mut self,
        attacker_index: usize,
        from: &str,
        to: &str,
        attacker_dice: u32,
    ) -> GameResult<bool> {
        let defender_id = self
            .map
            .owner(to)?
            .ok_or_else(|| GameError::IllegalAction(format!("'{to}' has no owner")))?;
        let defender_index = self
            .players
            .iter()
            .position(|p| p.id == defender_id)
            .ok_or_else(|| GameError::IllegalAction(format!("player {defender_id} is not seated")))?;
        if defender_index == attacker_index {
            return Err(GameError::IllegalAction(
                "a player cannot attack themselves".to_string(),
            ));
        }

        let standing = self.standing_players();
        let defender_dice = self.players[defender_index]
            .strategy
            .decide_defense_dice(&self.map, to, &mut self.rng);

        let attacker = &self.players[attacker_index];
        let defender = &self.players[defender_index];
        let mut state = AttackPhaseState::new(attacker.id, from, defender.id, to)
            .with_player_names(&attacker.name, &defender.name)
            .with_dice(attacker_dice, defender_dice);

        let attacker_won = self.players[attacker_index]
            .strategy
            .fight(&mut self.map, &mut state, &mut self.rng)?;

        let message = format!(
            "{} attacked {} from {}: {:?} against {:?}{}",
            state.attacking_player,
            to,
            from,
            state.attacker_rolls,
            state.defender_rolls,
            if attacker_won { ", country conquered" } else { "" }
        );
        self.players[attacker_index].strategy.inform(&message);
        self.players[defender_index].strategy.inform(&message);

        if attacker_won {
            self.report_eliminations(&standing);
        }
        Ok(attacker_won)
    }

    pub(crate) fn fortify(&mut self) -> GameResult<()> {
        let index = self.current_turn;
        let player_id = self.players[index].id;

        let decision = self.players[index]
            .strategy
            .decide_fortify(player_id, &self.map, &mut self.rng);
        match decision {
            FortifyDecision::Skip => {}
            FortifyDecision::Move { from, to, armies } => {
                self.move_armies(player_id, &from, &to, armies)?;
                tracing::debug!(player = player_id, %from, %to, armies, "fortified");
            }
            FortifyDecision::DoubleFrontier => {
                let frontier = strategy::frontier_countries(player_id, &self.map);
                strategy::double_armies(&mut self.map, &frontier)?;
                tracing::debug!(player = player_id, ?frontier, "cheater doubled frontier");
            }
        }
        Ok(())
    }

    /// Moves armies between two of the player's countries joined by an
    /// unbroken chain of the player's own territory.
    pub fn move_armies(
        &mut self,
        player_id: PlayerId,
        from: &str,
        to: &str,
        num_armies: u32,
    ) -> GameResult<()> {
        if !self.map.are_connected_via_owner(player_id, from, to) {
            return Err(GameError::IllegalAction(format!(
                "'{from}' and '{to}' are not connected through player {player_id}'s countries"
            )));
        }
        if num_armies == 0 || num_armies >= self.map.armies(from)? {
            return Err(GameError::IllegalAction(
                "must move at least one army and leave one behind".to_string(),
            ));
        }
        self.map.remove_army(from, num_armies)?;
        self.map.add_army(to, num_armies)?;
        Ok(())
    }

    fn standing_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| !p.is_eliminated(&self.map))
            .map(|p| p.id)
            .collect()
    }

    /// Logs every player in `standing` who no longer holds a country.
    fn report_eliminations(&mut self, standing: &[PlayerId]) {
        let fallen: Vec<String> = self
            .players
            .iter()
            .filter(|p| standing.contains(&p.id) && p.is_eliminated(&self.map))
            .map(|p| {
                tracing::info!(player = p.id, name = %p.name, "player eliminated");
                format!("{} has been eliminated", p.name)
            })
            .collect();
        for message in &fallen {
            for player in &mut self.players {
                player.strategy.inform(message);
            }
        }
    }
}
