// game_config.rs
use crate::console::Decider;
use crate::error::{GameError, GameResult};
use crate::game::{MAX_PLAYERS, MIN_PLAYERS};
use crate::player::Player;
use crate::strategy::{Strategy, StrategyKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Table setup read from JSON:
///
/// ```json
/// { "players": [{ "name": "Ada", "strategy": "aggressive" }], "seed": 7, "turn_limit": 200 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub turn_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerConfig {
    pub name: String,
    pub strategy: StrategyKind,
}

const DEFAULT_MIX: [StrategyKind; 3] = [
    StrategyKind::Aggressive,
    StrategyKind::Random,
    StrategyKind::Benevolent,
];

impl GameConfig {
    /// `num_players` automated players cycling through aggressive, random and
    /// benevolent.
    pub fn default_for(num_players: usize) -> Self {
        let players = (1..=num_players)
            .zip(DEFAULT_MIX.iter().cycle())
            .map(|(i, strategy)| PlayerConfig {
                name: format!("Player {i}"),
                strategy: *strategy,
            })
            .collect();
        Self {
            players,
            seed: None,
            turn_limit: None,
        }
    }

    pub fn load_from_file(filename: impl AsRef<Path>) -> GameResult<Self> {
        let filename = filename.as_ref();
        let data = std::fs::read_to_string(filename)
            .map_err(|e| GameError::Config(format!("{}: {e}", filename.display())))?;
        let config: GameConfig = serde_json::from_str(&data)
            .map_err(|e| GameError::Config(format!("{}: {e}", filename.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GameResult<()> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players.len()) {
            return Err(GameError::Config(format!(
                "a game needs {MIN_PLAYERS} to {MAX_PLAYERS} players, got {}",
                self.players.len()
            )));
        }
        let mut names = HashSet::new();
        for player in &self.players {
            if player.name.trim().is_empty() {
                return Err(GameError::Config("player names cannot be blank".to_string()));
            }
            if !names.insert(player.name.as_str()) {
                return Err(GameError::Config(format!(
                    "player name '{}' is used twice",
                    player.name
                )));
            }
        }
        if self.turn_limit == Some(0) {
            return Err(GameError::Config("turn limit must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), and also refuses human seats, since
    /// nobody is there to answer them.
    pub fn validate_automated(&self) -> GameResult<()> {
        self.validate()?;
        if self.has_human() {
            return Err(GameError::Config(
                "simulations cannot include human players".to_string(),
            ));
        }
        Ok(())
    }

    pub fn has_human(&self) -> bool {
        self.players.iter().any(|p| p.strategy == StrategyKind::Human)
    }

    /// Seats the players with ids 1..=N in configuration order.
    pub fn generate_players<F>(&self, mut human_decider: F) -> GameResult<Vec<Player>>
    where
        F: FnMut(&PlayerConfig) -> Box<dyn Decider>,
    {
        self.players
            .iter()
            .enumerate()
            .map(|(i, config)| -> GameResult<Player> {
                let strategy = match config.strategy {
                    StrategyKind::Human => Strategy::human(human_decider(config)),
                    kind => Strategy::from_kind(kind)?,
                };
                Ok(Player::new(i + 1, &config.name, strategy))
            })
            .collect()
    }
}
