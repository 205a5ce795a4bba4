// lib.rs
pub mod board;
pub mod combat;
pub mod console;
pub mod continent;
pub mod error;
pub mod game;
pub mod game_config;
pub mod map_file;
pub mod odds;
pub mod player;
pub mod startup;
pub mod strategy;
pub mod territory;
pub mod turn_phase;
pub mod validator;

pub use board::GameMap;
pub use error::{GameError, GameResult};
pub use game::{Game, GameOutcome, GameState};
pub use game_config::GameConfig;
