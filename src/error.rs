// error.rs
use thiserror::Error;

use crate::validator::ValidationError;

/// Contract violations raised by the map model, the combat resolver and the
/// phase machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("'{0}' already exists")]
    DuplicateEntity(String),

    #[error("unknown continent '{0}'")]
    UnknownContinent(String),

    #[error("unknown country '{0}'")]
    UnknownCountry(String),

    #[error("country '{0}' cannot be adjacent to itself")]
    SelfAdjacency(String),

    #[error("country '{country}' has {current} armies, cannot remove {requested}")]
    NegativeArmyCount {
        country: String,
        current: u32,
        requested: u32,
    },

    #[error("country '{country}' cannot hold {current} + {added} armies")]
    ArmyOverflow {
        country: String,
        current: u32,
        added: u32,
    },

    #[error("continent '{0}' needs a positive control value")]
    InvalidControlValue(String),

    #[error("illegal action: {0}")]
    IllegalAction(String),

    #[error("map is not playable: {0}")]
    InvalidMap(#[from] ValidationError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type GameResult<T> = Result<T, GameError>;
