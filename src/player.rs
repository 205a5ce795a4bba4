// player.rs
use crate::board::GameMap;
use crate::strategy::{Strategy, StrategyKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type PlayerId = usize;

/// A seat at the table. The countries a player holds are not stored here; they
/// are whatever the map says this id has conquered.
#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub turn_order: Option<u32>,
    pub strategy: Strategy,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, strategy: Strategy) -> Self {
        Self {
            id,
            name: name.to_string(),
            turn_order: None,
            strategy,
        }
    }

    pub fn countries(&self, map: &GameMap) -> BTreeSet<String> {
        map.conquered_countries(self.id)
    }

    pub fn is_eliminated(&self, map: &GameMap) -> bool {
        !map.countries().any(|country| country.is_owned_by(self.id))
    }

    pub fn summary(&self, map: &GameMap) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            turn_order: self.turn_order,
            strategy: self.strategy.kind(),
            countries: self.countries(map).len(),
            total_armies: map.total_armies(self.id),
            army_supply: map.calculate_reinforcements(self.id),
        }
    }
}

/// Serializable view of a player for game state reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub turn_order: Option<u32>,
    pub strategy: StrategyKind,
    pub countries: usize,
    pub total_armies: u64,
    pub army_supply: u32,
}
