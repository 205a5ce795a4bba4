// territory.rs
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single ownable country on the map.
///
/// Adjacency is only mutated through [`GameMap::set_adjacent`](crate::board::GameMap::set_adjacent),
/// which keeps both endpoints in sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Country {
    pub name: String,
    pub continent: String,
    pub(crate) conqueror: Option<PlayerId>,
    pub(crate) armies: u32,
    pub(crate) adjacent_countries: BTreeSet<String>,
}

impl Country {
    pub fn new(name: &str, continent: &str) -> Self {
        Self {
            name: name.to_string(),
            continent: continent.to_string(),
            conqueror: None,
            armies: 0,
            adjacent_countries: BTreeSet::new(),
        }
    }

    pub fn is_adjacent(&self, country: &str) -> bool {
        self.adjacent_countries.contains(country)
    }

    pub fn get_continent(&self) -> &str {
        &self.continent
    }

    pub fn conqueror(&self) -> Option<PlayerId> {
        self.conqueror
    }

    pub fn is_owned_by(&self, player_id: PlayerId) -> bool {
        self.conqueror == Some(player_id)
    }

    pub fn armies(&self) -> u32 {
        self.armies
    }

    pub fn adjacent_countries(&self) -> &BTreeSet<String> {
        &self.adjacent_countries
    }
}
