// continent.rs
use serde::{Deserialize, Serialize};

/// A named group of countries. Membership is derived from each country's
/// continent field, so the continent only carries its bonus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Continent {
    pub name: String,
    pub control_value: u32,
}

impl Continent {
    pub fn new(name: &str, control_value: u32) -> Self {
        Self {
            name: name.to_string(),
            control_value,
        }
    }

    pub fn get_bonus(&self) -> u32 {
        self.control_value
    }
}
