// odds.rs
//! Probability that an attacker who keeps attacking eventually takes a country.
//!
//! Each exchange is enumerated exactly over every dice combination, and the
//! table is filled bottom-up so `P(a, d)` only reads entries with fewer armies.

use crate::combat::{dice_ceiling, DiceAction};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OddsError {
    #[error("odds table i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("odds table could not be encoded: {0}")]
    Encoding(#[from] bincode::Error),
}

/// `(attacker losses, defender losses)` of one exchange with its probability.
pub type ExchangeOutcome = ((u32, u32), f64);

/// Exact loss distribution for one exchange with the given dice.
pub fn exchange_outcomes(attacker_dice: u32, defender_dice: u32) -> Vec<ExchangeOutcome> {
    let total_dice = (attacker_dice + defender_dice) as usize;
    let mut counts: BTreeMap<(u32, u32), u32> = BTreeMap::new();
    let mut combinations = 0u32;

    for rolls in (0..total_dice).map(|_| 1..=6u32).multi_cartesian_product() {
        let (attacker, defender) = rolls.split_at(attacker_dice as usize);
        let attacker = attacker.iter().sorted_by(|a, b| b.cmp(a));
        let defender = defender.iter().sorted_by(|a, b| b.cmp(a));

        let mut losses = (0, 0);
        for (attack, defend) in attacker.zip(defender) {
            if attack > defend {
                losses.1 += 1;
            } else {
                losses.0 += 1;
            }
        }
        *counts.entry(losses).or_insert(0) += 1;
        combinations += 1;
    }

    counts
        .into_iter()
        .map(|(losses, count)| (losses, f64::from(count) / f64::from(combinations)))
        .collect()
}

/// Largest army count on either side the table will grow to on demand.
pub const MAX_TABLE_ARMIES: u32 = 200;

/// Conquest probabilities indexed by `[attacker armies][defender armies]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OddsTable {
    max_attackers: u32,
    max_defenders: u32,
    table: Vec<Vec<f64>>,
}

impl Default for OddsTable {
    fn default() -> Self {
        Self::compute(30, 30)
    }
}

impl OddsTable {
    pub fn compute(max_attackers: u32, max_defenders: u32) -> Self {
        let mut outcomes: BTreeMap<(u32, u32), Vec<ExchangeOutcome>> = BTreeMap::new();
        for attacker_dice in 1..=3 {
            for defender_dice in 1..=2 {
                outcomes.insert(
                    (attacker_dice, defender_dice),
                    exchange_outcomes(attacker_dice, defender_dice),
                );
            }
        }

        let mut table = vec![vec![0.0; max_defenders as usize + 1]; max_attackers as usize + 1];
        for a in 0..=max_attackers {
            for d in 0..=max_defenders {
                let p = if d == 0 {
                    1.0
                } else if a <= 1 {
                    0.0
                } else {
                    let dice = (
                        dice_ceiling(DiceAction::Attack, a),
                        dice_ceiling(DiceAction::Defend, d),
                    );
                    outcomes[&dice]
                        .iter()
                        .map(|&((attacker_losses, defender_losses), prob)| {
                            prob * table[(a - attacker_losses) as usize]
                                [(d - defender_losses) as usize]
                        })
                        .sum()
                };
                table[a as usize][d as usize] = p;
            }
        }

        Self {
            max_attackers,
            max_defenders,
            table,
        }
    }

    /// Looks up `P(conquest)`; `None` when outside the computed range.
    pub fn get(&self, attacker_armies: u32, defender_armies: u32) -> Option<f64> {
        self.table
            .get(attacker_armies as usize)?
            .get(defender_armies as usize)
            .copied()
    }

    /// Like [`get`](Self::get) but extends the table when needed, up to
    /// [`MAX_TABLE_ARMIES`] per side. Larger armies stay `None`.
    pub fn conquest_probability(
        &mut self,
        attacker_armies: u32,
        defender_armies: u32,
    ) -> Option<f64> {
        if let Some(p) = self.get(attacker_armies, defender_armies) {
            return Some(p);
        }
        if attacker_armies > MAX_TABLE_ARMIES || defender_armies > MAX_TABLE_ARMIES {
            return None;
        }
        *self = Self::compute(
            attacker_armies.max(self.max_attackers),
            defender_armies.max(self.max_defenders),
        );
        self.get(attacker_armies, defender_armies)
    }

    /// Probability as a percentage rounded to two decimals, for display.
    pub fn percent(&mut self, attacker_armies: u32, defender_armies: u32) -> Option<f64> {
        self.conquest_probability(attacker_armies, defender_armies)
            .map(|p| (p * 10000.0).round() / 100.0)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OddsError> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, OddsError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_die_duel_matches_hand_count() {
        // 15 of 36 pairs have the attacker strictly higher.
        let outcomes = exchange_outcomes(1, 1);
        let attacker_wins = outcomes
            .iter()
            .find(|(losses, _)| *losses == (0, 1))
            .map(|(_, p)| *p)
            .unwrap();
        assert!(close(attacker_wins, 15.0 / 36.0));
    }

    #[test]
    fn three_against_two_matches_known_values() {
        let outcomes = exchange_outcomes(3, 2);
        let lookup = |losses| {
            outcomes
                .iter()
                .find(|(l, _)| *l == losses)
                .map(|(_, p)| *p)
                .unwrap()
        };
        assert!(close(lookup((0, 2)), 2890.0 / 7776.0));
        assert!(close(lookup((2, 0)), 2275.0 / 7776.0));
        assert!(close(lookup((1, 1)), 2611.0 / 7776.0));
    }

    #[test]
    fn exchange_probabilities_sum_to_one() {
        for a in 1..=3 {
            for d in 1..=2 {
                let total: f64 = exchange_outcomes(a, d).iter().map(|(_, p)| p).sum();
                assert!(close(total, 1.0));
            }
        }
    }

    #[test]
    fn boundary_odds() {
        let table = OddsTable::compute(10, 10);
        assert_eq!(table.get(1, 5), Some(0.0));
        assert_eq!(table.get(5, 0), Some(1.0));
        assert!(close(table.get(2, 1).unwrap(), 15.0 / 36.0));
        assert_eq!(table.get(11, 1), None);
    }

    #[test]
    fn more_attackers_never_hurt() {
        let table = OddsTable::compute(20, 10);
        for d in 1..=10 {
            for a in 2..20 {
                assert!(table.get(a + 1, d).unwrap() + 1e-12 >= table.get(a, d).unwrap());
            }
        }
    }

    #[test]
    fn table_grows_on_demand() {
        let mut table = OddsTable::compute(5, 5);
        let p = table.conquest_probability(12, 3).unwrap();
        assert!(p > 0.5 && p < 1.0);
        assert!(table.get(12, 3).is_some());
        assert!(table.get(5, 5).is_some());
    }

    #[test]
    fn oversized_armies_have_no_odds() {
        let mut table = OddsTable::compute(5, 5);
        assert_eq!(table.conquest_probability(1_000_000, 3), None);
        assert_eq!(table.percent(4, MAX_TABLE_ARMIES + 1), None);
        assert_eq!(table, OddsTable::compute(5, 5));

        assert_eq!(table.percent(5, 0), Some(100.0));
        assert!(table.conquest_probability(MAX_TABLE_ARMIES, 2).is_some());
    }

    #[test]
    fn table_survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odds.bin");
        let table = OddsTable::compute(8, 6);
        table.save(&path).unwrap();
        assert_eq!(OddsTable::load(&path).unwrap(), table);
    }
}
