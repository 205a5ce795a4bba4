// combat.rs
//! Dice combat between two adjacent countries.
//!
//! A call resolves exactly one exchange. All dice pairs are compared first,
//! then both army counts are written, then ownership changes. Preconditions are
//! checked before anything is written so a rejected attack leaves the map as
//! it was.

use crate::board::GameMap;
use crate::error::{GameError, GameResult};
use crate::player::PlayerId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_ATTACK_DICE: u32 = 3;
pub const MAX_DEFEND_DICE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiceAction {
    Attack,
    Defend,
}

impl FromStr for DiceAction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attack" => Ok(DiceAction::Attack),
            "defend" => Ok(DiceAction::Defend),
            other => Err(GameError::IllegalAction(format!(
                "unknown dice action '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceAction::Attack => write!(f, "attack"),
            DiceAction::Defend => write!(f, "defend"),
        }
    }
}

/// Highest dice count a side may roll from a country holding `armies`.
pub fn dice_ceiling(action: DiceAction, armies: u32) -> u32 {
    match action {
        DiceAction::Attack => armies.saturating_sub(1).min(MAX_ATTACK_DICE),
        DiceAction::Defend => armies.min(MAX_DEFEND_DICE),
    }
}

/// Clamps `requested` to what `country` can legally roll right now.
pub fn max_allowed_dice(
    map: &GameMap,
    action: DiceAction,
    country: &str,
    requested: u32,
) -> GameResult<u32> {
    let armies = map.armies(country)?;
    Ok(requested.min(dice_ceiling(action, armies)))
}

/// `count` fair six-sided rolls, highest first.
pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<u32> {
    let mut rolls: Vec<u32> = (0..count).map(|_| rng.gen_range(1..=6)).collect();
    rolls.sort_unstable_by(|a, b| b.cmp(a));
    rolls
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub attacker_losses: u32,
    pub defender_losses: u32,
    pub conquered: bool,
    pub armies_moved: u32,
}

/// One declared attack, from declaration to resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPhaseState {
    pub attacking_player: String,
    pub defending_player: String,
    pub attacker_id: PlayerId,
    pub defender_id: PlayerId,
    pub attacking_country: String,
    pub defending_country: String,
    pub attacker_dice_count: u32,
    pub defender_dice_count: u32,
    pub attacker_rolls: Vec<u32>,
    pub defender_rolls: Vec<u32>,
    pub outcome: Option<CombatOutcome>,
}

impl AttackPhaseState {
    pub fn new(
        attacker_id: PlayerId,
        attacking_country: &str,
        defender_id: PlayerId,
        defending_country: &str,
    ) -> Self {
        Self {
            attacker_id,
            defender_id,
            attacking_country: attacking_country.to_string(),
            defending_country: defending_country.to_string(),
            ..Self::default()
        }
    }

    pub fn with_player_names(mut self, attacking: &str, defending: &str) -> Self {
        self.attacking_player = attacking.to_string();
        self.defending_player = defending.to_string();
        self
    }

    pub fn with_dice(mut self, attacker_dice: u32, defender_dice: u32) -> Self {
        self.attacker_dice_count = attacker_dice;
        self.defender_dice_count = defender_dice;
        self
    }

    /// Presets the rolls instead of letting [`fight`] throw the dice.
    pub fn with_rolls(mut self, mut attacker_rolls: Vec<u32>, mut defender_rolls: Vec<u32>) -> Self {
        attacker_rolls.sort_unstable_by(|a, b| b.cmp(a));
        defender_rolls.sort_unstable_by(|a, b| b.cmp(a));
        self.attacker_rolls = attacker_rolls;
        self.defender_rolls = defender_rolls;
        self
    }

    pub fn has_rolls(&self) -> bool {
        !self.attacker_rolls.is_empty() || !self.defender_rolls.is_empty()
    }
}

/// Rolls the dice if the state carries none yet, then resolves the exchange.
/// Returns whether the attacker took the country.
pub fn fight<R: Rng + ?Sized>(
    map: &mut GameMap,
    state: &mut AttackPhaseState,
    rng: &mut R,
) -> GameResult<bool> {
    check_declaration(map, state)?;
    if !state.has_rolls() {
        state.attacker_rolls = roll_dice(rng, state.attacker_dice_count);
        state.defender_rolls = roll_dice(rng, state.defender_dice_count);
    }
    resolve(map, state)
}

/// Resolves an exchange whose rolls are already on the state.
pub fn resolve(map: &mut GameMap, state: &mut AttackPhaseState) -> GameResult<bool> {
    check_declaration(map, state)?;
    check_rolls(state)?;
    state.attacker_rolls.sort_unstable_by(|a, b| b.cmp(a));
    state.defender_rolls.sort_unstable_by(|a, b| b.cmp(a));

    let mut attacker_losses = 0;
    let mut defender_losses = 0;
    for (attack, defend) in state.attacker_rolls.iter().zip(state.defender_rolls.iter()) {
        if attack > defend {
            defender_losses += 1;
        } else {
            attacker_losses += 1;
        }
    }

    let attacker_armies = map.armies(&state.attacking_country)? - attacker_losses;
    let defender_armies = map.armies(&state.defending_country)? - defender_losses;

    let conquered = defender_armies == 0;
    let armies_moved = if conquered {
        state
            .attacker_dice_count
            .min(attacker_armies.saturating_sub(1))
            .max(1)
    } else {
        0
    };

    tracing::debug!(
        from = %state.attacking_country,
        to = %state.defending_country,
        attacker = ?state.attacker_rolls,
        defender = ?state.defender_rolls,
        attacker_losses,
        defender_losses,
        "dice compared"
    );

    map.set_army(&state.attacking_country, attacker_armies - armies_moved)?;
    map.set_army(&state.defending_country, defender_armies + armies_moved)?;
    if conquered {
        map.set_conqueror(&state.defending_country, state.attacker_id)?;
        tracing::info!(
            country = %state.defending_country,
            player = state.attacker_id,
            armies_moved,
            "country conquered"
        );
    }

    state.outcome = Some(CombatOutcome {
        attacker_losses,
        defender_losses,
        conquered,
        armies_moved,
    });
    Ok(conquered)
}

fn check_declaration(map: &GameMap, state: &AttackPhaseState) -> GameResult<()> {
    let from = map
        .get_country(&state.attacking_country)
        .ok_or_else(|| GameError::UnknownCountry(state.attacking_country.clone()))?;
    let to = map
        .get_country(&state.defending_country)
        .ok_or_else(|| GameError::UnknownCountry(state.defending_country.clone()))?;

    if !from.is_adjacent(&to.name) {
        return Err(GameError::IllegalAction(format!(
            "'{}' is not adjacent to '{}'",
            from.name, to.name
        )));
    }
    if !from.is_owned_by(state.attacker_id) {
        return Err(GameError::IllegalAction(format!(
            "'{}' is not held by player {}",
            from.name, state.attacker_id
        )));
    }
    if !to.is_owned_by(state.defender_id) || state.defender_id == state.attacker_id {
        return Err(GameError::IllegalAction(format!(
            "'{}' is not an enemy country held by player {}",
            to.name, state.defender_id
        )));
    }

    let attack_ceiling = dice_ceiling(DiceAction::Attack, from.armies());
    if !(1..=attack_ceiling).contains(&state.attacker_dice_count) {
        return Err(GameError::IllegalAction(format!(
            "attacker may roll 1 to {} dice from '{}', not {}",
            attack_ceiling, from.name, state.attacker_dice_count
        )));
    }
    let defend_ceiling = dice_ceiling(DiceAction::Defend, to.armies());
    if !(1..=defend_ceiling).contains(&state.defender_dice_count) {
        return Err(GameError::IllegalAction(format!(
            "defender may roll 1 to {} dice in '{}', not {}",
            defend_ceiling, to.name, state.defender_dice_count
        )));
    }
    Ok(())
}

fn check_rolls(state: &AttackPhaseState) -> GameResult<()> {
    let counts_match = state.attacker_rolls.len() == state.attacker_dice_count as usize
        && state.defender_rolls.len() == state.defender_dice_count as usize;
    if !counts_match {
        return Err(GameError::IllegalAction(
            "number of rolls does not match the declared dice".to_string(),
        ));
    }
    let faces_ok = state
        .attacker_rolls
        .iter()
        .chain(state.defender_rolls.iter())
        .all(|roll| (1..=6).contains(roll));
    if !faces_ok {
        return Err(GameError::IllegalAction(
            "dice values must be between 1 and 6".to_string(),
        ));
    }
    Ok(())
}
