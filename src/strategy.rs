// strategy.rs
//! Player behaviors.
//!
//! Every behavior answers the same questions: where to place reinforcements,
//! whether and what to attack, how many dice to defend with, how many armies to
//! advance after a conquest and what to fortify. The map is handed in on every
//! call; a strategy never keeps a reference to the game.

use crate::board::{GameMap, MAX_ARMIES};
use crate::combat::{self, dice_ceiling, AttackPhaseState, DiceAction};
use crate::console::Decider;
use crate::error::{GameError, GameResult};
use crate::odds::OddsTable;
use crate::player::PlayerId;
use crate::territory::Country;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Human,
    Aggressive,
    Benevolent,
    Random,
    Cheater,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Human,
        StrategyKind::Aggressive,
        StrategyKind::Benevolent,
        StrategyKind::Random,
        StrategyKind::Cheater,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Human => "human",
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::Benevolent => "benevolent",
            StrategyKind::Random => "random",
            StrategyKind::Cheater => "cheater",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GameError::Config(format!("unknown strategy '{s}'")))
    }
}

/// Where the armies of a reinforcement go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReinforcementPlan {
    Place(Vec<(String, u32)>),
    /// Cheater only: double every owned country instead of placing armies.
    DoubleAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackDecision {
    Attack { from: String, to: String, dice: u32 },
    /// Cheater only: take every adjacent enemy country without a fight.
    CheatConquer,
    Decline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FortifyDecision {
    Move { from: String, to: String, armies: u32 },
    /// Cheater only: double every owned country that borders an enemy.
    DoubleFrontier,
    Skip,
}

/// Human player: every decision goes through a [`Decider`].
pub struct HumanStrategy {
    decider: Box<dyn Decider>,
    odds: OddsTable,
}

impl HumanStrategy {
    pub fn new(decider: Box<dyn Decider>) -> Self {
        Self {
            decider,
            odds: OddsTable::default(),
        }
    }

    /// Index into `options`. A reply outside the list counts as declining.
    fn choose(&mut self, prompt: &str, options: &[String]) -> Option<usize> {
        self.decider
            .choose(prompt, options)
            .filter(|index| *index < options.len())
    }

    /// A count in `min..=max`. A reply outside the range counts as declining.
    fn choose_count(&mut self, prompt: &str, min: u32, max: u32) -> Option<u32> {
        self.decider
            .choose_count(prompt, min, max)
            .filter(|count| (min..=max).contains(count))
    }
}

impl fmt::Debug for HumanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HumanStrategy").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum Strategy {
    Human(HumanStrategy),
    Aggressive,
    Benevolent,
    Random { attacks_left: u32 },
    Cheater { cheated_this_turn: bool },
}

/// For every owned country with more than one army, the adjacent countries
/// held by someone else. Countries with no such neighbour are left out.
pub fn potential_attack_scenarios(
    player_id: PlayerId,
    map: &GameMap,
) -> BTreeMap<String, Vec<String>> {
    map.countries()
        .filter(|country| country.is_owned_by(player_id) && country.armies() > 1)
        .filter_map(|country| {
            let targets: Vec<String> = country
                .adjacent_countries()
                .iter()
                .filter(|name| {
                    map.get_country(name)
                        .is_some_and(|target| !target.is_owned_by(player_id))
                })
                .cloned()
                .collect();
            (!targets.is_empty()).then(|| (country.name.clone(), targets))
        })
        .collect()
}

fn owned(player_id: PlayerId, map: &GameMap) -> Vec<&Country> {
    map.countries()
        .filter(|country| country.is_owned_by(player_id))
        .collect()
}

fn borders_enemy(player_id: PlayerId, map: &GameMap, country: &Country) -> bool {
    country.adjacent_countries().iter().any(|name| {
        map.get_country(name)
            .is_some_and(|neighbour| !neighbour.is_owned_by(player_id))
    })
}

// Countries iterate in name order, so the first maximum/minimum wins ties.
fn strongest<'a>(countries: impl IntoIterator<Item = &'a Country>) -> Option<&'a Country> {
    countries
        .into_iter()
        .fold(None, |best: Option<&Country>, c| match best {
            Some(b) if b.armies() >= c.armies() => Some(b),
            _ => Some(c),
        })
}

fn weakest<'a>(countries: impl IntoIterator<Item = &'a Country>) -> Option<&'a Country> {
    countries
        .into_iter()
        .fold(None, |best: Option<&Country>, c| match best {
            Some(b) if b.armies() <= c.armies() => Some(b),
            _ => Some(c),
        })
}

fn fortify_pairs(player_id: PlayerId, map: &GameMap) -> Vec<(String, String)> {
    owned(player_id, map)
        .into_iter()
        .filter(|country| country.armies() > 1)
        .flat_map(|country| {
            map.reachable_own_countries(player_id, &country.name)
                .into_iter()
                .map(move |to| (country.name.clone(), to))
        })
        .collect()
}

impl Strategy {
    pub fn from_kind(kind: StrategyKind) -> GameResult<Self> {
        match kind {
            StrategyKind::Human => Err(GameError::Config(
                "a human strategy needs an input source".to_string(),
            )),
            StrategyKind::Aggressive => Ok(Strategy::Aggressive),
            StrategyKind::Benevolent => Ok(Strategy::Benevolent),
            StrategyKind::Random => Ok(Strategy::Random { attacks_left: 0 }),
            StrategyKind::Cheater => Ok(Strategy::Cheater {
                cheated_this_turn: false,
            }),
        }
    }

    pub fn human(decider: Box<dyn Decider>) -> Self {
        Strategy::Human(HumanStrategy::new(decider))
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Human(_) => StrategyKind::Human,
            Strategy::Aggressive => StrategyKind::Aggressive,
            Strategy::Benevolent => StrategyKind::Benevolent,
            Strategy::Random { .. } => StrategyKind::Random,
            Strategy::Cheater { .. } => StrategyKind::Cheater,
        }
    }

    /// Resets per-turn bookkeeping. Called when the player's turn begins.
    pub fn start_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            Strategy::Random { attacks_left } => *attacks_left = rng.gen_range(0..=3),
            Strategy::Cheater { cheated_this_turn } => *cheated_this_turn = false,
            _ => {}
        }
    }

    /// Sends a message to a human player; automated players ignore it.
    pub fn inform(&mut self, message: &str) {
        if let Strategy::Human(human) = self {
            human.decider.inform(message);
        }
    }

    /// Replaces the conquest odds a human player is shown when picking attacks.
    pub fn set_odds_table(&mut self, odds: OddsTable) {
        if let Strategy::Human(human) = self {
            human.odds = odds;
        }
    }

    pub fn max_allowed_dice(
        &self,
        map: &GameMap,
        action: DiceAction,
        country: &str,
        requested: u32,
    ) -> GameResult<u32> {
        combat::max_allowed_dice(map, action, country, requested)
    }

    pub fn potential_attack_scenarios(
        &self,
        player_id: PlayerId,
        map: &GameMap,
    ) -> BTreeMap<String, Vec<String>> {
        potential_attack_scenarios(player_id, map)
    }

    pub fn decide_reinforcement<R: Rng + ?Sized>(
        &mut self,
        player_id: PlayerId,
        map: &GameMap,
        armies: u32,
        rng: &mut R,
    ) -> ReinforcementPlan {
        let countries = owned(player_id, map);
        if armies == 0 || countries.is_empty() {
            return ReinforcementPlan::Place(Vec::new());
        }

        match self {
            Strategy::Aggressive => {
                let frontier = countries
                    .iter()
                    .copied()
                    .filter(|c| borders_enemy(player_id, map, c));
                let target = strongest(frontier)
                    .or_else(|| strongest(countries.iter().copied()))
                    .map(|c| c.name.clone());
                ReinforcementPlan::Place(target.map(|t| vec![(t, armies)]).unwrap_or_default())
            }
            Strategy::Benevolent => {
                let mut levels: Vec<(String, u32)> = countries
                    .iter()
                    .map(|c| (c.name.clone(), c.armies()))
                    .collect();
                let mut placed: BTreeMap<String, u32> = BTreeMap::new();
                for _ in 0..armies {
                    let Some(slot) = levels.iter_mut().min_by_key(|(_, level)| *level) else {
                        break;
                    };
                    slot.1 += 1;
                    *placed.entry(slot.0.clone()).or_insert(0) += 1;
                }
                ReinforcementPlan::Place(placed.into_iter().collect())
            }
            Strategy::Random { .. } => {
                let mut placed: BTreeMap<String, u32> = BTreeMap::new();
                for _ in 0..armies {
                    if let Some(country) = countries.choose(rng) {
                        *placed.entry(country.name.clone()).or_insert(0) += 1;
                    }
                }
                ReinforcementPlan::Place(placed.into_iter().collect())
            }
            Strategy::Cheater { .. } => ReinforcementPlan::DoubleAll,
            Strategy::Human(human) => {
                let names: Vec<String> = countries.iter().map(|c| c.name.clone()).collect();
                let labels: Vec<String> = countries
                    .iter()
                    .map(|c| format!("{} ({} armies)", c.name, c.armies()))
                    .collect();
                let mut placed: BTreeMap<String, u32> = BTreeMap::new();
                let mut remaining = armies;
                while remaining > 0 {
                    let prompt = format!("Place reinforcements: {remaining} armies left");
                    let Some(index) = human.choose(&prompt, &labels) else {
                        break;
                    };
                    let count = human
                        .choose_count("How many armies?", 1, remaining)
                        .unwrap_or(remaining);
                    *placed.entry(names[index].clone()).or_insert(0) += count;
                    remaining -= count;
                }
                // Armies must be placed; whatever was declined lands on the first country.
                if remaining > 0 {
                    *placed.entry(names[0].clone()).or_insert(0) += remaining;
                }
                ReinforcementPlan::Place(placed.into_iter().collect())
            }
        }
    }

    pub fn decide_attack<R: Rng + ?Sized>(
        &mut self,
        player_id: PlayerId,
        map: &GameMap,
        rng: &mut R,
    ) -> AttackDecision {
        let scenarios = potential_attack_scenarios(player_id, map);
        if scenarios.is_empty() {
            return AttackDecision::Decline;
        }

        match self {
            Strategy::Benevolent => AttackDecision::Decline,
            Strategy::Aggressive => {
                let sources = scenarios.keys().filter_map(|name| map.get_country(name));
                let Some(from) = strongest(sources) else {
                    return AttackDecision::Decline;
                };
                let targets = scenarios[&from.name]
                    .iter()
                    .filter_map(|name| map.get_country(name));
                let Some(to) = weakest(targets) else {
                    return AttackDecision::Decline;
                };
                AttackDecision::Attack {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    dice: dice_ceiling(DiceAction::Attack, from.armies()),
                }
            }
            Strategy::Random { attacks_left } => {
                if *attacks_left == 0 {
                    return AttackDecision::Decline;
                }
                *attacks_left -= 1;
                let pairs: Vec<(&String, &String)> = scenarios
                    .iter()
                    .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
                    .collect();
                let Some(&(from, to)) = pairs.choose(rng) else {
                    return AttackDecision::Decline;
                };
                let ceiling = map
                    .armies(from)
                    .map_or(0, |armies| dice_ceiling(DiceAction::Attack, armies));
                if ceiling == 0 {
                    return AttackDecision::Decline;
                }
                AttackDecision::Attack {
                    from: from.clone(),
                    to: to.clone(),
                    dice: rng.gen_range(1..=ceiling),
                }
            }
            Strategy::Cheater { cheated_this_turn } => {
                if *cheated_this_turn {
                    AttackDecision::Decline
                } else {
                    *cheated_this_turn = true;
                    AttackDecision::CheatConquer
                }
            }
            Strategy::Human(human) => {
                let mut pairs = Vec::new();
                let mut labels = Vec::new();
                for (from, targets) in &scenarios {
                    let attackers = map.armies(from).unwrap_or(0);
                    for to in targets {
                        let defenders = map.armies(to).unwrap_or(0);
                        let odds = human
                            .odds
                            .percent(attackers, defenders)
                            .map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}%"));
                        labels.push(format!(
                            "{from} ({attackers}) -> {to} ({defenders}), {odds} to conquer"
                        ));
                        pairs.push((from.clone(), to.clone()));
                    }
                }
                let Some(index) = human.choose("Choose an attack or pass", &labels) else {
                    return AttackDecision::Decline;
                };
                let (from, to) = pairs.swap_remove(index);
                let ceiling = map
                    .armies(&from)
                    .map_or(0, |armies| dice_ceiling(DiceAction::Attack, armies));
                match human.choose_count("How many dice?", 1, ceiling) {
                    Some(dice) => AttackDecision::Attack { from, to, dice },
                    None => AttackDecision::Decline,
                }
            }
        }
    }

    /// Dice rolled when `country` is attacked.
    pub fn decide_defense_dice<R: Rng + ?Sized>(
        &mut self,
        map: &GameMap,
        country: &str,
        rng: &mut R,
    ) -> u32 {
        let ceiling = map
            .armies(country)
            .map_or(0, |armies| dice_ceiling(DiceAction::Defend, armies));
        if ceiling <= 1 {
            return ceiling;
        }
        match self {
            Strategy::Random { .. } => rng.gen_range(1..=ceiling),
            Strategy::Human(human) => {
                let prompt = format!("{country} is under attack. How many dice to defend with?");
                human.choose_count(&prompt, 1, ceiling).unwrap_or(ceiling)
            }
            _ => ceiling,
        }
    }

    /// Armies advanced from `from` into the freshly conquered `to`, on top of
    /// the ones that moved in with the attack. Never leaves `from` empty.
    pub fn decide_conquest_move<R: Rng + ?Sized>(
        &mut self,
        map: &GameMap,
        from: &str,
        to: &str,
        rng: &mut R,
    ) -> u32 {
        let available = map.armies(from).unwrap_or(0).saturating_sub(1);
        if available == 0 {
            return 0;
        }
        match self {
            Strategy::Aggressive => available,
            Strategy::Random { .. } => rng.gen_range(0..=available),
            Strategy::Human(human) => {
                let prompt = format!("{to} conquered. Move extra armies from {from}?");
                human.choose_count(&prompt, 0, available).unwrap_or(0)
            }
            Strategy::Benevolent | Strategy::Cheater { .. } => 0,
        }
    }

    pub fn decide_fortify<R: Rng + ?Sized>(
        &mut self,
        player_id: PlayerId,
        map: &GameMap,
        rng: &mut R,
    ) -> FortifyDecision {
        match self {
            Strategy::Cheater { .. } => FortifyDecision::DoubleFrontier,
            Strategy::Aggressive => {
                let Some(target) = strongest(owned(player_id, map)) else {
                    return FortifyDecision::Skip;
                };
                let sources = map
                    .reachable_own_countries(player_id, &target.name)
                    .into_iter()
                    .filter_map(|name| map.get_country(&name))
                    .filter(|c| c.armies() > 1)
                    .collect::<Vec<_>>();
                match strongest(sources) {
                    Some(source) => FortifyDecision::Move {
                        from: source.name.clone(),
                        to: target.name.clone(),
                        armies: source.armies() - 1,
                    },
                    None => FortifyDecision::Skip,
                }
            }
            Strategy::Benevolent => {
                let Some(target) = weakest(owned(player_id, map)) else {
                    return FortifyDecision::Skip;
                };
                let sources = map
                    .reachable_own_countries(player_id, &target.name)
                    .into_iter()
                    .filter_map(|name| map.get_country(&name))
                    .collect::<Vec<_>>();
                match strongest(sources) {
                    Some(source) if source.armies() > target.armies() + 1 => {
                        FortifyDecision::Move {
                            from: source.name.clone(),
                            to: target.name.clone(),
                            armies: (source.armies() - target.armies()) / 2,
                        }
                    }
                    _ => FortifyDecision::Skip,
                }
            }
            Strategy::Random { .. } => {
                let pairs = fortify_pairs(player_id, map);
                if pairs.is_empty() || rng.gen_bool(0.5) {
                    return FortifyDecision::Skip;
                }
                let Some((from, to)) = pairs.choose(rng).cloned() else {
                    return FortifyDecision::Skip;
                };
                let available = map.armies(&from).unwrap_or(1).saturating_sub(1).max(1);
                FortifyDecision::Move {
                    from,
                    to,
                    armies: rng.gen_range(1..=available),
                }
            }
            Strategy::Human(human) => {
                let pairs = fortify_pairs(player_id, map);
                let labels: Vec<String> = pairs
                    .iter()
                    .map(|(from, to)| {
                        format!(
                            "{from} ({}) -> {to} ({})",
                            map.armies(from).unwrap_or(0),
                            map.armies(to).unwrap_or(0)
                        )
                    })
                    .collect();
                let Some(index) = human.choose("Fortify or pass", &labels) else {
                    return FortifyDecision::Skip;
                };
                let (from, to) = pairs[index].clone();
                let available = map.armies(&from).unwrap_or(1).saturating_sub(1);
                match human.choose_count("How many armies?", 1, available) {
                    Some(armies) => FortifyDecision::Move { from, to, armies },
                    None => FortifyDecision::Skip,
                }
            }
        }
    }

    /// Resolves a declared attack and, on conquest, advances the extra armies
    /// this strategy wants forward.
    pub fn fight<R: Rng + ?Sized>(
        &mut self,
        map: &mut GameMap,
        state: &mut AttackPhaseState,
        rng: &mut R,
    ) -> GameResult<bool> {
        if let Strategy::Benevolent = self {
            return Err(GameError::IllegalAction(
                "a benevolent player never attacks".to_string(),
            ));
        }

        let attacker_won = combat::fight(map, state, rng)?;
        if attacker_won {
            let from = state.attacking_country.as_str();
            let to = state.defending_country.as_str();
            let extra = self.decide_conquest_move(map, from, to, rng);
            if extra > 0 {
                map.remove_army(from, extra)?;
                map.add_army(to, extra)?;
                if let Some(outcome) = state.outcome.as_mut() {
                    outcome.armies_moved += extra;
                }
            }
        }
        Ok(attacker_won)
    }
}

/// Cheater rule: every enemy country adjacent to one of `player_id`'s
/// countries changes hands on the spot, keeping its armies.
pub fn cheat_conquer(player_id: PlayerId, map: &mut GameMap) -> GameResult<Vec<String>> {
    let mut taken: Vec<String> = owned(player_id, map)
        .into_iter()
        .flat_map(|country| country.adjacent_countries().iter())
        .filter(|name| {
            map.get_country(name)
                .is_some_and(|c| !c.is_owned_by(player_id))
        })
        .cloned()
        .collect();
    taken.sort();
    taken.dedup();

    for name in &taken {
        map.set_conqueror(name, player_id)?;
        if map.armies(name)? == 0 {
            map.add_army(name, 1)?;
        }
    }
    Ok(taken)
}

/// Cheater rule: doubles the armies of the given countries, stopping at
/// [`MAX_ARMIES`] per country.
pub fn double_armies(map: &mut GameMap, countries: &[String]) -> GameResult<()> {
    for name in countries {
        let armies = map.armies(name)?;
        let extra = armies.min(MAX_ARMIES.saturating_sub(armies));
        if extra > 0 {
            map.add_army(name, extra)?;
        }
    }
    Ok(())
}

/// Owned countries of `player_id` that touch an enemy.
pub fn frontier_countries(player_id: PlayerId, map: &GameMap) -> Vec<String> {
    owned(player_id, map)
        .into_iter()
        .filter(|country| borders_enemy(player_id, map, country))
        .map(|country| country.name.clone())
        .collect()
}
