// board.rs
use crate::continent::Continent;
use crate::error::{GameError, GameResult};
use crate::player::PlayerId;
use crate::territory::Country;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Most armies a single country may hold through doubling.
pub const MAX_ARMIES: u32 = 1_000_000;

/// Free-form header of a map file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapMetadata {
    pub author: Option<String>,
    pub warn: Option<String>,
}

/// The territory graph: continents, countries, adjacency, ownership and armies.
///
/// Countries and continents are keyed by name and iterate in name order, which
/// keeps seeded games reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameMap {
    pub metadata: MapMetadata,
    countries: BTreeMap<String, Country>,
    continents: BTreeMap<String, Continent>,
}

impl GameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_continent(&mut self, name: &str, control_value: u32) -> GameResult<()> {
        if self.continents.contains_key(name) {
            return Err(GameError::DuplicateEntity(name.to_string()));
        }
        if control_value == 0 {
            return Err(GameError::InvalidControlValue(name.to_string()));
        }
        self.continents
            .insert(name.to_string(), Continent::new(name, control_value));
        Ok(())
    }

    pub fn add_country(&mut self, name: &str, continent: &str) -> GameResult<()> {
        if !self.continents.contains_key(continent) {
            return Err(GameError::UnknownContinent(continent.to_string()));
        }
        if self.countries.contains_key(name) {
            return Err(GameError::DuplicateEntity(name.to_string()));
        }
        self.countries
            .insert(name.to_string(), Country::new(name, continent));
        Ok(())
    }

    /// Inserts the edge `a - b` in both directions.
    pub fn set_adjacent(&mut self, a: &str, b: &str) -> GameResult<()> {
        if !self.countries.contains_key(a) {
            return Err(GameError::UnknownCountry(a.to_string()));
        }
        if !self.countries.contains_key(b) {
            return Err(GameError::UnknownCountry(b.to_string()));
        }
        if a == b {
            return Err(GameError::SelfAdjacency(a.to_string()));
        }
        self.country_mut(a)?
            .adjacent_countries
            .insert(b.to_string());
        self.country_mut(b)?
            .adjacent_countries
            .insert(a.to_string());
        Ok(())
    }

    /// Overwrites the owner of a country without looking at who held it before.
    pub fn set_conqueror(&mut self, country: &str, player_id: PlayerId) -> GameResult<()> {
        self.country_mut(country)?.conqueror = Some(player_id);
        Ok(())
    }

    pub fn add_army(&mut self, country: &str, num_armies: u32) -> GameResult<u32> {
        let country = self.country_mut(country)?;
        country.armies = country
            .armies
            .checked_add(num_armies)
            .ok_or_else(|| GameError::ArmyOverflow {
                country: country.name.clone(),
                current: country.armies,
                added: num_armies,
            })?;
        Ok(country.armies)
    }

    pub fn remove_army(&mut self, country: &str, num_armies: u32) -> GameResult<u32> {
        let country = self.country_mut(country)?;
        if num_armies > country.armies {
            return Err(GameError::NegativeArmyCount {
                country: country.name.clone(),
                current: country.armies,
                requested: num_armies,
            });
        }
        country.armies -= num_armies;
        Ok(country.armies)
    }

    pub fn set_army(&mut self, country: &str, num_armies: u32) -> GameResult<()> {
        self.country_mut(country)?.armies = num_armies;
        Ok(())
    }

    pub fn get_country(&self, name: &str) -> Option<&Country> {
        self.countries.get(name)
    }

    pub fn get_continent(&self, name: &str) -> Option<&Continent> {
        self.continents.get(name)
    }

    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.countries.values()
    }

    pub fn continents(&self) -> impl Iterator<Item = &Continent> {
        self.continents.values()
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn countries_in_continent<'a>(
        &'a self,
        continent: &'a str,
    ) -> impl Iterator<Item = &'a Country> + 'a {
        self.countries
            .values()
            .filter(move |country| country.continent == continent)
    }

    pub fn conquered_countries(&self, player_id: PlayerId) -> BTreeSet<String> {
        self.countries
            .values()
            .filter(|country| country.is_owned_by(player_id))
            .map(|country| country.name.clone())
            .collect()
    }

    pub fn adjacent_countries(&self, name: &str) -> GameResult<&BTreeSet<String>> {
        self.get_country(name)
            .map(|country| &country.adjacent_countries)
            .ok_or_else(|| GameError::UnknownCountry(name.to_string()))
    }

    pub fn armies(&self, name: &str) -> GameResult<u32> {
        self.get_country(name)
            .map(Country::armies)
            .ok_or_else(|| GameError::UnknownCountry(name.to_string()))
    }

    pub fn owner(&self, name: &str) -> GameResult<Option<PlayerId>> {
        self.get_country(name)
            .map(Country::conqueror)
            .ok_or_else(|| GameError::UnknownCountry(name.to_string()))
    }

    pub fn total_armies(&self, player_id: PlayerId) -> u64 {
        self.countries
            .values()
            .filter(|country| country.is_owned_by(player_id))
            .map(|country| u64::from(country.armies))
            .sum()
    }

    /// The single player holding every country, if there is one.
    pub fn owner_of_all(&self) -> Option<PlayerId> {
        let mut owners = self.countries.values().map(Country::conqueror);
        let first = owners.next()??;
        owners.all(|owner| owner == Some(first)).then_some(first)
    }

    /// Own countries reachable from `from` by walking only through countries
    /// owned by `player_id`. `from` itself is excluded.
    pub fn reachable_own_countries(&self, player_id: PlayerId, from: &str) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        let Some(start) = self.get_country(from) else {
            return visited;
        };
        if !start.is_owned_by(player_id) {
            return visited;
        }

        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            if let Some(country) = self.get_country(current) {
                for adjacent in &country.adjacent_countries {
                    let owned = self
                        .get_country(adjacent)
                        .is_some_and(|c| c.is_owned_by(player_id));
                    if owned && !visited.contains(adjacent) {
                        stack.push(adjacent.as_str());
                    }
                }
            }
        }
        visited.remove(from);
        visited
    }

    pub fn are_connected_via_owner(&self, player_id: PlayerId, from: &str, to: &str) -> bool {
        from != to && self.reachable_own_countries(player_id, from).contains(to)
    }

    /// Armies granted at the start of a turn: one per three countries (at
    /// least three) plus the bonus of every fully held continent.
    pub fn calculate_reinforcements(&self, player_id: PlayerId) -> u32 {
        let owned = self.conquered_countries(player_id);
        if owned.is_empty() {
            return 0;
        }
        let base_reinforcements = std::cmp::max(owned.len() as u32 / 3, 3);

        let continent_bonus: u32 = self
            .continents
            .values()
            .filter(|continent| {
                let mut members = self.countries_in_continent(&continent.name).peekable();
                members.peek().is_some() && members.all(|c| c.is_owned_by(player_id))
            })
            .map(Continent::get_bonus)
            .sum();

        base_reinforcements + continent_bonus
    }

    fn country_mut(&mut self, name: &str) -> GameResult<&mut Country> {
        self.countries
            .get_mut(name)
            .ok_or_else(|| GameError::UnknownCountry(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_map() -> GameMap {
        let mut map = GameMap::new();
        map.add_continent("North", 3).unwrap();
        map.add_continent("South", 2).unwrap();
        map.add_country("A", "North").unwrap();
        map.add_country("B", "North").unwrap();
        map.add_country("C", "South").unwrap();
        map.add_country("D", "South").unwrap();
        map.set_adjacent("A", "B").unwrap();
        map.set_adjacent("B", "C").unwrap();
        map.set_adjacent("C", "D").unwrap();
        map
    }

    #[test]
    fn duplicate_continent_is_rejected() {
        let mut map = line_map();
        assert_eq!(
            map.add_continent("North", 1),
            Err(GameError::DuplicateEntity("North".to_string()))
        );
    }

    #[test]
    fn continent_needs_a_control_value() {
        let mut map = line_map();
        assert_eq!(
            map.add_continent("East", 0),
            Err(GameError::InvalidControlValue("East".to_string()))
        );
        assert!(map.get_continent("East").is_none());
    }

    #[test]
    fn country_needs_known_continent_and_unique_name() {
        let mut map = line_map();
        assert_eq!(
            map.add_country("E", "Atlantis"),
            Err(GameError::UnknownContinent("Atlantis".to_string()))
        );
        assert_eq!(
            map.add_country("A", "South"),
            Err(GameError::DuplicateEntity("A".to_string()))
        );
    }

    #[test]
    fn adjacency_is_symmetric() {
        let map = line_map();
        assert!(map.get_country("A").unwrap().is_adjacent("B"));
        assert!(map.get_country("B").unwrap().is_adjacent("A"));
        assert!(!map.get_country("A").unwrap().is_adjacent("C"));
    }

    #[test]
    fn adjacency_rejects_unknown_and_self_edges() {
        let mut map = line_map();
        assert_eq!(
            map.set_adjacent("A", "Z"),
            Err(GameError::UnknownCountry("Z".to_string()))
        );
        assert_eq!(
            map.set_adjacent("A", "A"),
            Err(GameError::SelfAdjacency("A".to_string()))
        );
    }

    #[test]
    fn removing_too_many_armies_fails_without_change() {
        let mut map = line_map();
        map.add_army("A", 2).unwrap();
        let err = map.remove_army("A", 3).unwrap_err();
        assert_eq!(
            err,
            GameError::NegativeArmyCount {
                country: "A".to_string(),
                current: 2,
                requested: 3
            }
        );
        assert_eq!(map.armies("A").unwrap(), 2);
        assert_eq!(map.remove_army("A", 2).unwrap(), 0);
    }

    #[test]
    fn adding_past_the_army_limit_fails_without_change() {
        let mut map = line_map();
        map.set_army("A", u32::MAX - 1).unwrap();
        assert_eq!(
            map.add_army("A", 2),
            Err(GameError::ArmyOverflow {
                country: "A".to_string(),
                current: u32::MAX - 1,
                added: 2
            })
        );
        assert_eq!(map.armies("A").unwrap(), u32::MAX - 1);
        assert_eq!(map.add_army("A", 1).unwrap(), u32::MAX);
    }

    #[test]
    fn army_totals_do_not_wrap() {
        let mut map = line_map();
        map.set_conqueror("A", 1).unwrap();
        map.set_conqueror("B", 1).unwrap();
        map.set_army("A", u32::MAX).unwrap();
        map.set_army("B", u32::MAX).unwrap();
        assert_eq!(map.total_armies(1), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn conqueror_can_be_overwritten() {
        let mut map = line_map();
        map.set_conqueror("A", 1).unwrap();
        map.set_conqueror("A", 2).unwrap();
        assert_eq!(map.owner("A").unwrap(), Some(2));
        assert!(map.conquered_countries(1).is_empty());
        assert_eq!(map.conquered_countries(2).len(), 1);
    }

    #[test]
    fn owner_of_all_requires_every_country() {
        let mut map = line_map();
        assert_eq!(map.owner_of_all(), None);
        for name in ["A", "B", "C"] {
            map.set_conqueror(name, 1).unwrap();
        }
        assert_eq!(map.owner_of_all(), None);
        map.set_conqueror("D", 1).unwrap();
        assert_eq!(map.owner_of_all(), Some(1));
    }

    #[test]
    fn connection_only_walks_own_territory() {
        let mut map = line_map();
        map.set_conqueror("A", 1).unwrap();
        map.set_conqueror("B", 2).unwrap();
        map.set_conqueror("C", 1).unwrap();
        map.set_conqueror("D", 1).unwrap();
        assert!(!map.are_connected_via_owner(1, "A", "C"));
        assert!(map.are_connected_via_owner(1, "C", "D"));
        assert!(!map.are_connected_via_owner(1, "C", "C"));

        map.set_conqueror("B", 1).unwrap();
        assert!(map.are_connected_via_owner(1, "A", "D"));
    }

    #[test]
    fn reinforcements_include_continent_bonus() {
        let mut map = line_map();
        map.set_conqueror("A", 1).unwrap();
        map.set_conqueror("B", 1).unwrap();
        map.set_conqueror("C", 1).unwrap();
        map.set_conqueror("D", 2).unwrap();
        assert_eq!(map.calculate_reinforcements(1), 3 + 3);
        assert_eq!(map.calculate_reinforcements(2), 3);
        assert_eq!(map.calculate_reinforcements(3), 0);
    }
}
