// validator.rs
//! Structural checks that decide whether a loaded map is playable.
//!
//! Failures are ordinary values: a caller that gets one should report it and
//! offer another map source.

use crate::board::GameMap;
use std::collections::{BTreeSet, VecDeque};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("map has no countries")]
    EmptyMap,

    #[error("country '{country}' belongs to unknown continent '{continent}'")]
    UnknownContinent { country: String, continent: String },

    #[error("country '{country}' lists unknown neighbour '{neighbour}'")]
    UnknownAdjacency { country: String, neighbour: String },

    #[error("country '{0}' is adjacent to itself")]
    SelfAdjacency(String),

    #[error("'{from}' lists '{to}' as adjacent but not the other way round")]
    AsymmetricAdjacency { from: String, to: String },

    #[error("map is disconnected: reached {reached} of {total} countries")]
    MapDisconnected { reached: usize, total: usize },

    #[error("continent '{continent}' is disconnected: reached {reached} of {total} countries")]
    ContinentDisconnected {
        continent: String,
        reached: usize,
        total: usize,
    },
}

/// `true` when the map passes every structural check.
pub fn validate(map: &GameMap) -> bool {
    check(map).is_ok()
}

/// Runs every structural check and reports the first failure.
pub fn check(map: &GameMap) -> Result<(), ValidationError> {
    let first = map.countries().next().ok_or(ValidationError::EmptyMap)?;
    check_references(map)?;

    let reached = traverse(map, &first.name, |_| true);
    if reached != map.country_count() {
        return Err(ValidationError::MapDisconnected {
            reached,
            total: map.country_count(),
        });
    }

    for continent in map.continents() {
        let members: Vec<&str> = map
            .countries_in_continent(&continent.name)
            .map(|country| country.name.as_str())
            .collect();
        let Some(start) = members.first() else {
            continue;
        };
        let reached = traverse(map, start, |name| {
            map.get_country(name)
                .is_some_and(|country| country.continent == continent.name)
        });
        if reached != members.len() {
            return Err(ValidationError::ContinentDisconnected {
                continent: continent.name.clone(),
                reached,
                total: members.len(),
            });
        }
    }

    Ok(())
}

fn check_references(map: &GameMap) -> Result<(), ValidationError> {
    for country in map.countries() {
        if map.get_continent(&country.continent).is_none() {
            return Err(ValidationError::UnknownContinent {
                country: country.name.clone(),
                continent: country.continent.clone(),
            });
        }
        for neighbour in country.adjacent_countries() {
            if *neighbour == country.name {
                return Err(ValidationError::SelfAdjacency(country.name.clone()));
            }
            let Some(other) = map.get_country(neighbour) else {
                return Err(ValidationError::UnknownAdjacency {
                    country: country.name.clone(),
                    neighbour: neighbour.clone(),
                });
            };
            if !other.is_adjacent(&country.name) {
                return Err(ValidationError::AsymmetricAdjacency {
                    from: country.name.clone(),
                    to: neighbour.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Breadth-first walk from `start` over countries accepted by `include`.
/// Returns the number of countries visited.
fn traverse<F>(map: &GameMap, start: &str, include: F) -> usize
where
    F: Fn(&str) -> bool,
{
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut queue = VecDeque::from([start]);
    visited.insert(start);

    while let Some(current) = queue.pop_front() {
        let Some(country) = map.get_country(current) else {
            continue;
        };
        for neighbour in country.adjacent_countries() {
            let neighbour = neighbour.as_str();
            if include(neighbour) && visited.insert(neighbour) {
                queue.push_back(neighbour);
            }
        }
    }
    visited.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_continent_map() -> GameMap {
        let mut map = GameMap::new();
        map.add_continent("West", 2).unwrap();
        map.add_continent("East", 3).unwrap();
        for (name, continent) in [("W1", "West"), ("W2", "West"), ("E1", "East"), ("E2", "East")] {
            map.add_country(name, continent).unwrap();
        }
        map.set_adjacent("W1", "W2").unwrap();
        map.set_adjacent("W2", "E1").unwrap();
        map.set_adjacent("E1", "E2").unwrap();
        map
    }

    #[test]
    fn connected_map_is_valid() {
        let map = two_continent_map();
        assert!(validate(&map));
        assert_eq!(check(&map), Ok(()));
    }

    #[test]
    fn empty_map_is_invalid() {
        assert_eq!(check(&GameMap::new()), Err(ValidationError::EmptyMap));
    }

    #[test]
    fn disconnected_map_is_reported() {
        let mut map = two_continent_map();
        map.add_country("E3", "East").unwrap();
        assert_eq!(
            check(&map),
            Err(ValidationError::MapDisconnected {
                reached: 4,
                total: 5
            })
        );
        assert!(!validate(&map));
    }

    #[test]
    fn continent_connected_only_through_another_continent_is_invalid() {
        // E1 and E2 are joined only via W2, so East is split into two pockets.
        let mut map = GameMap::new();
        map.add_continent("West", 2).unwrap();
        map.add_continent("East", 3).unwrap();
        map.add_country("W1", "West").unwrap();
        map.add_country("E1", "East").unwrap();
        map.add_country("E2", "East").unwrap();
        map.set_adjacent("E1", "W1").unwrap();
        map.set_adjacent("W1", "E2").unwrap();

        assert_eq!(
            check(&map),
            Err(ValidationError::ContinentDisconnected {
                continent: "East".to_string(),
                reached: 1,
                total: 2
            })
        );
    }

    #[test]
    fn validation_does_not_mutate() {
        let map = two_continent_map();
        let before = map.clone();
        assert!(validate(&map));
        assert!(validate(&map));
        assert_eq!(map, before);
    }

    /// The two-continent map after a raw edit of its serialized form, the way a
    /// hand-written or corrupted map file can arrive.
    fn edited(edit: impl FnOnce(&mut serde_json::Value)) -> GameMap {
        let mut raw = serde_json::to_value(two_continent_map()).unwrap();
        edit(&mut raw["countries"]);
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn unknown_continent_is_reported() {
        let map = edited(|countries| countries["W1"]["continent"] = "North".into());
        assert_eq!(
            check(&map),
            Err(ValidationError::UnknownContinent {
                country: "W1".to_string(),
                continent: "North".to_string()
            })
        );
    }

    #[test]
    fn unknown_neighbour_is_reported() {
        let map = edited(|countries| {
            countries["E2"]["adjacent_countries"] = serde_json::json!(["E1", "Z"]);
        });
        assert_eq!(
            check(&map),
            Err(ValidationError::UnknownAdjacency {
                country: "E2".to_string(),
                neighbour: "Z".to_string()
            })
        );
    }

    #[test]
    fn self_adjacency_is_reported() {
        let map = edited(|countries| {
            countries["E1"]["adjacent_countries"] = serde_json::json!(["E1", "E2", "W2"]);
        });
        assert_eq!(check(&map), Err(ValidationError::SelfAdjacency("E1".to_string())));
    }

    #[test]
    fn one_sided_edge_is_reported() {
        let map = edited(|countries| {
            countries["W1"]["adjacent_countries"] = serde_json::json!([]);
        });
        assert_eq!(
            check(&map),
            Err(ValidationError::AsymmetricAdjacency {
                from: "W2".to_string(),
                to: "W1".to_string()
            })
        );
        assert!(!validate(&map));
    }

    #[test]
    fn single_country_map_is_valid() {
        let mut map = GameMap::new();
        map.add_continent("Island", 1).unwrap();
        map.add_country("Only", "Island").unwrap();
        assert!(validate(&map));
    }
}
