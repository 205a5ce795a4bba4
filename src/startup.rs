// startup.rs
//! Startup phase: who owns what, how many armies each player starts with and
//! the order of play.

use crate::board::GameMap;
use crate::error::{GameError, GameResult};
use crate::player::{Player, PlayerId};
use crate::strategy::ReinforcementPlan;
use rand::seq::SliceRandom;
use rand::Rng;

/// Country count of the classic map the base allotments are tuned for.
pub const REFERENCE_COUNTRY_COUNT: usize = 42;

/// Starting armies per player on the reference map, by player count.
const BASE_ARMIES: [(usize, u32); 5] = [(2, 40), (3, 35), (4, 30), (5, 25), (6, 20)];

/// Starting armies for each player, scaled by how large the map is compared
/// to the 42-country reference map.
pub fn initial_army_calculation(num_players: usize, country_count: usize) -> GameResult<u32> {
    let base = BASE_ARMIES
        .iter()
        .find(|(players, _)| *players == num_players)
        .map(|(_, armies)| *armies)
        .ok_or_else(|| {
            GameError::IllegalAction(format!("{num_players} players is not a supported game size"))
        })?;
    Ok(base * country_count as u32 / REFERENCE_COUNTRY_COUNT as u32)
}

/// Shuffles the countries and deals them out one at a time, so no player gets
/// more than one country above anyone else.
pub fn assign_countries_to_players<R: Rng + ?Sized>(
    map: &mut GameMap,
    player_ids: &[PlayerId],
    rng: &mut R,
) -> GameResult<()> {
    if player_ids.is_empty() {
        return Err(GameError::IllegalAction(
            "cannot deal countries to zero players".to_string(),
        ));
    }
    let mut names: Vec<String> = map.countries().map(|c| c.name.clone()).collect();
    names.shuffle(rng);

    for (name, player_id) in names.iter().zip(player_ids.iter().cycle()) {
        map.set_conqueror(name, *player_id)?;
    }
    Ok(())
}

/// Ranks players 1..N in list order.
pub fn assign_turn_order(players: &mut [Player]) {
    for (rank, player) in (1..).zip(players.iter_mut()) {
        player.turn_order = Some(rank);
    }
}

/// Puts one army on every owned country and lets each player's strategy place
/// the rest of its allotment.
pub fn place_initial_armies<R: Rng + ?Sized>(
    map: &mut GameMap,
    players: &mut [Player],
    allotment: u32,
    rng: &mut R,
) -> GameResult<()> {
    for player in players.iter_mut() {
        let owned = player.countries(map);
        for name in &owned {
            map.add_army(name, 1)?;
        }

        let remaining = allotment.saturating_sub(owned.len() as u32);
        if remaining == 0 || owned.is_empty() {
            continue;
        }
        match player
            .strategy
            .decide_reinforcement(player.id, map, remaining, rng)
        {
            ReinforcementPlan::Place(placements) => {
                apply_placements(map, player.id, &placements, remaining)?;
            }
            // Nothing to double yet; deal the armies out evenly instead.
            ReinforcementPlan::DoubleAll => {
                for (name, _) in owned.iter().cycle().zip(0..remaining) {
                    map.add_army(name, 1)?;
                }
            }
        }
        tracing::debug!(player = player.id, remaining, "initial armies placed");
    }
    Ok(())
}

/// Adds each placement after checking the player owns every target and the
/// placements add up to exactly `armies`.
pub fn apply_placements(
    map: &mut GameMap,
    player_id: PlayerId,
    placements: &[(String, u32)],
    armies: u32,
) -> GameResult<()> {
    let total: u32 = placements.iter().map(|(_, n)| n).sum();
    if total != armies {
        return Err(GameError::IllegalAction(format!(
            "placed {total} armies, expected {armies}"
        )));
    }
    for (name, _) in placements {
        if map.owner(name)? != Some(player_id) {
            return Err(GameError::IllegalAction(format!(
                "player {player_id} cannot reinforce '{name}'"
            )));
        }
    }
    for (name, count) in placements {
        map.add_army(name, *count)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn map_with(countries: usize) -> GameMap {
        let mut map = GameMap::new();
        map.add_continent("Continent1", 5).unwrap();
        for i in 0..countries {
            map.add_country(&format!("C{i}"), "Continent1").unwrap();
        }
        map
    }

    fn players(n: usize) -> Vec<Player> {
        (1..=n)
            .map(|id| Player::new(id, &format!("P{id}"), Strategy::Aggressive))
            .collect()
    }

    #[test]
    fn allotment_scales_with_map_size() {
        let expected = [40, 35, 30, 25, 20];
        for (players, armies) in (2..=6).zip(expected) {
            assert_eq!(initial_army_calculation(players, 42).unwrap(), armies);
        }
        assert_eq!(initial_army_calculation(3, 21).unwrap(), 17);
        assert_eq!(initial_army_calculation(2, 6).unwrap(), 5);
        assert!(initial_army_calculation(1, 42).is_err());
        assert!(initial_army_calculation(7, 42).is_err());
    }

    #[test]
    fn every_country_gets_exactly_one_owner_evenly() {
        let mut map = map_with(42);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ids: Vec<PlayerId> = (1..=5).collect();
        assign_countries_to_players(&mut map, &ids, &mut rng).unwrap();

        assert!(map.countries().all(|c| c.conqueror().is_some()));
        let counts: Vec<usize> = ids.iter().map(|id| map.conquered_countries(*id).len()).collect();
        assert_eq!(counts.iter().sum::<usize>(), 42);
        let spread = counts.iter().max().unwrap() - counts.iter().min().unwrap();
        assert!(spread <= 1);
    }

    #[test]
    fn turn_order_is_sequential() {
        let mut players = players(6);
        assign_turn_order(&mut players);
        let order: Vec<u32> = players.iter().map(|p| p.turn_order.unwrap()).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn initial_armies_cover_every_country_and_match_allotment() {
        let mut map = map_with(12);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut players = players(3);
        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        assign_countries_to_players(&mut map, &ids, &mut rng).unwrap();

        let allotment = initial_army_calculation(3, map.country_count()).unwrap();
        place_initial_armies(&mut map, &mut players, allotment, &mut rng).unwrap();

        assert!(map.countries().all(|c| c.armies() >= 1));
        for id in ids {
            assert_eq!(map.total_armies(id), u64::from(allotment));
        }
    }

    #[test]
    fn placements_must_target_own_countries_and_add_up() {
        let mut map = map_with(2);
        map.set_conqueror("C0", 1).unwrap();
        map.set_conqueror("C1", 2).unwrap();
        let before = map.clone();

        let wrong_total = apply_placements(&mut map, 1, &[("C0".to_string(), 2)], 3);
        assert!(wrong_total.is_err());
        let not_owned = apply_placements(&mut map, 1, &[("C1".to_string(), 3)], 3);
        assert!(not_owned.is_err());
        assert_eq!(map, before);

        apply_placements(&mut map, 1, &[("C0".to_string(), 3)], 3).unwrap();
        assert_eq!(map.armies("C0").unwrap(), 3);
    }
}
