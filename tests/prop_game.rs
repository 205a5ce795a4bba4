//! Property-based tests for the map model, dice and combat.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use risk_engine::board::GameMap;
use risk_engine::combat::{self, dice_ceiling, AttackPhaseState, DiceAction};
use risk_engine::player::{Player, PlayerId};
use risk_engine::startup;
use risk_engine::strategy::Strategy;
use risk_engine::validator;

fn numbered_map(countries: usize) -> GameMap {
    let mut map = GameMap::new();
    map.add_continent("Continent1", 1).unwrap();
    for i in 0..countries {
        map.add_country(&format!("C{i}"), "Continent1").unwrap();
    }
    map
}

fn duel_map(attackers: u32, defenders: u32) -> GameMap {
    let mut map = numbered_map(2);
    map.set_adjacent("C0", "C1").unwrap();
    map.set_conqueror("C0", 1).unwrap();
    map.set_conqueror("C1", 2).unwrap();
    map.add_army("C0", attackers).unwrap();
    map.add_army("C1", defenders).unwrap();
    map
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every inserted edge is visible from both ends.
    #[test]
    fn prop_adjacency_is_symmetric(
        size in 2usize..12,
        edges in prop::collection::vec((0usize..12, 0usize..12), 0..40)
    ) {
        let mut map = numbered_map(size);
        for (a, b) in edges {
            let (a, b) = (a % size, b % size);
            let result = map.set_adjacent(&format!("C{a}"), &format!("C{b}"));
            prop_assert_eq!(result.is_err(), a == b);
        }
        for country in map.countries() {
            for neighbour in country.adjacent_countries() {
                prop_assert!(map.get_country(neighbour).unwrap().is_adjacent(&country.name));
            }
        }
    }

    /// A ring plus random chords is always connected and valid.
    #[test]
    fn prop_rings_validate(
        size in 1usize..15,
        chords in prop::collection::vec((0usize..15, 0usize..15), 0..10)
    ) {
        let mut map = numbered_map(size);
        for i in 0..size {
            let next = (i + 1) % size;
            if next != i {
                map.set_adjacent(&format!("C{i}"), &format!("C{next}")).unwrap();
            }
        }
        for (a, b) in chords {
            let (a, b) = (a % size, b % size);
            if a != b {
                map.set_adjacent(&format!("C{a}"), &format!("C{b}")).unwrap();
            }
        }
        prop_assert!(validator::validate(&map));
    }

    /// Clamped dice never exceed what the country can roll.
    #[test]
    fn prop_dice_clamping(armies in 0u32..50, requested in 0u32..10) {
        let map = duel_map(armies, armies);
        let attack = combat::max_allowed_dice(&map, DiceAction::Attack, "C0", requested).unwrap();
        let defend = combat::max_allowed_dice(&map, DiceAction::Defend, "C1", requested).unwrap();
        prop_assert!(attack <= 3 && attack <= armies.saturating_sub(1) && attack <= requested);
        prop_assert!(defend <= 2 && defend <= armies && defend <= requested);
    }

    /// Armies only disappear as losses; a conquest moves the rest over.
    #[test]
    fn prop_combat_conserves_armies(
        attackers in 2u32..20,
        defenders in 1u32..20,
        attack_dice in 1u32..=3,
        defend_dice in 1u32..=2,
        seed in any::<u64>()
    ) {
        let attack_dice = attack_dice.min(dice_ceiling(DiceAction::Attack, attackers));
        let defend_dice = defend_dice.min(dice_ceiling(DiceAction::Defend, defenders));
        let mut map = duel_map(attackers, defenders);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = AttackPhaseState::new(1, "C0", 2, "C1").with_dice(attack_dice, defend_dice);

        let conquered = combat::fight(&mut map, &mut state, &mut rng).unwrap();
        let outcome = state.outcome.unwrap();

        prop_assert_eq!(
            outcome.attacker_losses + outcome.defender_losses,
            attack_dice.min(defend_dice)
        );
        prop_assert_eq!(
            map.armies("C0").unwrap() + map.armies("C1").unwrap(),
            attackers + defenders - outcome.attacker_losses - outcome.defender_losses
        );
        prop_assert!(map.armies("C0").unwrap() >= 1);
        if conquered {
            prop_assert_eq!(map.owner("C1").unwrap(), Some(1));
            prop_assert_eq!(map.armies("C1").unwrap(), outcome.armies_moved);
            prop_assert_eq!(
                map.armies("C0").unwrap(),
                attackers - outcome.attacker_losses - outcome.armies_moved
            );
        } else {
            prop_assert_eq!(map.owner("C1").unwrap(), Some(2));
            prop_assert_eq!(outcome.armies_moved, 0);
        }
    }

    /// Dealing gives each country exactly one owner and keeps the shares even.
    #[test]
    fn prop_assignment_is_even(countries in 1usize..60, players in 2usize..=6, seed in any::<u64>()) {
        let mut map = numbered_map(countries);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ids: Vec<PlayerId> = (1..=players).collect();
        startup::assign_countries_to_players(&mut map, &ids, &mut rng).unwrap();

        let counts: Vec<usize> = ids.iter().map(|id| map.conquered_countries(*id).len()).collect();
        prop_assert_eq!(counts.iter().sum::<usize>(), countries);
        prop_assert!(counts.iter().max().unwrap() - counts.iter().min().unwrap() <= 1);
    }

    /// Turn order ranks the table 1..=N with no gaps or repeats.
    #[test]
    fn prop_turn_order_is_a_bijection(players in 1usize..=6) {
        let mut table: Vec<Player> = (1..=players)
            .map(|id| Player::new(id, &format!("P{id}"), Strategy::Aggressive))
            .collect();
        startup::assign_turn_order(&mut table);
        let mut ranks: Vec<u32> = table.iter().map(|p| p.turn_order.unwrap()).collect();
        ranks.sort_unstable();
        prop_assert_eq!(ranks, (1..=players as u32).collect::<Vec<_>>());
    }
}
