// turn_phase.rs
use crate::error::GameResult;
use crate::game::Game;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum TurnPhase {
    Startup,
    Reinforcement,
    Attack,
    Fortification,
    GameOver,
}

impl Game {
    /// Advances the game by exactly one phase. Does nothing once the game is over.
    pub fn step(&mut self) -> GameResult<()> {
        let passing = self.turn_phase != TurnPhase::Startup
            && self.current_player().is_eliminated(&self.map);

        match self.turn_phase {
            TurnPhase::Startup => {
                self.run_startup()?;
                self.round = 1;
                self.current_turn = 0;
                self.start_turn();
            }
            TurnPhase::Reinforcement => {
                if !passing {
                    self.reinforce()?;
                }
                self.turn_phase = TurnPhase::Attack;
            }
            TurnPhase::Attack => {
                if !passing {
                    self.attack()?;
                }
                if !self.check_win_conditions() {
                    self.turn_phase = TurnPhase::Fortification;
                }
            }
            TurnPhase::Fortification => {
                if !passing {
                    self.fortify()?;
                }
                self.end_turn();
            }
            TurnPhase::GameOver => {}
        }
        Ok(())
    }

    pub fn start_turn(&mut self) {
        let player = &self.players[self.current_turn];
        self.reinforcement_armies = self.map.calculate_reinforcements(player.id);
        tracing::debug!(
            round = self.round,
            player = player.id,
            armies = self.reinforcement_armies,
            "turn started"
        );
        self.players[self.current_turn].strategy.start_turn(&mut self.rng);
        self.turn_phase = TurnPhase::Reinforcement;
    }

    /// Hands the turn to the next seat. Passing the last seat starts a new
    /// round; exceeding the turn limit ends the game without a winner.
    pub fn end_turn(&mut self) {
        self.turns_played += 1;
        self.current_turn = (self.current_turn + 1) % self.num_players;
        if self.current_turn == 0 {
            self.round += 1;
        }

        if let Some(limit) = self.turn_limit {
            if self.round > limit {
                self.round = limit;
                self.turn_phase = TurnPhase::GameOver;
                tracing::info!(rounds = limit, "turn limit reached, no winner");
                return;
            }
        }
        self.start_turn();
    }

    /// Ends the game when a single player owns every country.
    pub fn check_win_conditions(&mut self) -> bool {
        let Some(owner) = self.map.owner_of_all() else {
            return false;
        };
        self.winner = Some(owner);
        self.turn_phase = TurnPhase::GameOver;
        self.turns_played += 1;

        let name = self.player(owner).map(|p| p.name.clone()).unwrap_or_default();
        tracing::info!(
            winner = owner,
            %name,
            rounds = self.round,
            turns = self.turns_played,
            "game over"
        );
        let message = format!("{name} controls every country and wins");
        for player in &mut self.players {
            player.strategy.inform(&message);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GameMap;
    use crate::player::Player;
    use crate::strategy::{Strategy, StrategyKind};

    fn line_map() -> GameMap {
        let mut map = GameMap::new();
        map.add_continent("West", 1).unwrap();
        map.add_continent("East", 1).unwrap();
        for name in ["A", "B", "C"] {
            map.add_country(name, "West").unwrap();
        }
        for name in ["D", "E", "F"] {
            map.add_country(name, "East").unwrap();
        }
        for (a, b) in [("A", "B"), ("B", "C"), ("C", "D"), ("D", "E"), ("E", "F")] {
            map.set_adjacent(a, b).unwrap();
        }
        map
    }

    fn game(kinds: &[StrategyKind], turn_limit: Option<u32>) -> Game {
        let players = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                Player::new(i + 1, &format!("P{}", i + 1), Strategy::from_kind(*kind).unwrap())
            })
            .collect();
        Game::new(line_map(), players, Some(42), turn_limit).unwrap()
    }

    #[test]
    fn phases_cycle_in_order() {
        let mut game = game(&[StrategyKind::Benevolent, StrategyKind::Benevolent], None);
        assert_eq!(game.turn_phase, TurnPhase::Startup);

        game.step().unwrap();
        assert_eq!(game.turn_phase, TurnPhase::Reinforcement);
        assert!(game.map.countries().all(|c| c.conqueror().is_some()));
        assert_eq!(game.players[1].turn_order, Some(2));

        game.step().unwrap();
        assert_eq!(game.turn_phase, TurnPhase::Attack);
        assert_eq!(game.reinforcement_armies, 0);
        game.step().unwrap();
        assert_eq!(game.turn_phase, TurnPhase::Fortification);
        game.step().unwrap();
        assert_eq!(game.turn_phase, TurnPhase::Reinforcement);
        assert_eq!(game.current_turn, 1);
        assert_eq!(game.turns_played, 1);
    }

    #[test]
    fn turn_limit_ends_without_winner() {
        let mut game = game(&[StrategyKind::Benevolent, StrategyKind::Benevolent], Some(3));
        let outcome = game.run().unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.rounds, 3);
        assert_eq!(outcome.turns_played, 6);
        assert_eq!(game.turn_phase, TurnPhase::GameOver);
    }

    #[test]
    fn cheater_takes_the_map() {
        let mut game = game(&[StrategyKind::Cheater, StrategyKind::Benevolent], Some(50));
        let outcome = game.run().unwrap();
        assert_eq!(outcome.winner, Some(1));
        assert_eq!(game.map.owner_of_all(), Some(1));

        // Further steps are no-ops.
        let before = game.outcome();
        game.step().unwrap();
        assert_eq!(game.outcome(), before);
    }

    #[test]
    fn reinforcements_follow_ownership() {
        let mut game = game(&[StrategyKind::Aggressive, StrategyKind::Benevolent], None);
        game.step().unwrap();
        let owner = game.current_player().id;
        assert_eq!(game.reinforcement_armies, game.map.calculate_reinforcements(owner));
        let before = game.map.total_armies(owner);
        game.step().unwrap();
        assert_eq!(
            game.map.total_armies(owner),
            before + u64::from(game.map.calculate_reinforcements(owner))
        );
    }
}
