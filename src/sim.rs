use bon::Builder;
use rand::Rng;
use tracing::trace;

use crate::{Error, OutcomeModel, Result, Roll, Strategy, MAX_GAME_TURNS, MAX_TURN_ROLLS};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TurnState {
    pub score: f64,
    pub rolls: u32,
    pub busted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnEnd {
    Busted,
    Stopped,
}

/// Terminal result of one turn. A busted turn always scores zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Turn {
    pub score: f64,
    pub rolls: u32,
    pub end: TurnEnd,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Game {
    pub score: f64,
    pub turns: u32,
    pub turn_scores: Vec<f64>,
    pub turn_rolls: Vec<u32>,
}

/// Plays turns and games for one stopping rule.
#[derive(Builder, Debug, Clone)]
#[builder(start_fn(name = "new"))]
pub struct Simulator<'a> {
    #[builder(start_fn)]
    model: &'a OutcomeModel,
    #[builder(start_fn)]
    strategy: Strategy,
    #[builder(default = MAX_TURN_ROLLS)]
    max_turn_rolls: u32,
    #[builder(default = MAX_GAME_TURNS)]
    max_game_turns: u32,
}

impl TurnState {
    /// Any roll worth nothing ends the turn with its points forfeited.
    pub fn apply(&mut self, roll: &Roll) {
        self.rolls += 1;
        if roll.points == 0.0 {
            self.busted = true;
            self.score = 0.0;
        } else {
            self.score += roll.points;
        }
    }

    #[must_use]
    fn finish(self, end: TurnEnd) -> Turn {
        Turn {
            score: if self.busted { 0.0 } else { self.score },
            rolls: self.rolls,
            end,
        }
    }
}

impl Game {
    fn record(&mut self, turn: &Turn) {
        self.score += turn.score;
        self.turns += 1;
        self.turn_scores.push(turn.score);
        self.turn_rolls.push(turn.rolls);
    }
}

impl Simulator<'_> {
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn play_turn<G>(&self, rng: &mut G) -> Result<Turn>
    where
        G: Rng + ?Sized,
    {
        let mut turn = TurnState::default();
        loop {
            if turn.busted {
                return Ok(turn.finish(TurnEnd::Busted));
            }
            if self.strategy.should_stop(&turn) {
                return Ok(turn.finish(TurnEnd::Stopped));
            }
            if turn.rolls >= self.max_turn_rolls {
                return Err(Error::TurnLimit {
                    limit: self.max_turn_rolls,
                    score: turn.score,
                });
            }
            turn.apply(self.model.sample_rng(rng)?);
        }
    }

    /// Plays turns until the cumulative score reaches `target`.
    pub fn play_game<G>(&self, target: f64, rng: &mut G) -> Result<Game>
    where
        G: Rng + ?Sized,
    {
        let mut game = Game::default();
        while game.score < target {
            if game.turns >= self.max_game_turns {
                return Err(Error::GameLimit {
                    limit: self.max_game_turns,
                    score: game.score,
                });
            }
            let turn = self.play_turn(rng)?;
            trace!(
                strategy = self.strategy.name(),
                score = turn.score,
                rolls = turn.rolls,
                end = ?turn.end,
                "turn finished"
            );
            game.record(&turn);
        }
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::defs::standard;
    use crate::{Orientation, PigTable, Strategy};

    /// Replays fixed uniform draws through `Rng::gen::<f64>`.
    struct Scripted {
        draws: Vec<f64>,
        pos: usize,
    }

    impl Scripted {
        fn new(draws: Vec<f64>) -> Self {
            Self { draws, pos: 0 }
        }
    }

    impl RngCore for Scripted {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            let u = self.draws[self.pos % self.draws.len()];
            self.pos += 1;
            ((u * (1u64 << 53) as f64) as u64) << 11
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(8) {
                let bytes = self.next_u64().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn model() -> OutcomeModel {
        OutcomeModel::new(standard()).unwrap()
    }

    /// A uniform draw that lands on the given pair.
    fn draw(model: &OutcomeModel, first: Orientation, second: Orientation) -> f64 {
        let i = model
            .rolls()
            .iter()
            .position(|r| r.first == first && r.second == second)
            .unwrap();
        let lo = if i == 0 { 0.0 } else { model.cumulative()[i - 1] };
        (lo + model.cumulative()[i]) / 2.0
    }

    #[test]
    fn scripted_draws_hit_their_rolls() {
        use Orientation::*;
        let m = model();
        let mut rng = Scripted::new(vec![draw(&m, Trotter, Snouter)]);
        let roll = m.sample_rng(&mut rng).unwrap();
        assert_eq!((roll.first, roll.second), (Trotter, Snouter));
    }

    #[test]
    fn bust_forfeits_accumulated_points() {
        use Orientation::*;
        let m = model();
        let mut rng = Scripted::new(vec![
            draw(&m, Razorback, Razorback),
            draw(&m, Razorback, Razorback),
            draw(&m, SideUp, SideDown),
        ]);
        let turn = Simulator::new(&m, Strategy::FixedCount(5))
            .build()
            .play_turn(&mut rng)
            .unwrap();
        assert_eq!(
            turn,
            Turn {
                score: 0.0,
                rolls: 3,
                end: TurnEnd::Busted,
            }
        );
    }

    #[test]
    fn fixed_count_stops_at_budget() {
        use Orientation::*;
        let m = model();
        let mut rng = Scripted::new(vec![draw(&m, Trotter, SideUp)]);
        let turn = Simulator::new(&m, Strategy::FixedCount(3))
            .build()
            .play_turn(&mut rng)
            .unwrap();
        assert_eq!(turn.score, 15.0);
        assert_eq!(turn.rolls, 3);
        assert_eq!(turn.end, TurnEnd::Stopped);
    }

    #[test]
    fn target_score_stops_once_reached() {
        use Orientation::*;
        let m = model();
        let mut rng = Scripted::new(vec![draw(&m, Snouter, Snouter), draw(&m, SideUp, SideDown)]);
        let turn = Simulator::new(&m, Strategy::TargetScore(30.0))
            .build()
            .play_turn(&mut rng)
            .unwrap();
        assert_eq!(turn.score, 40.0);
        assert_eq!(turn.rolls, 1);
    }

    #[test]
    fn zero_budget_never_rolls() {
        let m = model();
        let mut rng = Scripted::new(vec![0.5]);
        let turn = Simulator::new(&m, Strategy::FixedCount(0))
            .build()
            .play_turn(&mut rng)
            .unwrap();
        assert_eq!(turn.rolls, 0);
        assert_eq!(rng.pos, 0);
    }

    #[test]
    fn turn_cap_is_reported() {
        let table = PigTable::builder()
            .side_up(0.0)
            .side_down(0.0)
            .trotter(1.0)
            .razorback(0.0)
            .snouter(0.0)
            .leaning_jowler(0.0)
            .build()
            .unwrap();
        let m = OutcomeModel::new(table).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = Simulator::new(&m, Strategy::TargetScore(f64::INFINITY))
            .max_turn_rolls(50)
            .build()
            .play_turn(&mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            Error::TurnLimit {
                limit: 50,
                score: 1000.0
            }
        );
    }

    #[test]
    fn zero_point_roll_busts_the_turn() {
        let table = PigTable::builder()
            .side_up(0.0)
            .side_down(0.0)
            .trotter(0.0)
            .razorback(0.0)
            .snouter(1.0)
            .leaning_jowler(0.0)
            .snouter_points(0.0)
            .build()
            .unwrap();
        let m = OutcomeModel::new(table).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let turn = Simulator::new(&m, Strategy::FixedCount(3))
            .build()
            .play_turn(&mut rng)
            .unwrap();
        assert_eq!(
            turn,
            Turn {
                score: 0.0,
                rolls: 1,
                end: TurnEnd::Busted,
            }
        );
    }

    #[test]
    fn zero_point_sider_busts_after_scoring_rolls() {
        use Orientation::*;
        let table = PigTable::builder()
            .side_up(0.5)
            .side_down(0.0)
            .trotter(0.5)
            .razorback(0.0)
            .snouter(0.0)
            .leaning_jowler(0.0)
            .sider(0.0)
            .build()
            .unwrap();
        let m = OutcomeModel::new(table).unwrap();
        let mut rng = Scripted::new(vec![draw(&m, Trotter, Trotter), draw(&m, SideUp, SideUp)]);
        let turn = Simulator::new(&m, Strategy::FixedCount(5))
            .build()
            .play_turn(&mut rng)
            .unwrap();
        assert_eq!(
            turn,
            Turn {
                score: 0.0,
                rolls: 2,
                end: TurnEnd::Busted,
            }
        );
    }

    #[test]
    fn game_cap_is_reported() {
        // Every roll is a zero-point double sider, so every turn busts.
        let table = PigTable::builder()
            .side_up(1.0)
            .side_down(0.0)
            .trotter(0.0)
            .razorback(0.0)
            .snouter(0.0)
            .leaning_jowler(0.0)
            .sider(0.0)
            .build()
            .unwrap();
        let m = OutcomeModel::new(table).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = Simulator::new(&m, Strategy::FixedCount(1))
            .max_game_turns(20)
            .build()
            .play_game(100.0, &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            Error::GameLimit {
                limit: 20,
                score: 0.0
            }
        );
    }

    #[test]
    fn game_records_every_turn() {
        let m = model();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let game = Simulator::new(&m, Strategy::FixedCount(5))
            .build()
            .play_game(100.0, &mut rng)
            .unwrap();

        assert!(game.score >= 100.0);
        assert_eq!(game.turns as usize, game.turn_scores.len());
        assert_eq!(game.turns as usize, game.turn_rolls.len());
        assert!((game.turn_scores.iter().sum::<f64>() - game.score).abs() < 1e-9);
        assert!(game.turn_rolls.iter().all(|&r| (1..=5).contains(&r)));
        // Everything before the final turn stayed short of the target.
        let before: f64 = game.turn_scores[..game.turn_scores.len() - 1].iter().sum();
        assert!(before < 100.0);
    }

    proptest! {
        #[test]
        fn any_bust_zeroes_the_turn(prefix in prop::collection::vec(2usize..36, 0..12)) {
            let m = model();
            let safe: Vec<f64> = prefix
                .iter()
                .map(|&i| &m.rolls()[i])
                .filter(|r| r.points > 0.0 && r.probability > 0.0)
                .map(|r| draw(&m, r.first, r.second))
                .collect();
            let n = safe.len() as u32;
            let mut draws = safe;
            draws.push(draw(&m, Orientation::SideDown, Orientation::SideUp));

            let mut rng = Scripted::new(draws);
            let turn = Simulator::new(&m, Strategy::FixedCount(n + 1))
                .build()
                .play_turn(&mut rng)
                .unwrap();
            prop_assert_eq!(turn.score, 0.0);
            prop_assert_eq!(turn.rolls, n + 1);
            prop_assert_eq!(turn.end, TurnEnd::Busted);
        }
    }
}
