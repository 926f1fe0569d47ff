//! Batches of simulated games and the strategy comparison built on them.

use bon::Builder;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::sim::{Game, Simulator};
use crate::stats::{Summary, Verdict, WelchTest};
use crate::{OutcomeModel, Predictor, Result, Strategy, MAX_GAME_TURNS, MAX_TURN_ROLLS};

const GAMES: usize = 10_000;
const TARGET_GAME_SCORE: f64 = 100.0;
const SEED: u64 = 1;
const ALPHA: f64 = 0.05;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Execution {
    /// One generator shared by every game, in game order.
    #[default]
    Sequential,
    /// One generator stream per game, independent of thread scheduling.
    Parallel,
}

#[derive(Builder, Debug, Clone, PartialEq)]
pub struct MonteCarlo {
    #[builder(default = GAMES)]
    games: usize,
    #[builder(default = TARGET_GAME_SCORE)]
    target_game_score: f64,
    #[builder(default = SEED)]
    seed: u64,
    #[builder(default = ALPHA)]
    alpha: f64,
    #[builder(default = MAX_TURN_ROLLS)]
    max_turn_rolls: u32,
    #[builder(default = MAX_GAME_TURNS)]
    max_game_turns: u32,
    #[builder(default)]
    execution: Execution,
}

/// Turns needed to reach the target score, one entry per game.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub strategy: Strategy,
    pub turns: Vec<u32>,
    pub turn_score_mean: f64,
    pub turn_rolls_mean: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub fixed_count: Batch,
    pub target_score: Batch,
    pub test: WelchTest,
    pub alpha: f64,
    pub verdict: Verdict,
}

#[derive(Default)]
struct Tally {
    turns: Vec<u32>,
    turn_count: u64,
    score_sum: f64,
    roll_sum: u64,
}

impl Default for MonteCarlo {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MonteCarlo {
    #[must_use]
    pub fn games(&self) -> usize {
        self.games
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Plays every game under a single strategy.
    pub fn run(&self, model: &OutcomeModel, strategy: Strategy) -> Result<Batch> {
        let sim = self.simulator(model, strategy);
        let batch = match self.execution {
            Execution::Sequential => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                let mut tally = Tally::with_capacity(self.games);
                for _ in 0..self.games {
                    tally.push(&sim.play_game(self.target_game_score, &mut rng)?);
                }
                tally.finish(strategy)
            }
            Execution::Parallel => self.run_parallel(&sim, 0)?,
        };
        debug!(
            strategy = strategy.name(),
            games = batch.turns.len(),
            mean = ?batch.mean(),
            "batch finished"
        );
        Ok(batch)
    }

    /// Plays both strategies and tests whether `target_score` reaches the
    /// game target in fewer turns than `fixed_count`.
    pub fn compare(
        &self,
        model: &OutcomeModel,
        fixed_count: Strategy,
        target_score: Strategy,
    ) -> Result<Comparison> {
        let fixed_sim = self.simulator(model, fixed_count);
        let target_sim = self.simulator(model, target_score);

        let (fixed, target) = match self.execution {
            Execution::Sequential => {
                // Games alternate between the strategies on one generator.
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                let mut fixed = Tally::with_capacity(self.games);
                let mut target = Tally::with_capacity(self.games);
                for _ in 0..self.games {
                    fixed.push(&fixed_sim.play_game(self.target_game_score, &mut rng)?);
                    target.push(&target_sim.play_game(self.target_game_score, &mut rng)?);
                }
                (fixed.finish(fixed_count), target.finish(target_score))
            }
            Execution::Parallel => (
                self.run_parallel(&fixed_sim, 0)?,
                self.run_parallel(&target_sim, 1)?,
            ),
        };

        let test = WelchTest::new(&target.turns, &fixed.turns)?;
        let verdict = test.verdict(self.alpha);
        info!(
            fixed_mean = ?fixed.mean(),
            target_mean = ?target.mean(),
            t = test.t,
            p_two_sided = test.p_two_sided,
            verdict = ?verdict,
            "compared strategies"
        );

        Ok(Comparison {
            fixed_count: fixed,
            target_score: target,
            test,
            alpha: self.alpha,
            verdict,
        })
    }

    /// Compares both strategies at their analytic break-even parameters.
    pub fn compare_break_even(&self, model: &OutcomeModel) -> Result<Comparison> {
        let predictor = Predictor::from(model);
        self.compare(
            model,
            Strategy::break_even_fixed_count(&predictor),
            Strategy::break_even_target_score(&predictor),
        )
    }

    fn simulator<'a>(&self, model: &'a OutcomeModel, strategy: Strategy) -> Simulator<'a> {
        Simulator::new(model, strategy)
            .max_turn_rolls(self.max_turn_rolls)
            .max_game_turns(self.max_game_turns)
            .build()
    }

    fn run_parallel(&self, sim: &Simulator<'_>, slot: u64) -> Result<Batch> {
        let games = (0..self.games)
            .into_par_iter()
            .map(|i| {
                let mut rng = self.game_rng(slot, i as u64);
                sim.play_game(self.target_game_score, &mut rng)
            })
            .collect::<Result<Vec<Game>>>()?;

        let mut tally = Tally::with_capacity(games.len());
        games.iter().for_each(|g| tally.push(g));
        Ok(tally.finish(sim.strategy()))
    }

    fn game_rng(&self, slot: u64, game: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream((slot << 32) | game);
        rng
    }
}

impl Batch {
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.turns.is_empty() {
            return None;
        }
        let sum: f64 = self.turns.iter().map(|&t| f64::from(t)).sum();
        Some(sum / self.turns.len() as f64)
    }

    pub fn summary(&self) -> Result<Summary> {
        Summary::new(&self.turns)
    }
}

impl Tally {
    fn with_capacity(games: usize) -> Self {
        Self {
            turns: Vec::with_capacity(games),
            ..Self::default()
        }
    }

    fn push(&mut self, game: &Game) {
        self.turns.push(game.turns);
        self.turn_count += u64::from(game.turns);
        self.score_sum += game.turn_scores.iter().sum::<f64>();
        self.roll_sum += game.turn_rolls.iter().map(|&r| u64::from(r)).sum::<u64>();
    }

    fn finish(self, strategy: Strategy) -> Batch {
        let n = self.turn_count.max(1) as f64;
        Batch {
            strategy,
            turns: self.turns,
            turn_score_mean: self.score_sum / n,
            turn_rolls_mean: self.roll_sum as f64 / n,
        }
    }
}
