pub mod defs;
pub mod monte_carlo;
mod orientation;
mod outcome;
pub mod sim;
pub mod stats;
mod strategy;

pub use monte_carlo::{Batch, Comparison, Execution, MonteCarlo};
pub use orientation::{Orientation, PigTable};
pub use outcome::{Aggregates, OutcomeModel, Roll};
pub use strategy::{Predictor, Strategy};
use thiserror::Error;

pub type Result<T> = ::core::result::Result<T, Error>;

const TOLERANCE: f64 = 1e-9;
const SIDER_POINTS: f64 = 0.25;
const COMBO_MULTIPLIER: f64 = 2.0;
const MAX_TURN_ROLLS: u32 = 10_000;
const MAX_GAME_TURNS: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("probability of {orientation:?} is negative: {probability}")]
    NegativeProbability {
        orientation: Orientation,
        probability: f64,
    },
    #[error("value for {orientation:?} is not finite")]
    NonFiniteValue { orientation: Orientation },
    #[error("combo multiplier must be finite and non-negative, got {multiplier}")]
    InvalidMultiplier { multiplier: f64 },
    #[error("orientation probabilities sum to {sum}, expected 1")]
    ProbabilitySum { sum: f64 },
    #[error("outcome table covers {covered} of the probability mass, expected 1")]
    Coverage { covered: f64 },
    #[error("draw {draw} falls outside the outcome table (covered {covered})")]
    Uncovered { draw: f64, covered: f64 },
    #[error("turn did not end after {limit} rolls (score {score})")]
    TurnLimit { limit: u32, score: f64 },
    #[error("game did not reach its target after {limit} turns (score {score})")]
    GameLimit { limit: u32, score: f64 },
    #[error("t-test needs at least 2 observations per sample, got {len}")]
    InsufficientSample { len: usize },
    #[error("t-test undefined: both samples have zero variance")]
    ZeroVariance,
    #[error("student t distribution: {0}")]
    Distribution(String),
}
