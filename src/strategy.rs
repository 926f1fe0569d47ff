use crate::sim::TurnState;
use crate::{Aggregates, OutcomeModel};

/// Closed-form turn expectations for both stopping rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Predictor {
    aggregates: Aggregates,
}

/// When a player stops rolling during a turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// Roll exactly this many times unless the turn busts first.
    FixedCount(u32),
    /// Roll until the turn score reaches this value.
    TargetScore(f64),
}

impl Predictor {
    #[must_use]
    pub fn new(aggregates: Aggregates) -> Self {
        Self { aggregates }
    }

    /// Expected turn score when rolling `n` times. Only the path that
    /// survives every roll contributes.
    #[must_use]
    pub fn fixed_count(&self, n: u32) -> f64 {
        let a = self.aggregates;
        a.e_roll_given_survive * f64::from(n) * a.p_survive.powf(f64::from(n))
    }

    #[must_use]
    pub fn break_even_rolls(&self) -> f64 {
        self.aggregates.p_survive / self.aggregates.p_bust
    }

    #[must_use]
    pub fn break_even_score(&self) -> f64 {
        self.break_even_rolls() * self.aggregates.e_roll_given_survive
    }

    /// Expected turn score after one more roll from `current`.
    #[must_use]
    pub fn target_score(&self, current: f64) -> f64 {
        (current + self.aggregates.e_roll_given_survive) * self.aggregates.p_survive
    }

    #[must_use]
    pub fn break_even_target(&self) -> f64 {
        let a = self.aggregates;
        a.e_roll_given_survive * a.p_survive / a.p_bust
    }

    #[must_use]
    pub fn expected_rolls(&self) -> f64 {
        self.break_even_target() / self.aggregates.e_roll_given_survive
    }

    #[must_use]
    pub fn fixed_count_curve(&self, max_rolls: u32) -> Vec<f64> {
        (0..=max_rolls).map(|n| self.fixed_count(n)).collect()
    }

    #[must_use]
    pub fn target_score_curve(&self, max_score: u32) -> Vec<f64> {
        (0..=max_score)
            .map(|s| self.target_score(f64::from(s)))
            .collect()
    }

    /// Points accrued by `n` rolls if none of them bust.
    #[must_use]
    pub fn never_bust_curve(&self, max_rolls: u32) -> Vec<f64> {
        (0..=max_rolls)
            .map(|n| f64::from(n) * self.aggregates.e_roll_given_survive)
            .collect()
    }

    #[must_use]
    pub fn survival_curve(&self, max_rolls: u32) -> Vec<f64> {
        (0..=max_rolls)
            .map(|n| self.aggregates.p_survive.powf(f64::from(n)))
            .collect()
    }
}

impl From<&OutcomeModel> for Predictor {
    fn from(model: &OutcomeModel) -> Self {
        Self::new(model.aggregates())
    }
}

impl Strategy {
    /// The simulator keeps rolling while `rolls < budget`, so a fractional
    /// break-even count behaves as its ceiling.
    #[must_use]
    pub fn break_even_fixed_count(predictor: &Predictor) -> Self {
        Strategy::FixedCount(predictor.break_even_rolls().ceil() as u32)
    }

    #[must_use]
    pub fn break_even_target_score(predictor: &Predictor) -> Self {
        Strategy::TargetScore(predictor.break_even_target())
    }

    #[must_use]
    pub fn should_stop(&self, turn: &TurnState) -> bool {
        match *self {
            Strategy::FixedCount(budget) => turn.rolls >= budget,
            Strategy::TargetScore(target) => turn.score >= target,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FixedCount(_) => "fixed-count",
            Strategy::TargetScore(_) => "target-score",
        }
    }
}
