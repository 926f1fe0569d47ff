use itertools::Itertools;
use rand::Rng;
use tracing::debug;

use crate::{Error, Orientation, PigTable, Result, TOLERANCE};

// The joint mass is the square of the per-pig mass, so its error doubles.
const COVERAGE_TOLERANCE: f64 = 4.0 * TOLERANCE;

/// One joint throw of both pigs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Roll {
    pub first: Orientation,
    pub second: Orientation,
    pub probability: f64,
    pub points: f64,
}

/// Scalar summary of the outcome distribution consumed by the predictors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aggregates {
    pub p_bust: f64,
    pub p_survive: f64,
    pub e_roll: f64,
    pub e_roll_given_survive: f64,
}

/// Every ordered pair of orientations with its joint probability and
/// score, plus the cumulative table used for sampling.
#[derive(Clone, Debug)]
pub struct OutcomeModel {
    table: PigTable,
    rolls: Vec<Roll>,
    cumulative: Vec<f64>,
    aggregates: Aggregates,
}

impl Roll {
    #[must_use]
    pub fn new(table: &PigTable, first: Orientation, second: Orientation) -> Self {
        Self {
            first,
            second,
            probability: table.probability(first) * table.probability(second),
            points: score(table, first, second),
        }
    }

    /// Two different sides, the pig-out. This is the mass counted in
    /// `p_bust`; the simulator busts on any zero-point roll.
    #[must_use]
    pub fn is_bust(&self) -> bool {
        self.first.is_side() && self.second.is_side() && self.first != self.second
    }
}

/// Points for one joint throw. The first matching case wins.
#[must_use]
pub fn score(table: &PigTable, first: Orientation, second: Orientation) -> f64 {
    let combo = table.combo_multiplier();
    match (first.is_side(), second.is_side()) {
        (true, true) if first == second => (table.sider() + table.sider()) * combo,
        (true, true) => 0.0,
        (true, false) => table.points(second),
        (false, true) => table.points(first),
        (false, false) if first == second => {
            (table.points(first) + table.points(second)) * combo
        }
        (false, false) => table.points(first) + table.points(second),
    }
}

/// The cumulative table must end at one. A validated table always passes;
/// this guards the enumeration itself.
fn check_coverage(cumulative: &[f64]) -> Result<()> {
    let covered = cumulative.last().copied().unwrap_or(0.0);
    if (covered - 1.0).abs() > COVERAGE_TOLERANCE {
        return Err(Error::Coverage { covered });
    }
    Ok(())
}

impl OutcomeModel {
    pub fn new(table: PigTable) -> Result<Self> {
        table.validate()?;

        let rolls = Orientation::ALL
            .into_iter()
            .cartesian_product(Orientation::ALL)
            .map(|(first, second)| Roll::new(&table, first, second))
            .collect_vec();

        let cumulative = rolls
            .iter()
            .scan(0.0, |acc, r| {
                *acc += r.probability;
                Some(*acc)
            })
            .collect_vec();

        check_coverage(&cumulative)?;

        let p_bust = 2.0
            * table.probability(Orientation::SideUp)
            * table.probability(Orientation::SideDown);
        let p_survive = 1.0 - p_bust;
        let e_roll = rolls.iter().map(|r| r.points * r.probability).sum::<f64>();
        let aggregates = Aggregates {
            p_bust,
            p_survive,
            e_roll,
            e_roll_given_survive: e_roll / p_survive,
        };

        debug!(
            p_bust,
            e_roll,
            e_roll_given_survive = aggregates.e_roll_given_survive,
            "built outcome model"
        );

        Ok(Self {
            table,
            rolls,
            cumulative,
            aggregates,
        })
    }

    #[must_use]
    pub fn table(&self) -> &PigTable {
        &self.table
    }

    #[must_use]
    pub fn rolls(&self) -> &[Roll] {
        &self.rolls
    }

    #[must_use]
    pub fn scores(&self) -> Vec<f64> {
        self.rolls.iter().map(|r| r.points).collect()
    }

    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        self.rolls.iter().map(|r| r.probability).collect()
    }

    #[must_use]
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    #[must_use]
    pub fn aggregates(&self) -> Aggregates {
        self.aggregates
    }

    #[must_use]
    pub fn p_bust(&self) -> f64 {
        self.aggregates.p_bust
    }

    #[must_use]
    pub fn p_survive(&self) -> f64 {
        self.aggregates.p_survive
    }

    #[must_use]
    pub fn e_roll(&self) -> f64 {
        self.aggregates.e_roll
    }

    #[must_use]
    pub fn e_roll_given_survive(&self) -> f64 {
        self.aggregates.e_roll_given_survive
    }

    #[must_use]
    pub fn variance(&self) -> f64 {
        let m = self.e_roll();
        self.rolls
            .iter()
            .map(|r| (r.points - m).powi(2) * r.probability)
            .sum()
    }

    #[must_use]
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Inverse-CDF lookup: the first roll whose cumulative probability
    /// strictly exceeds `draw`.
    pub fn roll_at(&self, draw: f64) -> Result<&Roll> {
        let i = self.cumulative.partition_point(|&c| c <= draw);
        self.rolls.get(i).ok_or_else(|| Error::Uncovered {
            draw,
            covered: self.cumulative.last().copied().unwrap_or(0.0),
        })
    }

    pub fn sample_rng<G>(&self, rng: &mut G) -> Result<&Roll>
    where
        G: Rng + ?Sized,
    {
        self.roll_at(rng.gen::<f64>())
    }
}
