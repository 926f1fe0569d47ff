use bon::Builder;
use tracing::warn;

use crate::{Error, Result, COMBO_MULTIPLIER, SIDER_POINTS, TOLERANCE};

/// Resting position of a single pig after a throw.
///
/// The declaration order is the enumeration order of every outcome table
/// built from it, so sampling tables are reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Orientation {
    SideUp,
    SideDown,
    Trotter,
    Razorback,
    Snouter,
    LeaningJowler,
}

impl Orientation {
    pub const ALL: [Orientation; 6] = [
        Orientation::SideUp,
        Orientation::SideDown,
        Orientation::Trotter,
        Orientation::Razorback,
        Orientation::Snouter,
        Orientation::LeaningJowler,
    ];

    #[must_use]
    pub fn is_side(self) -> bool {
        matches!(self, Orientation::SideUp | Orientation::SideDown)
    }
}

/// Per-pig orientation probabilities and point values.
///
/// Built through [`PigTable::builder`]; `build` validates the table so a
/// malformed distribution never reaches the outcome model.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(finish_fn(name = "build_unchecked", vis = "pub(crate)"))]
pub struct PigTable {
    side_up: f64,
    side_down: f64,
    trotter: f64,
    razorback: f64,
    snouter: f64,
    leaning_jowler: f64,
    #[builder(default = 5.0)]
    trotter_points: f64,
    #[builder(default = 5.0)]
    razorback_points: f64,
    #[builder(default = 10.0)]
    snouter_points: f64,
    #[builder(default = 15.0)]
    leaning_jowler_points: f64,
    #[builder(default = SIDER_POINTS)]
    sider: f64,
    #[builder(default = COMBO_MULTIPLIER)]
    combo_multiplier: f64,
}

impl<S> PigTableBuilder<S>
where
    S: pig_table_builder::State,
    S: pig_table_builder::IsComplete,
{
    pub fn build(self) -> Result<PigTable> {
        let table = self.build_unchecked();
        table.validate()?;
        Ok(table)
    }
}

impl PigTable {
    #[must_use]
    pub fn probability(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::SideUp => self.side_up,
            Orientation::SideDown => self.side_down,
            Orientation::Trotter => self.trotter,
            Orientation::Razorback => self.razorback,
            Orientation::Snouter => self.snouter,
            Orientation::LeaningJowler => self.leaning_jowler,
        }
    }

    /// Points a single pig earns on its own. Both side orientations are
    /// worth the sider value.
    #[must_use]
    pub fn points(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::SideUp | Orientation::SideDown => self.sider,
            Orientation::Trotter => self.trotter_points,
            Orientation::Razorback => self.razorback_points,
            Orientation::Snouter => self.snouter_points,
            Orientation::LeaningJowler => self.leaning_jowler_points,
        }
    }

    #[must_use]
    pub fn sider(&self) -> f64 {
        self.sider
    }

    #[must_use]
    pub fn combo_multiplier(&self) -> f64 {
        self.combo_multiplier
    }

    pub fn validate(&self) -> Result<()> {
        for orientation in Orientation::ALL {
            let probability = self.probability(orientation);
            if !probability.is_finite() || !self.points(orientation).is_finite() {
                return Err(Error::NonFiniteValue { orientation });
            }
            if probability < 0.0 {
                return Err(Error::NegativeProbability {
                    orientation,
                    probability,
                });
            }
        }
        if !self.combo_multiplier.is_finite() || self.combo_multiplier < 0.0 {
            return Err(Error::InvalidMultiplier {
                multiplier: self.combo_multiplier,
            });
        }

        let sum: f64 = Orientation::ALL.iter().map(|&o| self.probability(o)).sum();
        if (sum - 1.0).abs() > TOLERANCE {
            warn!(sum, "rejecting orientation table");
            return Err(Error::ProbabilitySum { sum });
        }
        Ok(())
    }
}
