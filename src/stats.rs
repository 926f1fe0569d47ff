//! Sample summaries and Welch's unequal-variance t-test.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::{Error, Result};

/// Mean and unbiased variance of one sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub len: usize,
    pub mean: f64,
    pub variance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WelchTest {
    pub t: f64,
    pub df: f64,
    pub p_two_sided: f64,
    /// Half the two-sided value; meaningful only when `t` already points
    /// in the hypothesised direction.
    pub p_one_sided: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The first sample's mean is significantly smaller.
    FirstFewer,
    NoConclusion,
}

impl Summary {
    pub fn new<T>(values: &[T]) -> Result<Self>
    where
        T: Copy + Into<f64>,
    {
        let len = values.len();
        if len < 2 {
            return Err(Error::InsufficientSample { len });
        }
        let n = len as f64;
        let mean = values.iter().map(|&x| x.into()).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|&x| (x.into() - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        Ok(Self {
            len,
            mean,
            variance,
        })
    }

    #[must_use]
    pub fn stddev(&self) -> f64 {
        self.variance.sqrt()
    }

    #[must_use]
    pub fn std_error(&self) -> f64 {
        (self.variance / self.len as f64).sqrt()
    }
}

impl WelchTest {
    /// Two-sided test of `mean(first) == mean(second)`. A negative `t`
    /// means the first sample has the smaller mean.
    pub fn new<T>(first: &[T], second: &[T]) -> Result<Self>
    where
        T: Copy + Into<f64>,
    {
        Self::from_summaries(&Summary::new(first)?, &Summary::new(second)?)
    }

    pub fn from_summaries(first: &Summary, second: &Summary) -> Result<Self> {
        let v1 = first.variance / first.len as f64;
        let v2 = second.variance / second.len as f64;
        let se2 = v1 + v2;
        if se2 <= 0.0 || !se2.is_finite() {
            return Err(Error::ZeroVariance);
        }

        let t = (first.mean - second.mean) / se2.sqrt();
        let df = se2.powi(2)
            / (v1.powi(2) / (first.len - 1) as f64 + v2.powi(2) / (second.len - 1) as f64);

        let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| Error::Distribution(e.to_string()))?;
        let p_two_sided = (2.0 * dist.sf(t.abs())).min(1.0);

        Ok(Self {
            t,
            df,
            p_two_sided,
            p_one_sided: p_two_sided / 2.0,
        })
    }

    #[must_use]
    pub fn verdict(&self, alpha: f64) -> Verdict {
        Verdict::decide(self.t, self.p_one_sided, alpha)
    }
}

impl Verdict {
    /// Significant only when the sign of `t` agrees with the claim.
    #[must_use]
    pub fn decide(t: f64, p_one_sided: f64, alpha: f64) -> Self {
        if t < 0.0 && p_one_sided < alpha {
            Verdict::FirstFewer
        } else {
            Verdict::NoConclusion
        }
    }
}
