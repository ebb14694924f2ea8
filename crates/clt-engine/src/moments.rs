use log::debug;

use crate::NormalizedPdf;

/// Relative size of a negative variance that is treated as rounding noise.
const VARIANCE_TOLERANCE: f64 = 1e-9;

/// The moments disagree: `E[X²] - E[X]²` is clearly negative.
///
/// A valid density never produces this; it points at an integration failure.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display("E[X^2] - E[X]^2 = {variance} is negative")]
pub struct NegativeVariance {
    pub variance: f64,
}

/// First and second moments of a normalized density, and the batch-mean
/// statistics they predict through the Central Limit Theorem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentEstimates {
    first: f64,
    second: f64,
    variance: f64,
    num_iterations: usize,
}

impl MomentEstimates {
    /// Integrates `x·pdf(x)` and `x²·pdf(x)` over the domain.
    ///
    /// `num_iterations` is the batch size whose means are being predicted.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::{Domain, MomentEstimates, NormalizedPdf, Pdf};
    ///
    /// let pdf = Pdf::new("uniform", Domain::new(0.0, 10.0).unwrap(), |_| 1.0);
    /// let moments = MomentEstimates::compute(&NormalizedPdf::new(pdf).unwrap(), 100).unwrap();
    /// assert!((moments.mean() - 5.0).abs() < 1e-9);
    /// assert!((moments.variance() - 100.0 / 12.0).abs() < 1e-9);
    /// assert!((moments.predicted_std_dev() - 0.288_675).abs() < 1e-6);
    /// ```
    pub fn compute(pdf: &NormalizedPdf, num_iterations: usize) -> Result<Self, NegativeVariance> {
        let first = pdf.expectation(|x| x);
        let second = pdf.expectation(|x| x * x);
        Self::from_moments(first, second, num_iterations)
    }

    /// Builds estimates from already known `E[X]` and `E[X²]`.
    ///
    /// A negative variance within rounding noise of zero is clamped to zero.
    pub fn from_moments(
        first: f64,
        second: f64,
        num_iterations: usize,
    ) -> Result<Self, NegativeVariance> {
        let mut variance = second - first * first;
        if variance < 0.0 {
            if -variance > VARIANCE_TOLERANCE * second.abs().max(1.0) {
                return Err(NegativeVariance { variance });
            }
            variance = 0.0;
        }
        debug!("moments: E[X] = {first}, E[X^2] = {second}, Var[X] = {variance}");
        Ok(Self {
            first,
            second,
            variance,
            num_iterations,
        })
    }

    /// `E[X]`, which is also the predicted mean of the batch means.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.first
    }

    /// `E[X²]`.
    #[must_use]
    pub fn second_moment(&self) -> f64 {
        self.second
    }

    /// `E[X²] - E[X]²`.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Standard deviation of a single sample.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    #[must_use]
    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    /// Predicted standard deviation of the batch means: `sqrt(Var[X] / n)`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn predicted_std_dev(&self) -> f64 {
        (self.variance / self.num_iterations as f64).sqrt()
    }
}
