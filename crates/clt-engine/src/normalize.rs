use log::debug;

use crate::{Domain, InvalidDistribution, Pdf, quadrature};

/// Minimum number of grid intervals used to check a density for negative or
/// non-finite values.
pub const MIN_VALIDATION_INTERVALS: usize = 1000;

/// A density rescaled so that it integrates to 1 over its domain.
///
/// Construction validates that the density is finite and non-negative on a
/// grid over the whole domain and that its integral is positive. Once built,
/// the normalization constant never changes.
#[derive(Debug, Clone)]
pub struct NormalizedPdf {
    pdf: Pdf,
    integral: f64,
    norm_const: f64,
}

impl NormalizedPdf {
    /// Normalizes `pdf`, validating it on at least [`MIN_VALIDATION_INTERVALS`]
    /// grid intervals.
    pub fn new(pdf: Pdf) -> Result<Self, InvalidDistribution> {
        Self::with_validation_grid(pdf, MIN_VALIDATION_INTERVALS)
    }

    /// Like [`Self::new`], validating on `max(intervals, MIN_VALIDATION_INTERVALS)`
    /// grid intervals.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::{Domain, InvalidDistribution, NormalizedPdf, Pdf};
    ///
    /// let domain = Domain::new(0.0, 10.0).unwrap();
    ///
    /// let uniform = NormalizedPdf::new(Pdf::new("uniform", domain, |_| 2.0)).unwrap();
    /// assert!((uniform.eval(3.0) - 0.1).abs() < 1e-12);
    ///
    /// let negative = NormalizedPdf::new(Pdf::new("sine", domain, f64::sin));
    /// assert!(matches!(negative, Err(InvalidDistribution::NegativeDensity { .. })));
    /// ```
    pub fn with_validation_grid(pdf: Pdf, intervals: usize) -> Result<Self, InvalidDistribution> {
        let domain = pdf.domain();
        validate_density(&pdf, intervals.max(MIN_VALIDATION_INTERVALS))?;

        let integral = quadrature::integrate(|x| pdf.eval(x), domain.xmin(), domain.xmax());
        if !integral.is_finite() || integral <= 0.0 {
            return Err(InvalidDistribution::NonPositiveIntegral { integral });
        }
        let norm_const = 1.0 / integral;
        debug!(
            "normalized '{}' on [{}, {}]: integral = {integral}, constant = {norm_const}",
            pdf.label(),
            domain.xmin(),
            domain.xmax()
        );

        Ok(Self {
            pdf,
            integral,
            norm_const,
        })
    }

    /// Evaluates the normalized density at `x`.
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        self.norm_const * self.pdf.eval(x)
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.pdf.domain()
    }

    /// The underlying, unnormalized density.
    #[must_use]
    pub fn pdf(&self) -> &Pdf {
        &self.pdf
    }

    /// Integral of the unnormalized density over the domain.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The constant `c` such that `c · ∫pdf = 1`.
    #[must_use]
    pub fn norm_const(&self) -> f64 {
        self.norm_const
    }

    /// Integrates `weight(x) · pdf'(x)` over the domain.
    pub fn expectation<F>(&self, weight: F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let domain = self.domain();
        quadrature::integrate(
            |x| weight(x) * self.eval(x),
            domain.xmin(),
            domain.xmax(),
        )
    }
}

fn validate_density(pdf: &Pdf, intervals: usize) -> Result<(), InvalidDistribution> {
    for x in pdf.domain().grid(intervals) {
        let value = pdf.eval(x);
        if !value.is_finite() {
            return Err(InvalidDistribution::NonFiniteDensity { x });
        }
        if value < 0.0 {
            return Err(InvalidDistribution::NegativeDensity { x, value });
        }
    }
    Ok(())
}
