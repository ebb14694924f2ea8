use log::{debug, warn};

use crate::{ConfigError, Error, InvalidDistribution, NormalizedPdf};

/// Minimum number of points in a discrete CDF.
pub const MIN_NUMPOINTS: usize = 2;

/// Smallest share of `[0, 1)` the CDF must bracket.
///
/// A uniform draw is inverted only when it lies in `[F_0, F_last]`, so this
/// bounds the expected number of redraws per sample by its reciprocal.
pub const MIN_BRACKETED_MASS: f64 = 1e-3;

/// Piecewise approximation of a cumulative distribution function.
///
/// Point `i` is `(x_i, F_i)` with `x_i = xmin + i·dx`, `dx = (xmax - xmin) / numpoints`,
/// and `F_i` the left Riemann sum of the normalized density up to and including
/// the rectangle starting at `x_i`. The `F_i` are non-decreasing; the last one
/// approximates 1 up to the discretization error of the Riemann sum, which is
/// left uncorrected.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteCdf {
    xs: Vec<f64>,
    ys: Vec<f64>,
    dx: f64,
}

/// Which end of the discrete CDF a uniform draw fell past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum OutOfRangeSide {
    /// The draw is smaller than the first CDF value.
    #[display("below")]
    Below,
    /// The draw is larger than the last CDF value.
    #[display("above")]
    Above,
}

/// A uniform draw cannot be bracketed by the discrete CDF.
///
/// Recoverable: the caller decides whether to redraw or clamp.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display("uniform draw {u} is {side} the discrete CDF range")]
pub struct SampleOutOfRange {
    pub u: f64,
    pub side: OutOfRangeSide,
}

impl DiscreteCdf {
    /// Builds the CDF by left Riemann summation over `numpoints` rectangles.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::TooFewPoints`] when `numpoints` is less than
    ///   [`MIN_NUMPOINTS`].
    /// - [`InvalidDistribution::EmptyDiscretization`] when the density is zero
    ///   at every grid point.
    /// - [`InvalidDistribution::SparseDiscretization`] when less than
    ///   [`MIN_BRACKETED_MASS`] of `[0, 1)` lies in `[F_0, F_last]`. This
    ///   happens on coarse grids, e.g. when a density peaking at `xmin` pushes
    ///   `F_0` to 1 or beyond.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::{DiscreteCdf, Domain, NormalizedPdf, Pdf};
    ///
    /// let pdf = Pdf::new("uniform", Domain::new(0.0, 10.0).unwrap(), |_| 1.0);
    /// let cdf = DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), 10).unwrap();
    /// assert_eq!(cdf.len(), 10);
    /// assert!((cdf.y_at(0) - 0.1).abs() < 1e-12);
    /// assert!((cdf.total() - 1.0).abs() < 1e-12);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn new(pdf: &NormalizedPdf, numpoints: usize) -> Result<Self, Error> {
        if numpoints < MIN_NUMPOINTS {
            return Err(ConfigError::TooFewPoints { numpoints }.into());
        }

        let domain = pdf.domain();
        let dx = domain.width() / numpoints as f64;
        let mut xs = Vec::with_capacity(numpoints);
        let mut ys = Vec::with_capacity(numpoints);
        let mut area = 0.0;
        for i in 0..numpoints {
            // computed from the index so x does not drift over many steps
            let x = domain.xmin() + i as f64 * dx;
            area += pdf.eval(x) * dx;
            xs.push(x);
            ys.push(area);
        }

        if area <= 0.0 {
            return Err(InvalidDistribution::EmptyDiscretization.into());
        }
        let mass = area.min(1.0) - ys[0];
        if mass.is_nan() || mass < MIN_BRACKETED_MASS {
            return Err(InvalidDistribution::SparseDiscretization {
                mass: mass.max(0.0),
            }
            .into());
        }

        // Riemann error is O(dx) for a smooth density; flag anything far beyond it.
        let deviation = (area - 1.0).abs();
        if deviation > (10.0 * dx / domain.width()).max(1e-3) {
            warn!("discrete CDF ends at {area}, {deviation:.3e} away from 1; consider more points");
        } else {
            debug!("discrete CDF built with {numpoints} points, total = {area}");
        }

        Ok(Self { xs, ys, dx })
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always `false`: a CDF has at least [`MIN_NUMPOINTS`] points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Width of one Riemann rectangle.
    #[must_use]
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// The last cumulative value, approximately 1.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.ys[self.ys.len() - 1]
    }

    #[must_use]
    pub fn x_at(&self, index: usize) -> f64 {
        self.xs[index]
    }

    #[must_use]
    pub fn y_at(&self, index: usize) -> f64 {
        self.ys[index]
    }

    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Iterates over `(x, F)` pairs in ascending order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Maps a uniform draw `u` to an x value.
    ///
    /// Finds the earliest index `k` with `F_k <= u <= F_{k+1}` by binary search
    /// and returns `x_k`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::{DiscreteCdf, Domain, NormalizedPdf, OutOfRangeSide, Pdf};
    ///
    /// let pdf = Pdf::new("uniform", Domain::new(0.0, 4.0).unwrap(), |_| 1.0);
    /// let cdf = DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), 4).unwrap();
    /// // F = [0.25, 0.5, 0.75, 1.0]
    /// assert_eq!(cdf.invert(0.3).unwrap(), 0.0);
    /// assert_eq!(cdf.invert(0.5).unwrap(), 0.0);
    /// assert_eq!(cdf.invert(0.6).unwrap(), 1.0);
    /// assert_eq!(cdf.invert(0.1).unwrap_err().side, OutOfRangeSide::Below);
    /// ```
    pub fn invert(&self, u: f64) -> Result<f64, SampleOutOfRange> {
        // first index whose F is not below u
        let upper = self.ys.partition_point(|&y| y < u);
        if upper == self.ys.len() || u.is_nan() {
            return Err(SampleOutOfRange {
                u,
                side: OutOfRangeSide::Above,
            });
        }
        if upper == 0 {
            // F_0 >= u: only a bracket at k = 0 when u sits exactly on F_0
            if u < self.ys[0] {
                return Err(SampleOutOfRange {
                    u,
                    side: OutOfRangeSide::Below,
                });
            }
            return Ok(self.xs[0]);
        }
        Ok(self.xs[upper - 1])
    }

    /// Reference linear scan used to cross-check [`Self::invert`].
    #[cfg(test)]
    fn invert_linear(&self, u: f64) -> Option<f64> {
        (0..self.len() - 1)
            .find(|&k| self.ys[k] <= u && u <= self.ys[k + 1])
            .map(|k| self.xs[k])
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;
    use test_log::test;

    use super::*;
    use crate::{Domain, Pdf, PdfPreset, PdfSpec};

    fn normalized(preset: PdfPreset) -> NormalizedPdf {
        let pdf = PdfSpec::Preset(preset)
            .build(Domain::new(0.0, 10.0).unwrap())
            .unwrap();
        NormalizedPdf::new(pdf).unwrap()
    }

    #[test]
    fn test_monotone_and_close_to_one() {
        for preset in PdfPreset::ALL {
            let cdf = DiscreteCdf::new(&normalized(preset), 1000).unwrap();
            assert_eq!(cdf.len(), 1000);
            assert!(cdf.ys().is_sorted_by(|a, b| a <= b), "{preset}");
            // O(1/numpoints) from 1
            assert!((cdf.total() - 1.0).abs() < 1e-2, "{preset}: {}", cdf.total());
        }
    }

    #[test]
    fn test_xs_strictly_increasing_from_xmin() {
        let cdf = DiscreteCdf::new(&normalized(PdfPreset::Normal), 500).unwrap();
        assert_eq!(cdf.x_at(0), 0.0);
        assert!((cdf.dx() - 0.02).abs() < 1e-15);
        assert!(cdf.xs().is_sorted_by(|a, b| a < b));
        assert!(cdf.x_at(cdf.len() - 1) < 10.0);
    }

    #[test]
    fn test_parabolic_left_riemann_undershoot() {
        // sum_{i<1000} (i/100)² / 100 · 3/1000 = 0.9985005
        let cdf = DiscreteCdf::new(&normalized(PdfPreset::Parabolic), 1000).unwrap();
        assert!((cdf.total() - 0.998_500_5).abs() < 1e-6);
        assert!(cdf.invert(0.999).is_err());
    }

    #[test]
    fn test_invert_matches_linear_scan() {
        let cdf = DiscreteCdf::new(&normalized(PdfPreset::Lopsided), 1000).unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..10_000 {
            let u: f64 = rng.random();
            assert_eq!(cdf.invert(u).ok(), cdf.invert_linear(u), "u = {u}");
        }
    }

    #[test]
    fn test_invert_ties_pick_earliest_bracket() {
        // zero density on the middle of the domain gives a flat stretch of F
        let pdf = Pdf::new("gap", Domain::new(0.0, 4.0).unwrap(), |x| {
            if (1.0..3.0).contains(&x) { 0.0 } else { 1.0 }
        });
        let cdf = DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), 4).unwrap();
        let plateau = cdf.y_at(0);
        assert!((plateau - 0.5).abs() < 1e-9);
        assert_eq!(cdf.y_at(1), plateau);
        assert_eq!(cdf.y_at(2), plateau);
        assert_eq!(cdf.invert(plateau).unwrap(), 0.0);
        assert_eq!(cdf.invert(plateau).ok(), cdf.invert_linear(plateau));
        assert_eq!(cdf.invert(0.7).unwrap(), 2.0);
    }

    #[test]
    fn test_invert_out_of_range() {
        let cdf = DiscreteCdf::new(&normalized(PdfPreset::Uniform), 10).unwrap();
        let below = cdf.invert(0.05).unwrap_err();
        assert_eq!(below.side, OutOfRangeSide::Below);
        assert_eq!(below.u, 0.05);
        let above = cdf.invert(1.5).unwrap_err();
        assert_eq!(above.side, OutOfRangeSide::Above);
        assert_eq!(cdf.invert_linear(0.05), None);
    }

    #[test]
    fn test_empty_discretization() {
        // density lives strictly between grid points
        let pdf = Pdf::new("spike", Domain::new(0.0, 2.0).unwrap(), |x| {
            if (0.4..0.6).contains(&x) { 1.0 } else { 0.0 }
        });
        let normalized = NormalizedPdf::new(pdf).unwrap();
        assert_eq!(
            DiscreteCdf::new(&normalized, 2).unwrap_err(),
            Error::InvalidDistribution(InvalidDistribution::EmptyDiscretization)
        );
    }

    #[test]
    fn test_too_few_points() {
        assert_eq!(
            DiscreteCdf::new(&normalized(PdfPreset::Uniform), 1).unwrap_err(),
            Error::Config(ConfigError::TooFewPoints { numpoints: 1 })
        );
        assert!(DiscreteCdf::new(&normalized(PdfPreset::Uniform), MIN_NUMPOINTS).is_ok());
    }

    fn parabolic_on_negative_axis() -> NormalizedPdf {
        let pdf = PdfSpec::Preset(PdfPreset::Parabolic)
            .build(Domain::new(-10.0, 0.0).unwrap())
            .unwrap();
        NormalizedPdf::new(pdf).unwrap()
    }

    #[test]
    fn test_first_value_at_or_above_one_rejected() {
        // the density peaks at xmin, so the first rectangle alone holds F_0 >= 1:
        // numpoints = 2 gives F = [1.5, 1.875], numpoints = 3 gives F_0 = 1
        for numpoints in [2, 3] {
            let err = DiscreteCdf::new(&parabolic_on_negative_axis(), numpoints).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::InvalidDistribution(InvalidDistribution::SparseDiscretization { mass })
                        if mass < MIN_BRACKETED_MASS
                ),
                "numpoints = {numpoints}: {err}"
            );
        }
        let cdf = DiscreteCdf::new(&parabolic_on_negative_axis(), 1000).unwrap();
        assert!(cdf.y_at(0) < 0.01);
    }

    #[test]
    fn test_tiny_total_rejected() {
        // narrow bump between the two grid points: F_last is about 3e-5
        let pdf = Pdf::new("bump", Domain::new(0.0, 10.0).unwrap(), |x: f64| {
            (-(x - 2.5).powi(2) / 0.5).exp()
        });
        let err = DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), 2).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidDistribution(InvalidDistribution::SparseDiscretization { .. })
        ));
    }
}
