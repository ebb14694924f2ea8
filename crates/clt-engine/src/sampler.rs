use std::ops::AddAssign;

use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{DiscreteCdf, OutOfRangeSide, SampleOutOfRange};

/// What to do with a uniform draw the discrete CDF cannot bracket.
///
/// Such draws happen because the left Riemann sum leaves the last CDF value
/// slightly below 1 (and the first one above 0).
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::FromStr,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangePolicy {
    /// Discard the draw and draw again from the same stream, so every batch
    /// has exactly the requested number of samples.
    #[default]
    #[display("redraw")]
    Redraw,
    /// Map the draw to the nearest end of the CDF (first or last x).
    #[display("clamp")]
    Clamp,
}

/// Tally of out-of-range draws, by side.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfRangeCounts {
    pub below: u64,
    pub above: u64,
}

impl OutOfRangeCounts {
    fn record(&mut self, side: OutOfRangeSide) {
        match side {
            OutOfRangeSide::Below => self.below += 1,
            OutOfRangeSide::Above => self.above += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.below + self.above
    }
}

impl AddAssign for OutOfRangeCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.below += rhs.below;
        self.above += rhs.above;
    }
}

/// Discrete inverse transform sampler over a [`DiscreteCdf`].
#[derive(Debug, Clone, Copy)]
pub struct InverseSampler<'a> {
    cdf: &'a DiscreteCdf,
    policy: OutOfRangePolicy,
}

impl<'a> InverseSampler<'a> {
    #[must_use]
    pub fn new(cdf: &'a DiscreteCdf, policy: OutOfRangePolicy) -> Self {
        Self { cdf, policy }
    }

    #[must_use]
    pub fn cdf(&self) -> &'a DiscreteCdf {
        self.cdf
    }

    #[must_use]
    pub fn policy(&self) -> OutOfRangePolicy {
        self.policy
    }

    /// Draws one sample, recording every out-of-range draw in `counts`.
    ///
    /// Uniform values are taken from `rng` in `[0, 1)`. Under
    /// [`OutOfRangePolicy::Redraw`] this loops until a draw is bracketed. A
    /// [`DiscreteCdf`] brackets at least
    /// [`MIN_BRACKETED_MASS`](crate::MIN_BRACKETED_MASS) of `[0, 1)`, so a
    /// sample takes at most `1 / MIN_BRACKETED_MASS` draws on average.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::{
    ///     DiscreteCdf, Domain, InverseSampler, NormalizedPdf, OutOfRangeCounts, OutOfRangePolicy, Pdf,
    /// };
    /// use rand::SeedableRng as _;
    ///
    /// let pdf = Pdf::new("uniform", Domain::new(0.0, 10.0).unwrap(), |_| 1.0);
    /// let cdf = DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), 100).unwrap();
    /// let sampler = InverseSampler::new(&cdf, OutOfRangePolicy::Redraw);
    ///
    /// let mut rng = rand_pcg::Pcg32::seed_from_u64(1234);
    /// let mut counts = OutOfRangeCounts::default();
    /// let x = sampler.sample(&mut rng, &mut counts);
    /// assert!((0.0..10.0).contains(&x));
    /// ```
    pub fn sample<R>(&self, rng: &mut R, counts: &mut OutOfRangeCounts) -> f64
    where
        R: Rng + ?Sized,
    {
        loop {
            let u = rng.random::<f64>();
            match self.cdf.invert(u) {
                Ok(x) => return x,
                Err(SampleOutOfRange { u, side }) => {
                    counts.record(side);
                    trace!("uniform draw {u} is {side} the CDF range ({})", self.policy);
                    match (self.policy, side) {
                        (OutOfRangePolicy::Redraw, _) => {}
                        (OutOfRangePolicy::Clamp, OutOfRangeSide::Below) => {
                            return self.cdf.x_at(0);
                        }
                        (OutOfRangePolicy::Clamp, OutOfRangeSide::Above) => {
                            return self.cdf.x_at(self.cdf.len() - 1);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{RngCore, SeedableRng as _};
    use rand_pcg::Pcg32;
    use test_log::test;

    use super::*;
    use crate::{Domain, NormalizedPdf, PdfPreset, PdfSpec};

    /// Yields the same 64 random bits forever.
    struct ConstRng(u64);

    impl RngCore for ConstRng {
        #[expect(clippy::cast_possible_truncation)]
        fn next_u32(&mut self) -> u32 {
            (self.0 >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    fn parabolic_cdf() -> DiscreteCdf {
        let pdf = PdfSpec::Preset(PdfPreset::Parabolic)
            .build(Domain::new(0.0, 10.0).unwrap())
            .unwrap();
        DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), 1000).unwrap()
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "redraw".parse::<OutOfRangePolicy>().unwrap(),
            OutOfRangePolicy::Redraw
        );
        assert_eq!(
            "Clamp".parse::<OutOfRangePolicy>().unwrap(),
            OutOfRangePolicy::Clamp
        );
        assert_eq!(OutOfRangePolicy::Clamp.to_string(), "clamp");
    }

    #[test]
    fn test_redraw_never_returns_out_of_range_and_counts() {
        let cdf = parabolic_cdf();
        let sampler = InverseSampler::new(&cdf, OutOfRangePolicy::Redraw);
        let mut rng = Pcg32::seed_from_u64(1234);
        let mut counts = OutOfRangeCounts::default();
        for _ in 0..100_000 {
            let x = sampler.sample(&mut rng, &mut counts);
            assert!((0.0..10.0).contains(&x));
        }
        // about 0.15% of draws exceed F_last = 0.9985
        assert!(counts.above > 50 && counts.above < 300, "{counts:?}");
    }

    #[test]
    fn test_clamp_maps_to_last_point() {
        let cdf = parabolic_cdf();
        let sampler = InverseSampler::new(&cdf, OutOfRangePolicy::Clamp);
        // all bits set gives u just below 1
        let mut rng = ConstRng(u64::MAX);
        let mut counts = OutOfRangeCounts::default();
        let x = sampler.sample(&mut rng, &mut counts);
        assert_eq!(x, cdf.x_at(cdf.len() - 1));
        assert_eq!(counts, OutOfRangeCounts { below: 0, above: 1 });
    }

    #[test]
    fn test_clamp_maps_to_first_point() {
        let pdf = PdfSpec::Preset(PdfPreset::Uniform)
            .build(Domain::new(0.0, 10.0).unwrap())
            .unwrap();
        let cdf = DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), 10).unwrap();
        let sampler = InverseSampler::new(&cdf, OutOfRangePolicy::Clamp);
        // u = 0 lies below F_0 = 0.1
        let mut rng = ConstRng(0);
        let mut counts = OutOfRangeCounts::default();
        assert_eq!(sampler.sample(&mut rng, &mut counts), 0.0);
        assert_eq!(counts.below, 1);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn test_counts_add_assign() {
        let mut counts = OutOfRangeCounts { below: 1, above: 2 };
        counts += OutOfRangeCounts { below: 3, above: 4 };
        assert_eq!(counts, OutOfRangeCounts { below: 4, above: 6 });
    }
}
