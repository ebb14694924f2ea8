//! Repeated batch sampling and the empirical distribution of batch means.
//!
//! # Random streams
//!
//! [`Execution::Sequential`] consumes one [`Pcg32`] stream seeded with the
//! configured seed, trial by trial and draw by draw, which is the reference
//! replay order.
//!
//! [`Execution::Parallel`] gives trial `i` its own stream seeded with
//! `seed + i` (wrapping), so trials can run on any thread in any order. Its
//! result depends on the seed only, never on the number of threads, but it
//! differs from the sequential result for the same seed.

use std::{ops::Range, panic, thread, time::Instant};

use clt_stats::{descriptive::DescriptiveStats, histogram::Histogram};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{ConfigError, InverseSampler, OutOfRangeCounts, OutOfRangePolicy};

/// How trials are scheduled.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// One shared random stream, trials in order.
    #[default]
    Sequential,
    /// Trials split across `threads` scoped threads, one random stream per trial.
    Parallel { threads: usize },
}

impl Execution {
    /// `Sequential` for a single thread, `Parallel` otherwise.
    #[must_use]
    pub fn from_threads(threads: usize) -> Self {
        if threads <= 1 {
            Self::Sequential
        } else {
            Self::Parallel { threads }
        }
    }
}

/// Runs `num_means` trials of `num_iterations` samples each.
#[derive(Debug, Clone)]
pub struct ExperimentRunner<'a> {
    sampler: InverseSampler<'a>,
    num_iterations: usize,
    num_means: usize,
    seed: u64,
    execution: Execution,
}

impl<'a> ExperimentRunner<'a> {
    /// Creates a runner.
    ///
    /// # Errors
    ///
    /// Fails when `num_iterations` or `num_means` is zero, or when a parallel
    /// execution asks for zero threads.
    pub fn new(
        sampler: InverseSampler<'a>,
        num_iterations: usize,
        num_means: usize,
        seed: u64,
        execution: Execution,
    ) -> Result<Self, ConfigError> {
        if num_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if num_means == 0 {
            return Err(ConfigError::NoMeans);
        }
        if execution == (Execution::Parallel { threads: 0 }) {
            return Err(ConfigError::NoThreads);
        }
        Ok(Self {
            sampler,
            num_iterations,
            num_means,
            seed,
            execution,
        })
    }

    /// Draws `num_iterations` samples and returns their arithmetic mean.
    #[expect(clippy::cast_precision_loss)]
    pub fn run_trial<R>(&self, rng: &mut R, counts: &mut OutOfRangeCounts) -> f64
    where
        R: Rng + ?Sized,
    {
        let sum = (0..self.num_iterations)
            .map(|_| self.sampler.sample(rng, counts))
            .sum::<f64>();
        sum / self.num_iterations as f64
    }

    /// Runs every trial and collects the batch means in trial order.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::{
    ///     DiscreteCdf, Domain, Execution, ExperimentRunner, InverseSampler, NormalizedPdf,
    ///     OutOfRangePolicy, Pdf,
    /// };
    ///
    /// let pdf = Pdf::new("uniform", Domain::new(0.0, 10.0).unwrap(), |_| 1.0);
    /// let cdf = DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), 1000).unwrap();
    /// let sampler = InverseSampler::new(&cdf, OutOfRangePolicy::Redraw);
    /// let runner = ExperimentRunner::new(sampler, 50, 100, 1234, Execution::Sequential).unwrap();
    ///
    /// let empirical = runner.run();
    /// assert_eq!(empirical.len(), 100);
    /// assert_eq!(empirical.means(), runner.run().means());
    /// ```
    #[must_use]
    pub fn run(&self) -> EmpiricalDistribution {
        let start = Instant::now();
        let (means, out_of_range) = match self.execution {
            Execution::Sequential => self.run_sequential(),
            Execution::Parallel { threads } => self.run_parallel(threads),
        };
        info!(
            "collected {} batch means of {} samples in {:.2?}",
            means.len(),
            self.num_iterations,
            start.elapsed()
        );
        if out_of_range.total() > 0 {
            let message = format!(
                "{} uniform draws fell outside the discrete CDF ({} below, {} above) and were handled by '{}'",
                out_of_range.total(),
                out_of_range.below,
                out_of_range.above,
                self.sampler.policy()
            );
            match self.sampler.policy() {
                OutOfRangePolicy::Redraw => info!("{message}"),
                OutOfRangePolicy::Clamp => warn!("{message}"),
            }
        }
        EmpiricalDistribution::new(means, self.num_iterations, out_of_range)
    }

    fn run_sequential(&self) -> (Vec<f64>, OutOfRangeCounts) {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut counts = OutOfRangeCounts::default();
        let means = (0..self.num_means)
            .map(|_| self.run_trial(&mut rng, &mut counts))
            .collect();
        (means, counts)
    }

    fn run_parallel(&self, threads: usize) -> (Vec<f64>, OutOfRangeCounts) {
        let mut means = vec![0.0; self.num_means];
        let chunk_size = self.num_means.div_ceil(threads);
        debug!(
            "running {} trials on up to {threads} threads ({chunk_size} trials each)",
            self.num_means
        );

        let counts = thread::scope(|s| {
            let handles = means
                .chunks_mut(chunk_size)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    let first_trial = chunk_idx * chunk_size;
                    s.spawn(move || {
                        let mut counts = OutOfRangeCounts::default();
                        for (offset, slot) in chunk.iter_mut().enumerate() {
                            let mut rng = trial_rng(self.seed, first_trial + offset);
                            *slot = self.run_trial(&mut rng, &mut counts);
                        }
                        counts
                    })
                })
                .collect::<Vec<_>>();

            let mut total = OutOfRangeCounts::default();
            for handle in handles {
                total += handle
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload));
            }
            total
        });

        (means, counts)
    }
}

/// The independent random stream of one trial in parallel execution.
fn trial_rng(seed: u64, trial: usize) -> Pcg32 {
    Pcg32::seed_from_u64(seed.wrapping_add(trial as u64))
}

/// The batch means produced by an experiment, in trial order.
#[derive(Debug, Clone)]
pub struct EmpiricalDistribution {
    means: Vec<f64>,
    num_iterations: usize,
    out_of_range: OutOfRangeCounts,
    stats: DescriptiveStats,
}

impl EmpiricalDistribution {
    fn new(means: Vec<f64>, num_iterations: usize, out_of_range: OutOfRangeCounts) -> Self {
        let stats = DescriptiveStats::new(means.iter().copied())
            .expect("an experiment runs at least one trial");
        Self {
            means,
            num_iterations,
            out_of_range,
            stats,
        }
    }

    /// The batch means, in trial order.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// Always `false`: an experiment runs at least one trial.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Number of samples averaged into each batch mean.
    #[must_use]
    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    /// Out-of-range draws encountered while sampling.
    #[must_use]
    pub fn out_of_range(&self) -> OutOfRangeCounts {
        self.out_of_range
    }

    #[must_use]
    pub fn stats(&self) -> &DescriptiveStats {
        &self.stats
    }

    /// Mean of the batch means.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.stats.mean
    }

    /// Population standard deviation of the batch means.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.stats.std_dev
    }

    /// Standard error of [`Self::mean`].
    #[must_use]
    pub fn standard_error_of_mean(&self) -> f64 {
        self.stats.standard_error()
    }

    /// Histogram of the batch means over `range`, or over their own extent
    /// when `range` is `None`.
    #[must_use]
    pub fn histogram(&self, num_bins: usize, range: Option<Range<f64>>) -> Histogram {
        let values = self.means.iter().copied();
        match range {
            Some(range) => Histogram::with_range(values, num_bins, range),
            None => Histogram::new(values, num_bins),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::{DiscreteCdf, Domain, NormalizedPdf, PdfPreset, PdfSpec};

    fn cdf(preset: PdfPreset, numpoints: usize) -> DiscreteCdf {
        let pdf = PdfSpec::Preset(preset)
            .build(Domain::new(0.0, 10.0).unwrap())
            .unwrap();
        DiscreteCdf::new(&NormalizedPdf::new(pdf).unwrap(), numpoints).unwrap()
    }

    fn runner(
        cdf: &DiscreteCdf,
        num_iterations: usize,
        num_means: usize,
        seed: u64,
        execution: Execution,
    ) -> ExperimentRunner<'_> {
        let sampler = InverseSampler::new(cdf, OutOfRangePolicy::Redraw);
        ExperimentRunner::new(sampler, num_iterations, num_means, seed, execution).unwrap()
    }

    #[test]
    fn test_rejects_empty_experiments() {
        let cdf = cdf(PdfPreset::Uniform, 10);
        let sampler = InverseSampler::new(&cdf, OutOfRangePolicy::Redraw);
        assert_eq!(
            ExperimentRunner::new(sampler, 0, 10, 1, Execution::Sequential).unwrap_err(),
            ConfigError::NoIterations
        );
        assert_eq!(
            ExperimentRunner::new(sampler, 10, 0, 1, Execution::Sequential).unwrap_err(),
            ConfigError::NoMeans
        );
        assert_eq!(
            ExperimentRunner::new(sampler, 10, 10, 1, Execution::Parallel { threads: 0 })
                .unwrap_err(),
            ConfigError::NoThreads
        );
    }

    #[test]
    fn test_same_seed_same_means() {
        let cdf = cdf(PdfPreset::Lopsided, 1000);
        let a = runner(&cdf, 20, 300, 1234, Execution::Sequential).run();
        let b = runner(&cdf, 20, 300, 1234, Execution::Sequential).run();
        let c = runner(&cdf, 20, 300, 4321, Execution::Sequential).run();
        assert_eq!(a.means(), b.means());
        assert_ne!(a.means(), c.means());
    }

    #[test]
    fn test_sequential_consumes_draws_in_nested_order() {
        let cdf = cdf(PdfPreset::Normal, 1000);
        let sampler = InverseSampler::new(&cdf, OutOfRangePolicy::Redraw);
        let empirical = runner(&cdf, 7, 3, 99, Execution::Sequential).run();

        let mut rng = Pcg32::seed_from_u64(99);
        let mut counts = OutOfRangeCounts::default();
        for &mean in empirical.means() {
            let expected = (0..7)
                .map(|_| sampler.sample(&mut rng, &mut counts))
                .sum::<f64>()
                / 7.0;
            assert_eq!(mean, expected);
        }
    }

    #[test]
    fn test_parallel_independent_of_thread_count() {
        let cdf = cdf(PdfPreset::Bimodal, 1000);
        let one = runner(&cdf, 30, 101, 1234, Execution::Parallel { threads: 1 }).run();
        let three = runner(&cdf, 30, 101, 1234, Execution::Parallel { threads: 3 }).run();
        let many = runner(&cdf, 30, 101, 1234, Execution::Parallel { threads: 200 }).run();
        assert_eq!(one.len(), 101);
        assert_eq!(one.means(), three.means());
        assert_eq!(one.means(), many.means());
        assert_eq!(one.out_of_range(), many.out_of_range());
    }

    #[test]
    fn test_parallel_trial_uses_offset_seed() {
        let cdf = cdf(PdfPreset::Step, 1000);
        let experiment = runner(&cdf, 10, 5, 40, Execution::Parallel { threads: 2 });
        let empirical = experiment.run();
        let mut counts = OutOfRangeCounts::default();
        let third = experiment.run_trial(&mut Pcg32::seed_from_u64(42), &mut counts);
        assert_eq!(empirical.means()[2], third);
    }

    #[test]
    fn test_means_lie_in_support() {
        // samples are left bracket ends, so the support starts one dx early
        let cdf = cdf(PdfPreset::Step, 1000);
        let empirical = runner(&cdf, 10, 500, 5, Execution::Sequential).run();
        assert!(empirical.means().iter().all(|m| (0.99..5.0).contains(m)));
    }

    #[test]
    fn test_uniform_converges_within_three_standard_errors() {
        let cdf = cdf(PdfPreset::Uniform, 1000);
        let empirical = runner(&cdf, 100, 4000, 1234, Execution::from_threads(4)).run();
        let predicted_mean = 5.0;
        let predicted_std_dev = (100.0_f64 / 12.0).sqrt() / 10.0;
        let stats = empirical.stats();
        assert!(
            (empirical.mean() - predicted_mean).abs() < 3.0 * empirical.standard_error_of_mean() + 0.01,
            "{stats:?}"
        );
        assert!(
            (empirical.std_dev() - predicted_std_dev).abs() < 3.0 * stats.std_dev_standard_error(),
            "{stats:?}"
        );
    }

    #[test]
    fn test_histogram_counts_every_mean() {
        let cdf = cdf(PdfPreset::Normal, 1000);
        let empirical = runner(&cdf, 10, 250, 1, Execution::Sequential).run();
        assert_eq!(empirical.histogram(20, None).total(), 250);
        let clipped = empirical.histogram(20, Some(0.0..10.0));
        assert_eq!(clipped.total() + clipped.underflow + clipped.overflow, 250);
    }
}
