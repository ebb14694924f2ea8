use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    DiscreteCdf, EmpiricalDistribution, Error, ExperimentConfig, ExperimentRunner, InverseSampler,
    MomentEstimates, NormalizedPdf, Pdf,
};

/// Runs the whole pipeline: normalize, discretize, sample, and predict.
#[derive(Debug, Clone, Copy)]
pub struct Demonstration;

/// Everything a demonstration produces, for reporting and plotting.
#[derive(Debug, Clone)]
pub struct DemonstrationResult {
    /// The normalized density (for drawing the PDF curve).
    pub pdf: NormalizedPdf,
    /// The discrete CDF (for drawing the CDF curve).
    pub cdf: DiscreteCdf,
    /// The batch means (for the histogram).
    pub empirical: EmpiricalDistribution,
    /// Moments of the density and the predictions derived from them.
    pub moments: MomentEstimates,
}

/// Predicted and experimental statistics of the batch means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub predicted_mean: f64,
    pub predicted_std_dev: f64,
    pub empirical_mean: f64,
    pub empirical_std_dev: f64,
}

impl Demonstration {
    /// Runs the demonstration for the density described in `config`.
    pub fn run(config: &ExperimentConfig) -> Result<DemonstrationResult, Error> {
        config.validate()?;
        let pdf = config.pdf.build(config.domain()?)?;
        Self::run_with_pdf(pdf, config)
    }

    /// Runs the demonstration for an arbitrary density, ignoring `config.pdf`
    /// and the domain bounds in `config` (the density carries its own domain).
    ///
    /// All fatal errors are raised before any sampling starts.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::{Demonstration, Domain, Error, ExperimentConfig, Pdf};
    ///
    /// let config = ExperimentConfig { num_means: 10, ..ExperimentConfig::default() };
    /// let cosine = Pdf::new("cos", Domain::new(0.0, 10.0).unwrap(), f64::cos);
    /// let err = Demonstration::run_with_pdf(cosine, &config).unwrap_err();
    /// assert!(matches!(err, Error::InvalidDistribution(_)));
    /// ```
    pub fn run_with_pdf(pdf: Pdf, config: &ExperimentConfig) -> Result<DemonstrationResult, Error> {
        config.validate()?;
        let domain = pdf.domain();
        info!(
            "sampling '{}' on [{}, {}]: {} points, {} means of {} samples, seed {}",
            pdf.label(),
            domain.xmin(),
            domain.xmax(),
            config.numpoints,
            config.num_means,
            config.num_iterations,
            config.seed
        );

        let pdf = NormalizedPdf::with_validation_grid(pdf, config.numpoints)?;
        let moments = MomentEstimates::compute(&pdf, config.num_iterations)?;
        let cdf = DiscreteCdf::new(&pdf, config.numpoints)?;

        let sampler = InverseSampler::new(&cdf, config.out_of_range);
        let runner = ExperimentRunner::new(
            sampler,
            config.num_iterations,
            config.num_means,
            config.rng_seed(),
            config.execution(),
        )?;
        let empirical = runner.run();

        Ok(DemonstrationResult {
            pdf,
            cdf,
            empirical,
            moments,
        })
    }
}

impl DemonstrationResult {
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            predicted_mean: self.moments.mean(),
            predicted_std_dev: self.moments.predicted_std_dev(),
            empirical_mean: self.empirical.mean(),
            empirical_std_dev: self.empirical.std_dev(),
        }
    }
}
