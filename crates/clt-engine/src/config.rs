use serde::{Deserialize, Serialize};

use crate::{Domain, Execution, InvalidDistribution, MIN_NUMPOINTS, OutOfRangePolicy, PdfSpec};

/// An experiment parameter is outside its allowed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("numpoints must be at least 2, got {numpoints}")]
    TooFewPoints { numpoints: usize },
    #[display("num_iterations must be at least 1")]
    NoIterations,
    #[display("num_means must be at least 1")]
    NoMeans,
    #[display("threads must be at least 1")]
    NoThreads,
}

/// All parameters of one demonstration run.
///
/// Every field has a default, so a configuration file only needs the fields it
/// changes.
///
/// # Examples
///
/// ```
/// use clt_engine::{ExperimentConfig, PdfPreset, PdfSpec};
///
/// let config: ExperimentConfig =
///     serde_json::from_str(r#"{"pdf": {"preset": "parabolic"}, "num_means": 500}"#).unwrap();
/// assert_eq!(config.pdf, PdfSpec::Preset(PdfPreset::Parabolic));
/// assert_eq!(config.num_means, 500);
/// assert_eq!(config.numpoints, 1000);
/// assert_eq!(config.seed, 1234);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    /// The density to sample.
    pub pdf: PdfSpec,
    /// Lower bound of the domain.
    pub xmin: f64,
    /// Upper bound of the domain.
    pub xmax: f64,
    /// Points used in the discrete CDF.
    pub numpoints: usize,
    /// Samples averaged into each batch mean.
    pub num_iterations: usize,
    /// Number of batch means to collect.
    pub num_means: usize,
    /// Seed of the pseudorandom generator; negative seeds wrap to `u64`.
    pub seed: i64,
    /// Handling of uniform draws outside the discrete CDF range.
    pub out_of_range: OutOfRangePolicy,
    /// Worker threads; 1 runs sequentially on a single random stream.
    pub threads: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            pdf: PdfSpec::default(),
            xmin: 0.0,
            xmax: 10.0,
            numpoints: 1000,
            num_iterations: 100,
            num_means: 10_000,
            seed: 1234,
            out_of_range: OutOfRangePolicy::default(),
            threads: 1,
        }
    }
}

impl ExperimentConfig {
    /// Checks the numeric parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.numpoints < MIN_NUMPOINTS {
            return Err(ConfigError::TooFewPoints {
                numpoints: self.numpoints,
            });
        }
        if self.num_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.num_means == 0 {
            return Err(ConfigError::NoMeans);
        }
        if self.threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        Ok(())
    }

    pub fn domain(&self) -> Result<Domain, InvalidDistribution> {
        Domain::new(self.xmin, self.xmax)
    }

    /// The generator seed, reinterpreting the two's complement bits.
    #[expect(clippy::cast_sign_loss)]
    #[must_use]
    pub fn rng_seed(&self) -> u64 {
        self.seed as u64
    }

    #[must_use]
    pub fn execution(&self) -> Execution {
        Execution::from_threads(self.threads)
    }
}
