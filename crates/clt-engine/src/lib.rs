//! Sampling and statistics engine for demonstrating the Central Limit Theorem.
//!
//! A user-chosen probability density function is normalized over a bounded
//! domain, discretized into a cumulative distribution function, and sampled by
//! discrete inverse transform sampling. Batches of samples are averaged, and
//! the distribution of those batch means is compared against the mean and
//! standard deviation predicted from the density's first two moments.
//!
//! # Pipeline
//!
//! ```text
//! Pdf ─► NormalizedPdf ─► DiscreteCdf ─► InverseSampler ─► ExperimentRunner ─► EmpiricalDistribution
//!              │
//!              └────────► MomentEstimates (predicted mean / standard deviation)
//! ```
//!
//! # Example
//!
//! ```
//! use clt_engine::{ExperimentConfig, Demonstration, PdfPreset, PdfSpec};
//!
//! let config = ExperimentConfig {
//!     pdf: PdfSpec::Preset(PdfPreset::Uniform),
//!     num_iterations: 10,
//!     num_means: 200,
//!     ..ExperimentConfig::default()
//! };
//! let result = Demonstration::run(&config).unwrap();
//! assert_eq!(result.empirical.len(), 200);
//! assert!((result.moments.mean() - 5.0).abs() < 1e-6);
//! ```

pub use self::{
    cdf::*, config::*, demonstration::*, experiment::*, moments::*, normalize::*, pdf::*,
    sampler::*,
};

pub mod cdf;
pub mod config;
pub mod demonstration;
pub mod experiment;
pub mod moments;
pub mod normalize;
pub mod pdf;
pub mod quadrature;
pub mod sampler;

/// The density cannot be used as a probability distribution.
///
/// Raised before any sampling takes place.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum InvalidDistribution {
    #[display("invalid domain [{xmin}, {xmax}]: bounds must be finite with xmin < xmax")]
    InvalidDomain { xmin: f64, xmax: f64 },
    #[display("probability density is negative at x = {x} (pdf = {value})")]
    NegativeDensity { x: f64, value: f64 },
    #[display("probability density is not finite at x = {x}")]
    NonFiniteDensity { x: f64 },
    #[display("probability density integrates to {integral} over the domain")]
    NonPositiveIntegral { integral: f64 },
    #[display("discretized CDF is empty: density vanishes at every grid point")]
    EmptyDiscretization,
    #[display(
        "discretized CDF brackets only {mass} of the unit interval; use more points"
    )]
    SparseDiscretization { mass: f64 },
    #[display("invalid tabulated density: {reason}")]
    InvalidTable { reason: &'static str },
}

/// Any fatal error raised while running a demonstration.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Error {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("invalid distribution: {_0}")]
    InvalidDistribution(InvalidDistribution),
    #[display("moment computation failed: {_0}")]
    NegativeVariance(NegativeVariance),
}
