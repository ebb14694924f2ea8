use chrono::{DateTime, Utc};
use clt_engine::{DemonstrationResult, ExperimentConfig, OutOfRangeCounts, Summary};
use serde::{Deserialize, Serialize};

/// Everything needed to redraw the PDF, CDF, and batch-mean plots offline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Timestamp when the demonstration finished (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    /// Parameters the demonstration ran with
    pub config: ExperimentConfig,
    /// Predicted and experimental mean and standard deviation
    pub summary: Summary,
    /// Uniform draws that fell outside the CDF range
    pub out_of_range: OutOfRangeCounts,
    /// Discrete CDF and normalized PDF sampled on the CDF grid
    pub curve: Vec<CurvePoint>,
    /// One entry per batch, in trial order
    pub means: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub pdf: f64,
    pub cdf: f64,
}

impl Report {
    pub fn new(config: ExperimentConfig, result: &DemonstrationResult) -> Self {
        let curve = result
            .cdf
            .points()
            .map(|(x, cdf)| CurvePoint {
                x,
                pdf: result.pdf.eval(x),
                cdf,
            })
            .collect();
        Self {
            generated_at: Utc::now(),
            config,
            summary: result.summary(),
            out_of_range: result.empirical.out_of_range(),
            curve,
            means: result.empirical.means().to_vec(),
        }
    }
}
