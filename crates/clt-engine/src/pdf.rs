//! Probability density functions and the domain they are defined on.
//!
//! The engine never hardcodes a density. A [`Pdf`] wraps any thread-safe
//! function of one real variable; [`PdfSpec`] describes one declaratively so
//! it can be loaded from a configuration file.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::InvalidDistribution;

/// A bounded interval `[xmin, xmax]` with `xmin < xmax`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    xmin: f64,
    xmax: f64,
}

impl Domain {
    /// Creates a domain, rejecting empty, inverted, or non-finite bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::Domain;
    ///
    /// let domain = Domain::new(0.0, 10.0).unwrap();
    /// assert_eq!(domain.width(), 10.0);
    /// assert!(Domain::new(1.0, 1.0).is_err());
    /// ```
    pub fn new(xmin: f64, xmax: f64) -> Result<Self, InvalidDistribution> {
        if !xmin.is_finite() || !xmax.is_finite() || xmin >= xmax {
            return Err(InvalidDistribution::InvalidDomain { xmin, xmax });
        }
        Ok(Self { xmin, xmax })
    }

    #[must_use]
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    #[must_use]
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Returns `count + 1` equally spaced points covering both endpoints.
    #[expect(clippy::cast_precision_loss)]
    pub fn grid(&self, count: usize) -> impl Iterator<Item = f64> + '_ {
        let step = self.width() / count as f64;
        (0..=count).map(move |i| {
            if i == count {
                self.xmax
            } else {
                self.xmin + i as f64 * step
            }
        })
    }
}

type DensityFn = dyn Fn(f64) -> f64 + Send + Sync;

/// A probability density function over a [`Domain`].
///
/// The function is not required to be normalized; see
/// [`NormalizedPdf`](crate::NormalizedPdf). Cloning is cheap: the underlying
/// function is reference counted.
#[derive(Clone)]
pub struct Pdf {
    label: String,
    domain: Domain,
    density: Arc<DensityFn>,
}

impl fmt::Debug for Pdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pdf")
            .field("label", &self.label)
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl Pdf {
    /// Wraps a density function.
    ///
    /// # Examples
    ///
    /// ```
    /// use clt_engine::{Domain, Pdf};
    ///
    /// let pdf = Pdf::new("triangle", Domain::new(0.0, 2.0).unwrap(), |x| 1.0 - (x - 1.0).abs());
    /// assert_eq!(pdf.eval(1.0), 1.0);
    /// ```
    pub fn new<F>(label: impl Into<String>, domain: Domain, density: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            domain,
            density: Arc::new(density),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Evaluates the density at `x`.
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        (self.density)(x)
    }
}

/// Named densities available without writing any code.
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
pub enum PdfPreset {
    /// A normal distribution with mean 5 and standard deviation 2.
    #[display("normal")]
    Normal,
    /// `sin(x) + 10`, which has two humps on `[0, 10]`.
    #[display("bimodal")]
    Bimodal,
    /// `x²`.
    #[display("parabolic")]
    Parabolic,
    /// A constant density.
    #[display("uniform")]
    Uniform,
    /// 1 on `[1, 5)`, 0 elsewhere.
    #[display("step")]
    Step,
    /// `exp(x)·exp(-(x-3)²/10)`: the most probable value differs from the mean.
    #[default]
    #[display("lopsided")]
    Lopsided,
}

impl PdfPreset {
    pub const ALL: [Self; 6] = [
        Self::Normal,
        Self::Bimodal,
        Self::Parabolic,
        Self::Uniform,
        Self::Step,
        Self::Lopsided,
    ];

    /// Human-readable formula of the preset.
    #[must_use]
    pub fn formula(self) -> &'static str {
        match self {
            Self::Normal => "exp(-(x-5)^2 / 8)",
            Self::Bimodal => "sin(x) + 10",
            Self::Parabolic => "x^2",
            Self::Uniform => "1",
            Self::Step => "1 if 1 <= x < 5, else 0",
            Self::Lopsided => "exp(x) * exp(-(x-3)^2 / 10)",
        }
    }

    /// Evaluates the (unnormalized) preset density.
    #[must_use]
    pub fn eval(self, x: f64) -> f64 {
        match self {
            Self::Normal => (-(x - 5.0).powi(2) / 8.0).exp(),
            Self::Bimodal => x.sin() + 10.0,
            Self::Parabolic => x * x,
            Self::Uniform => 1.0,
            Self::Step => {
                if (1.0..5.0).contains(&x) {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Lopsided => x.exp() * (-(x - 3.0).powi(2) / 10.0).exp(),
        }
    }
}

/// Declarative description of a density, as stored in configuration files.
///
/// # Examples
///
/// ```
/// use clt_engine::{PdfPreset, PdfSpec};
///
/// let spec: PdfSpec = serde_json::from_str(r#"{"preset": "parabolic"}"#).unwrap();
/// assert_eq!(spec, PdfSpec::Preset(PdfPreset::Parabolic));
///
/// let spec: PdfSpec = serde_json::from_str(r#"{"polynomial": {"coefficients": [1.0, 0.0, 2.0]}}"#).unwrap();
/// assert!(matches!(spec, PdfSpec::Polynomial { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfSpec {
    Preset(PdfPreset),
    /// `c0 + c1·x + c2·x² + …`
    Polynomial { coefficients: Vec<f64> },
    /// Linear interpolation between `(x, y)` points, zero outside them.
    Tabulated { points: Vec<(f64, f64)> },
}

impl Default for PdfSpec {
    fn default() -> Self {
        Self::Preset(PdfPreset::default())
    }
}

impl fmt::Display for PdfSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfSpec::Preset(preset) => write!(f, "{preset}"),
            PdfSpec::Polynomial { coefficients } => {
                write!(f, "polynomial(")?;
                for (i, c) in coefficients.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
            PdfSpec::Tabulated { points } => write!(f, "tabulated({} points)", points.len()),
        }
    }
}

impl PdfSpec {
    /// Builds the density over `domain`.
    ///
    /// Tabulated densities must have at least two points with strictly
    /// increasing, finite `x` values.
    pub fn build(&self, domain: Domain) -> Result<Pdf, InvalidDistribution> {
        let label = self.to_string();
        let pdf = match self {
            PdfSpec::Preset(preset) => {
                let preset = *preset;
                Pdf::new(label, domain, move |x| preset.eval(x))
            }
            PdfSpec::Polynomial { coefficients } => {
                let coefficients = coefficients.clone();
                Pdf::new(label, domain, move |x| {
                    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
                })
            }
            PdfSpec::Tabulated { points } => {
                let table = Table::new(points.clone())?;
                Pdf::new(label, domain, move |x| table.eval(x))
            }
        };
        Ok(pdf)
    }
}

#[derive(Debug, Clone)]
struct Table {
    points: Vec<(f64, f64)>,
}

impl Table {
    fn new(points: Vec<(f64, f64)>) -> Result<Self, InvalidDistribution> {
        if points.len() < 2 {
            return Err(InvalidDistribution::InvalidTable {
                reason: "at least two points are required",
            });
        }
        if points.iter().any(|(x, _)| !x.is_finite()) {
            return Err(InvalidDistribution::InvalidTable {
                reason: "x values must be finite",
            });
        }
        if !points.is_sorted_by(|a, b| a.0 < b.0) {
            return Err(InvalidDistribution::InvalidTable {
                reason: "x values must be strictly increasing",
            });
        }
        Ok(Self { points })
    }

    fn eval(&self, x: f64) -> f64 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if x < first.0 || x > last.0 {
            return 0.0;
        }
        // index of the first point strictly right of x
        let idx = self.points.partition_point(|p| p.0 <= x);
        if idx == self.points.len() {
            return last.1;
        }
        let (x0, y0) = self.points[idx - 1];
        let (x1, y1) = self.points[idx];
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}
