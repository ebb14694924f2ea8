//! Adaptive Simpson quadrature.
//!
//! The interval is first split into [`INITIAL_PANELS`] equal panels, then each
//! panel is refined recursively until the Simpson estimates of its two halves
//! agree with the whole-panel estimate within the tolerance. The panel split
//! keeps narrow features (step edges, kinks of tabulated densities) from
//! being missed by a single coarse first estimate.

/// Absolute tolerance of a full integral, before scaling by its magnitude.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

const INITIAL_PANELS: usize = 64;
const MAX_DEPTH: u32 = 50;

/// Integrates `f` over `[a, b]` with the default tolerance.
///
/// # Examples
///
/// ```
/// use clt_engine::quadrature::integrate;
///
/// let area = integrate(|x| x * x, 0.0, 3.0);
/// assert!((area - 9.0).abs() < 1e-9);
/// ```
pub fn integrate<F>(f: F, a: f64, b: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    integrate_with_tolerance(f, a, b, DEFAULT_TOLERANCE)
}

/// Integrates `f` over `[a, b]`.
///
/// `tolerance` is applied relative to the magnitude of a coarse estimate of
/// the integral (or absolutely when that estimate is below 1).
#[expect(clippy::cast_precision_loss)]
pub fn integrate_with_tolerance<F>(f: F, a: f64, b: f64, tolerance: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return 0.0;
    }

    let width = (b - a) / INITIAL_PANELS as f64;
    let panels = (0..INITIAL_PANELS)
        .map(|i| {
            let lo = a + i as f64 * width;
            let hi = if i == INITIAL_PANELS - 1 {
                b
            } else {
                lo + width
            };
            Panel::new(&f, lo, hi)
        })
        .collect::<Vec<_>>();

    let coarse = panels.iter().map(|p| p.whole.abs()).sum::<f64>();
    let panel_tolerance = tolerance * coarse.max(1.0) / INITIAL_PANELS as f64;

    panels
        .into_iter()
        .map(|panel| panel.refine(&f, panel_tolerance, MAX_DEPTH))
        .sum()
}

#[derive(Debug, Clone, Copy)]
struct Panel {
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
}

impl Panel {
    fn new<F>(f: &F, a: f64, b: f64) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let fa = f(a);
        let fb = f(b);
        let fm = f(0.5 * (a + b));
        Self::with_values(a, b, fa, fm, fb)
    }

    fn with_values(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> Self {
        let whole = (b - a) / 6.0 * (fa + 4.0 * fm + fb);
        Self {
            a,
            b,
            fa,
            fm,
            fb,
            whole,
        }
    }

    fn refine<F>(self, f: &F, tolerance: f64, depth: u32) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let m = 0.5 * (self.a + self.b);
        let left = Self::with_values(self.a, m, self.fa, f(0.5 * (self.a + m)), self.fm);
        let right = Self::with_values(m, self.b, self.fm, f(0.5 * (m + self.b)), self.fb);
        let delta = left.whole + right.whole - self.whole;
        if depth == 0 || delta.abs() <= 15.0 * tolerance || !delta.is_finite() {
            // Richardson extrapolation
            return left.whole + right.whole + delta / 15.0;
        }
        left.refine(f, 0.5 * tolerance, depth - 1) + right.refine(f, 0.5 * tolerance, depth - 1)
    }
}
