use std::ops::Range;

/// A histogram representation of a dataset's distribution.
///
/// The histogram divides a fixed range into equally wide bins and counts the
/// values falling into each bin. Values outside the range are not dropped
/// silently: they are tallied in [`Histogram::underflow`] and
/// [`Histogram::overflow`].
#[derive(Debug, Clone)]
pub struct Histogram {
    /// The bins comprising the histogram, in ascending order.
    pub bins: Vec<HistogramBin>,
    /// The number of values below the histogram range.
    pub underflow: u64,
    /// The number of values above the histogram range.
    pub overflow: u64,
}

/// A single bin in a histogram.
///
/// Each bin represents a range of values and the count of data points falling within that range.
#[derive(Debug, Clone)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl HistogramBin {
    /// The midpoint of the bin range.
    #[must_use]
    pub fn center(&self) -> f64 {
        0.5 * (self.range.start + self.range.end)
    }
}

impl Histogram {
    /// Creates a histogram whose range spans the data from minimum to maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// # use clt_stats::histogram::Histogram;
    /// let values = [5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 4.0, 6.0, 10.0];
    /// let histogram = Histogram::new(values, 5);
    /// assert_eq!(histogram.bins.len(), 5);
    /// assert_eq!(histogram.total(), 10);
    /// ```
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if values.is_empty() {
            return Self::with_range(values, num_bins, 0.0..1.0);
        }
        let range = if max - min < f64::EPSILON {
            // Edge case: distribution is concentrated at a single value
            min - 0.5..min + 0.5
        } else {
            min..max
        };
        Self::with_range(values, num_bins, range)
    }

    /// Creates a histogram over an explicit range.
    ///
    /// The last bin includes the range end so that a value equal to the
    /// maximum is counted rather than treated as overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// # use clt_stats::histogram::Histogram;
    /// let histogram = Histogram::with_range([-1.0, 0.5, 1.0, 2.5], 2, 0.0..2.0);
    /// assert_eq!(histogram.underflow, 1);
    /// assert_eq!(histogram.overflow, 1);
    /// assert_eq!(histogram.bins[0].count, 1);
    /// assert_eq!(histogram.bins[1].count, 1);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn with_range<I>(values: I, num_bins: usize, range: Range<f64>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        if num_bins == 0 || range.end <= range.start {
            return Self {
                bins: vec![],
                underflow: 0,
                overflow: 0,
            };
        }

        let bin_width = (range.end - range.start) / num_bins as f64;
        let mut bins = (0..num_bins)
            .map(|bin_idx| {
                // Recompute boundaries from the index to avoid accumulation errors
                let start = range.start + bin_idx as f64 * bin_width;
                let end = if bin_idx == num_bins - 1 {
                    range.end.next_up()
                } else {
                    range.start + (bin_idx + 1) as f64 * bin_width
                };
                HistogramBin {
                    range: start..end,
                    count: 0,
                }
            })
            .collect::<Vec<_>>();

        let mut underflow = 0;
        let mut overflow = 0;
        for val in values {
            if val < range.start {
                underflow += 1;
            } else if val > range.end {
                overflow += 1;
            } else {
                let idx = (((val - range.start) / bin_width).floor() as usize).min(num_bins - 1);
                bins[idx].count += 1;
            }
        }

        Self {
            bins,
            underflow,
            overflow,
        }
    }

    /// Total number of values counted inside the histogram range.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    /// The largest single-bin count, or 0 for an empty histogram.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        let histogram = Histogram::new(Vec::<f64>::new(), 4);
        assert_eq!(histogram.bins.len(), 4);
        assert_eq!(histogram.total(), 0);
        assert_eq!(histogram.max_count(), 0);
    }

    #[test]
    fn test_zero_bins() {
        let histogram = Histogram::new([1.0, 2.0], 0);
        assert!(histogram.bins.is_empty());
    }

    #[test]
    fn test_max_value_in_last_bin() {
        let histogram = Histogram::with_range([0.0, 10.0], 10, 0.0..10.0);
        assert_eq!(histogram.bins[0].count, 1);
        assert_eq!(histogram.bins[9].count, 1);
        assert_eq!(histogram.overflow, 0);
    }

    #[test]
    fn test_single_value_distribution() {
        let histogram = Histogram::new([3.0; 5], 3);
        assert_eq!(histogram.total(), 5);
        assert_eq!(histogram.bins[1].count, 5);
        assert!((histogram.bins[1].center() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_bins_are_contiguous() {
        let histogram = Histogram::with_range(Vec::<f64>::new(), 7, -1.0..2.5);
        for pair in histogram.bins.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
        }
        assert_eq!(histogram.bins[0].range.start, -1.0);
    }
}
