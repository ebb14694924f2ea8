//! Statistical summary utilities for the central limit demonstrator.
//!
//! This crate provides:
//!
//! - **Descriptive statistics**: mean, median, population variance, standard deviation
//!   and standard errors of a dataset
//! - **Histogram generation**: fixed-range frequency distributions with
//!   underflow/overflow accounting
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`histogram`]: Histogram construction for visualizing data distributions
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use clt_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Creating a histogram
//!
//! ```
//! use clt_stats::histogram::Histogram;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
//! let histogram = Histogram::with_range(values, 5, 0.0..10.0);
//! assert_eq!(histogram.total(), 10);
//! ```

pub mod descriptive;
pub mod histogram;
