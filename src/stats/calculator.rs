//! Statistics Calculator Module
//! Descriptive statistics for the numeric columns of a collision table.

use crate::data::CollisionTable;
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Descriptive statistics for a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn empty(column: String) -> Self {
        Self {
            column,
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            median: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(column: &str, values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary::empty(column.to_string());
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        // Sample standard deviation; undefined for a single value.
        let std = if n > 1 { values.std_dev() } else { f64::NAN };

        ColumnSummary {
            column: column.to_string(),
            count: n,
            mean: values.mean(),
            std,
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Summaries for every numeric column, in column order, computed in parallel.
    pub fn describe(table: &CollisionTable) -> Vec<ColumnSummary> {
        table
            .numeric_columns()
            .par_iter()
            .map(|(name, values)| Self::compute_descriptive_stats(name, values))
            .collect()
    }
}
