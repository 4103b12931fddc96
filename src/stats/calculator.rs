//! Statistics Calculator Module
//! Descriptive statistics, frequency tables, box-plot statistics and the
//! Pearson coefficient used by the correlation matrix.

use crate::data::{Category, Dimension, Measure, OrderRecord};
use chrono::NaiveDate;
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Whisker reach in multiples of the inter-quartile range.
pub const WHISKER_IQR: f64 = 1.5;

/// `describe()` row for a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl Default for NumericSummary {
    fn default() -> Self {
        Self {
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

/// `describe()` row for a categorical column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// `describe()` row for the order date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DateSummary {
    pub count: usize,
    pub first: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
}

/// Box-plot statistics for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub group: Category,
    pub count: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Null count for one column of the record set.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingCount {
    pub column: &'static str,
    pub missing: usize,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn numeric_summary(values: &[f64]) -> NumericSummary {
        let n = values.len();
        if n == 0 {
            return NumericSummary::default();
        }

        let sorted = Self::sorted(values);
        let std = if n > 1 { values.iter().std_dev() } else { f64::NAN };

        NumericSummary {
            count: n,
            mean: values.iter().mean(),
            std,
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Count, distinct values and the most frequent value.
    pub fn categorical_summary<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> CategoricalSummary {
        let present: Vec<&str> = values.into_iter().flatten().collect();
        let counts = Self::value_counts(present.iter().copied());

        CategoricalSummary {
            count: present.len(),
            unique: counts.len(),
            top: counts.first().map(|(v, _)| v.clone()),
            freq: counts.first().map(|(_, c)| *c).unwrap_or(0),
        }
    }

    pub fn date_summary(dates: impl IntoIterator<Item = Option<NaiveDate>>) -> DateSummary {
        dates
            .into_iter()
            .flatten()
            .fold(DateSummary::default(), |acc, d| DateSummary {
                count: acc.count + 1,
                first: Some(acc.first.map_or(d, |f| f.min(d))),
                last: Some(acc.last.map_or(d, |l| l.max(d))),
            })
    }

    /// Frequency of each value, most frequent first; ties keep first-seen order.
    pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();

        for value in values {
            match index.get(value) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(value, counts.len());
                    counts.push((value.to_string(), 1));
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Frequency of each discount level, ordered by discount value.
    pub fn discount_levels(records: &[OrderRecord]) -> Vec<(f64, usize)> {
        let mut levels: Vec<(f64, usize)> = Vec::new();
        for discount in records.iter().filter_map(|r| r.discount) {
            match levels.iter_mut().find(|(level, _)| *level == discount) {
                Some((_, count)) => *count += 1,
                None => levels.push((discount, 1)),
            }
        }
        levels.sort_by(|a, b| a.0.total_cmp(&b.0));
        levels
    }

    /// Null count for the order date and each listed field, in that order.
    pub fn missing_counts(
        records: &[OrderRecord],
        measures: &[Measure],
        dimensions: &[Dimension],
    ) -> Vec<MissingCount> {
        let count = |f: &dyn Fn(&OrderRecord) -> bool| records.iter().filter(|r| f(*r)).count();

        let mut missing = vec![MissingCount {
            column: crate::data::ORDER_DATE_COLUMN,
            missing: count(&|r: &OrderRecord| r.order_date.is_none()),
        }];
        missing.extend(measures.iter().map(|&m| MissingCount {
            column: m.column_name(),
            missing: count(&|r: &OrderRecord| r.measure(m).is_none()),
        }));
        missing.extend(dimensions.iter().map(|&d| MissingCount {
            column: d.column_name(),
            missing: count(&|r: &OrderRecord| r.dimension(d).is_none()),
        }));
        missing
    }

    /// Quartiles, whiskers and outliers for one group of values.
    pub fn box_stats(group: Category, values: &[f64]) -> Option<BoxStats> {
        if values.is_empty() {
            return None;
        }

        let sorted = Self::sorted(values);
        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < low_fence || v > high_fence)
            .collect();

        Some(BoxStats {
            group,
            count: sorted.len(),
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Pearson correlation of two equally long samples.
    ///
    /// `None` with fewer than two pairs or when either side has no variance.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }

        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if !(sx > 0.0 && sy > 0.0) {
            return None;
        }

        let r = xs.iter().covariance(ys.iter()) / (sx * sy);
        r.is_finite().then(|| r.clamp(-1.0, 1.0))
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
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
}
