//! Data Processor Module
//! Handles date parsing, row cleaning and the grouped aggregates behind each
//! chart.

use crate::data::dates::parse_order_date;
use crate::data::record::{Category, Dimension, Measure, OrderRecord, YearMonth};
use crate::stats::StatsCalculator;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, PartialEq)]
pub enum ProcessorError {
    #[error("Cannot compute {operation}: no records survived cleaning")]
    EmptyDataset { operation: &'static str },
}

/// Region × Category style cross-tabulation over the observed values.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_field: Dimension,
    pub col_field: Dimension,
    pub measure: Measure,
    pub rows: Vec<Category>,
    pub columns: Vec<Category>,
    /// `cells[row][col]`; `None` marks a combination with no orders.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col).copied().flatten())
    }

    /// Smallest and largest present cell, if any.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Pairwise Pearson coefficients between measures.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub fields: Vec<Measure>,
    /// `None` where a pair has too few complete observations or no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|r| r.get(j).copied().flatten())
    }
}

/// Handles data cleaning and aggregation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Parse every order date in place. Unparseable text becomes `None`.
    ///
    /// Returns how many non-empty date values failed to parse.
    pub fn parse_dates(records: &mut [OrderRecord]) -> usize {
        let mut failures = 0;
        for record in records.iter_mut() {
            record.order_date = record.order_date_text.as_deref().and_then(parse_order_date);
            let had_text = record
                .order_date_text
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty());
            if record.order_date.is_none() && had_text {
                failures += 1;
            }
        }
        debug!(records = records.len(), failures, "parsed order dates");
        failures
    }

    /// Remove records without a date or a sales value, keeping order.
    pub fn drop_incomplete(records: Vec<OrderRecord>) -> Vec<OrderRecord> {
        let before = records.len();
        let kept: Vec<OrderRecord> = records.into_iter().filter(|r| r.is_complete()).collect();
        info!(kept = kept.len(), dropped = before - kept.len(), "dropped incomplete records");
        kept
    }

    /// Total sales per calendar month, in chronological order.
    pub fn aggregate_by_month(
        records: &[OrderRecord],
    ) -> Result<Vec<(YearMonth, f64)>, ProcessorError> {
        let mut totals: BTreeMap<YearMonth, f64> = BTreeMap::new();
        for record in records {
            if let (Some(date), Some(sales)) = (record.order_date, record.sales) {
                *totals.entry(YearMonth::of(date)).or_insert(0.0) += sales;
            }
        }

        if totals.is_empty() {
            return Err(ProcessorError::EmptyDataset {
                operation: "monthly sales",
            });
        }
        Ok(totals.into_iter().collect())
    }

    /// Sum `measure` per value of `dimension`, ordered by key.
    ///
    /// With `top_n`, groups are stably sorted by descending total (ties keep
    /// key order) and truncated.
    pub fn aggregate_by_dimension(
        records: &[OrderRecord],
        dimension: Dimension,
        measure: Measure,
        top_n: Option<usize>,
    ) -> Result<Vec<(Category, f64)>, ProcessorError> {
        if records.is_empty() {
            return Err(ProcessorError::EmptyDataset {
                operation: "dimension totals",
            });
        }

        let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
        for record in records {
            let total = totals.entry(record.category(dimension)).or_insert(0.0);
            if let Some(v) = record.measure(measure) {
                *total += v;
            }
        }

        let mut groups: Vec<(Category, f64)> = totals.into_iter().collect();
        if let Some(n) = top_n {
            groups.sort_by(|a, b| b.1.total_cmp(&a.1));
            groups.truncate(n);
        }
        Ok(groups)
    }

    /// Dense grid of `measure` sums over observed row/column values.
    pub fn pivot(
        records: &[OrderRecord],
        row_field: Dimension,
        col_field: Dimension,
        measure: Measure,
    ) -> Result<PivotTable, ProcessorError> {
        if records.is_empty() {
            return Err(ProcessorError::EmptyDataset { operation: "pivot" });
        }

        let mut rows: BTreeSet<Category> = BTreeSet::new();
        let mut columns: BTreeSet<Category> = BTreeSet::new();
        let mut sums: HashMap<(Category, Category), f64> = HashMap::new();

        for record in records {
            let row = record.category(row_field);
            let col = record.category(col_field);
            rows.insert(row.clone());
            columns.insert(col.clone());
            if let Some(v) = record.measure(measure) {
                *sums.entry((row, col)).or_insert(0.0) += v;
            }
        }

        let rows: Vec<Category> = rows.into_iter().collect();
        let columns: Vec<Category> = columns.into_iter().collect();
        let cells = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| sums.get(&(r.clone(), c.clone())).copied())
                    .collect()
            })
            .collect();

        Ok(PivotTable {
            row_field,
            col_field,
            measure,
            rows,
            columns,
            cells,
        })
    }

    /// Pairwise-complete Pearson correlation between `fields`.
    pub fn correlation_matrix(
        records: &[OrderRecord],
        fields: &[Measure],
    ) -> Result<CorrelationMatrix, ProcessorError> {
        if records.is_empty() {
            return Err(ProcessorError::EmptyDataset {
                operation: "correlation matrix",
            });
        }

        let n = fields.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            values[i][i] = Some(1.0);
            for j in (i + 1)..n {
                let (xs, ys): (Vec<f64>, Vec<f64>) = records
                    .iter()
                    .filter_map(|r| Some((r.measure(fields[i])?, r.measure(fields[j])?)))
                    .unzip();
                let r = StatsCalculator::pearson(&xs, &ys);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            fields: fields.to_vec(),
            values,
        })
    }

    /// Non-null values of `measure` per group of `dimension`, ordered by key.
    pub fn values_by_group(
        records: &[OrderRecord],
        dimension: Dimension,
        measure: Measure,
    ) -> BTreeMap<Category, Vec<f64>> {
        let mut groups: BTreeMap<Category, Vec<f64>> = BTreeMap::new();
        for record in records {
            if let Some(v) = record.measure(measure) {
                groups.entry(record.category(dimension)).or_default().push(v);
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(date: &str, sales: Option<f64>) -> OrderRecord {
        OrderRecord {
            order_date_text: Some(date.to_string()),
            sales,
            ..Default::default()
        }
    }

    fn dated(y: i32, m: u32, d: u32, sales: f64) -> OrderRecord {
        OrderRecord {
            order_date: NaiveDate::from_ymd_opt(y, m, d),
            sales: Some(sales),
            ..Default::default()
        }
    }

    fn in_category(category: &str, sales: f64) -> OrderRecord {
        OrderRecord {
            category: Some(category.to_string()),
            sales: Some(sales),
            ..dated(2023, 1, 1, sales)
        }
    }

    #[test]
    fn cleaning_drops_bad_dates_and_sums_by_month() {
        let mut records = vec![
            raw("2023-01-05", Some(100.0)),
            raw("bad-date", Some(50.0)),
            raw("2023-01-20", Some(200.0)),
        ];
        let failures = DataProcessor::parse_dates(&mut records);
        assert_eq!(failures, 1);

        let cleaned = DataProcessor::drop_incomplete(records);
        assert_eq!(cleaned.len(), 2);

        let monthly = DataProcessor::aggregate_by_month(&cleaned).unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].0.to_string(), "2023-01");
        assert_eq!(monthly[0].1, 300.0);
    }

    #[test]
    fn drop_incomplete_keeps_order_and_only_complete_rows() {
        let mut records = vec![
            raw("2023-03-01", Some(1.0)),
            raw("2023-03-02", None),
            OrderRecord::default(),
            raw("2023-03-04", Some(4.0)),
            raw("", Some(5.0)),
        ];
        DataProcessor::parse_dates(&mut records);
        let input_len = records.len();
        let cleaned = DataProcessor::drop_incomplete(records);

        assert!(cleaned.len() <= input_len);
        assert!(cleaned.iter().all(|r| r.order_date.is_some() && r.sales.is_some()));
        let sales: Vec<f64> = cleaned.iter().filter_map(|r| r.sales).collect();
        assert_eq!(sales, vec![1.0, 4.0]);
    }

    #[test]
    fn months_are_strictly_increasing() {
        let records = vec![
            dated(2023, 11, 2, 1.0),
            dated(2022, 12, 30, 2.0),
            dated(2023, 2, 14, 3.0),
            dated(2023, 11, 20, 4.0),
            dated(2023, 10, 1, 5.0),
        ];
        let monthly = DataProcessor::aggregate_by_month(&records).unwrap();
        assert!(monthly.windows(2).all(|w| w[0].0 < w[1].0));
        let labels: Vec<String> = monthly.iter().map(|(m, _)| m.to_string()).collect();
        assert_eq!(labels, vec!["2022-12", "2023-02", "2023-10", "2023-11"]);
        assert_eq!(monthly[3].1, 5.0);
    }

    #[test]
    fn empty_input_is_an_explicit_error() {
        let err = DataProcessor::aggregate_by_month(&[]).unwrap_err();
        assert!(matches!(err, ProcessorError::EmptyDataset { .. }));
        assert!(DataProcessor::aggregate_by_dimension(&[], Dimension::Region, Measure::Sales, None).is_err());
        assert!(DataProcessor::pivot(&[], Dimension::Region, Dimension::Category, Measure::Sales).is_err());
        assert!(DataProcessor::correlation_matrix(&[], &Measure::ALL).is_err());
    }

    #[test]
    fn top_n_keeps_the_largest_group() {
        let records = vec![
            in_category("A", 10.0),
            in_category("B", 30.0),
            in_category("A", 5.0),
        ];
        let top = DataProcessor::aggregate_by_dimension(
            &records,
            Dimension::Category,
            Measure::Sales,
            Some(1),
        )
        .unwrap();
        assert_eq!(top, vec![(Category::Known("B".into()), 30.0)]);
    }

    #[test]
    fn top_n_sorts_descending_and_ties_keep_key_order() {
        let records = vec![
            in_category("C", 20.0),
            in_category("A", 20.0),
            in_category("B", 50.0),
            in_category("D", 1.0),
        ];
        let top = DataProcessor::aggregate_by_dimension(
            &records,
            Dimension::Category,
            Measure::Sales,
            Some(3),
        )
        .unwrap();
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        let keys: Vec<&str> = top.iter().map(|(k, _)| k.label()).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn missing_dimension_values_group_as_unknown() {
        let mut unknown = dated(2023, 1, 1, 7.0);
        unknown.quantity = Some(2);
        let mut known = in_category("Furniture", 3.0);
        known.quantity = Some(4);

        let totals = DataProcessor::aggregate_by_dimension(
            &[unknown, known],
            Dimension::Category,
            Measure::Quantity,
            None,
        )
        .unwrap();
        assert_eq!(
            totals,
            vec![
                (Category::Known("Furniture".into()), 4.0),
                (Category::Unknown, 2.0),
            ]
        );
    }

    #[test]
    fn pivot_marks_absent_combinations() {
        let cell = |region: &str, category: &str, sales: f64| OrderRecord {
            region: Some(region.to_string()),
            ..in_category(category, sales)
        };
        let records = vec![
            cell("East", "Furniture", 10.0),
            cell("East", "Furniture", 5.0),
            cell("West", "Technology", 0.0),
        ];
        let table =
            DataProcessor::pivot(&records, Dimension::Region, Dimension::Category, Measure::Sales)
                .unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.get(0, 0), Some(15.0));
        assert_eq!(table.get(0, 1), None);
        assert_eq!(table.get(1, 0), None);
        assert_eq!(table.get(1, 1), Some(0.0));
        assert_eq!(table.value_range(), Some((0.0, 15.0)));
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let records: Vec<OrderRecord> = (0..20)
            .map(|i| {
                let x = i as f64;
                OrderRecord {
                    profit: Some(0.3 * x - (x * 1.7).sin() * 4.0),
                    quantity: Some((i % 5) as i64 + 1),
                    discount: if i % 4 == 0 { None } else { Some((i % 3) as f64 / 10.0) },
                    ..dated(2023, 1, 1, 10.0 + 3.0 * x + (x * 0.9).cos())
                }
            })
            .collect();

        let matrix = DataProcessor::correlation_matrix(&records, &Measure::ALL).unwrap();
        for i in 0..4 {
            assert!((matrix.get(i, i).unwrap() - 1.0).abs() < 1e-12);
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                if let Some(r) = matrix.get(i, j) {
                    assert!((-1.0..=1.0).contains(&r));
                }
            }
        }
    }

    #[test]
    fn correlation_uses_pairwise_complete_rows() {
        let records = vec![
            OrderRecord { profit: Some(2.0), ..dated(2023, 1, 1, 1.0) },
            OrderRecord { profit: Some(4.0), ..dated(2023, 1, 2, 2.0) },
            OrderRecord { profit: None, ..dated(2023, 1, 3, 100.0) },
            OrderRecord { profit: Some(6.0), ..dated(2023, 1, 4, 3.0) },
        ];
        let matrix =
            DataProcessor::correlation_matrix(&records, &[Measure::Sales, Measure::Profit]).unwrap();
        assert!((matrix.get(0, 1).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn groups_values_for_box_plots() {
        let groups = DataProcessor::values_by_group(
            &[in_category("B", 2.0), in_category("A", 1.0), in_category("B", 3.0)],
            Dimension::Category,
            Measure::Sales,
        );
        let keys: Vec<&str> = groups.keys().map(|k| k.label()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(groups[&Category::Known("B".into())], vec![2.0, 3.0]);
    }
}
