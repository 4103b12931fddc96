//! Summary Report Module
//! Formats the textual overview of the cleaned dataset.

use crate::data::{Dimension, Measure, OrderRecord};
use crate::stats::StatsCalculator;
use std::fmt;

/// Rows shown for the product and customer frequency rankings.
pub const FREQUENCY_TOP: usize = 10;

/// Column facts captured at load time.
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    pub columns: Vec<String>,
}

impl SourceInfo {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.trim() == name)
    }

    /// Measures whose column exists in the source file.
    pub fn measures(&self) -> Vec<Measure> {
        Measure::ALL
            .into_iter()
            .filter(|m| self.has_column(m.column_name()))
            .collect()
    }

    /// Dimensions whose column exists in the source file.
    pub fn dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.has_column(d.column_name()))
            .collect()
    }
}

/// Console overview printed before the charts.
pub struct SummaryReport<'a> {
    records: &'a [OrderRecord],
    source: &'a SourceInfo,
    measures: Vec<Measure>,
    dimensions: Vec<Dimension>,
}

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_shape(f)?;
        self.write_column_info(f)?;
        self.write_describe(f)?;
        self.write_missing(f)?;

        for dimension in [
            Dimension::Segment,
            Dimension::Region,
            Dimension::Category,
            Dimension::SubCategory,
        ] {
            let title = format!("{} distribution", dimension);
            self.write_counts(f, &title, dimension, None)?;
        }
        self.write_counts(
            f,
            "Top 10 Most Frequently Ordered Products",
            Dimension::ProductName,
            Some(FREQUENCY_TOP),
        )?;
        self.write_counts(
            f,
            "Top 10 Customers by Order Frequency",
            Dimension::CustomerId,
            Some(FREQUENCY_TOP),
        )?;
        self.write_counts(f, "Shipping Mode distribution", Dimension::ShipMode, None)?;
        if self.measures.contains(&Measure::Discount) {
            self.write_discount_levels(f)?;
        }
        Ok(())
    }
}

impl<'a> SummaryReport<'a> {
    pub fn new(records: &'a [OrderRecord], source: &'a SourceInfo) -> Self {
        Self {
            records,
            source,
            measures: source.measures(),
            dimensions: source.dimensions(),
        }
    }

    fn write_shape(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Dataset shape: ({}, {})",
            self.records.len(),
            self.source.columns.len()
        )
    }

    fn write_column_info(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nColumn info:")?;
        writeln!(f, "  {:<16} {:>10}  {}", "Column", "Non-Null", "Type")?;

        let date_count = self.records.iter().filter(|r| r.order_date.is_some()).count();
        writeln!(f, "  {:<16} {:>10}  date", "Order Date", date_count)?;
        for &measure in &self.measures {
            let n = self.records.iter().filter(|r| r.measure(measure).is_some()).count();
            let kind = if measure == Measure::Quantity { "int" } else { "float" };
            writeln!(f, "  {:<16} {:>10}  {}", measure.column_name(), n, kind)?;
        }
        for &dimension in &self.dimensions {
            let n = self.records.iter().filter(|r| r.dimension(dimension).is_some()).count();
            writeln!(f, "  {:<16} {:>10}  text", dimension.column_name(), n)?;
        }
        Ok(())
    }

    fn write_describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nSummary statistics:")?;
        writeln!(
            f,
            "  {:<10} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for &measure in &self.measures {
            let values: Vec<f64> = self.records.iter().filter_map(|r| r.measure(measure)).collect();
            let s = StatsCalculator::numeric_summary(&values);
            writeln!(
                f,
                "  {:<10} {:>7} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3}",
                measure.column_name(),
                s.count,
                s.mean,
                s.std,
                s.min,
                s.p25,
                s.median,
                s.p75,
                s.max
            )?;
        }

        let dates = StatsCalculator::date_summary(self.records.iter().map(|r| r.order_date));
        let span = match (dates.first, dates.last) {
            (Some(first), Some(last)) => format!("{first} .. {last}"),
            _ => "-".to_string(),
        };
        writeln!(f, "\n  {:<16} count={} range={}", "Order Date", dates.count, span)?;

        for &dimension in &self.dimensions {
            let s = StatsCalculator::categorical_summary(
                self.records.iter().map(|r| r.dimension(dimension)),
            );
            writeln!(
                f,
                "  {:<16} count={} unique={} top={} freq={}",
                dimension.column_name(),
                s.count,
                s.unique,
                s.top.as_deref().unwrap_or("-"),
                s.freq
            )?;
        }
        Ok(())
    }

    fn write_missing(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nMissing values per column:")?;
        for m in StatsCalculator::missing_counts(self.records, &self.measures, &self.dimensions) {
            writeln!(f, "  {:<16} {}", m.column, m.missing)?;
        }
        Ok(())
    }

    /// Frequency table for one dimension; skipped when its column is absent.
    fn write_counts(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        dimension: Dimension,
        top: Option<usize>,
    ) -> fmt::Result {
        if !self.dimensions.contains(&dimension) {
            return Ok(());
        }
        let mut counts =
            StatsCalculator::value_counts(self.records.iter().filter_map(|r| r.dimension(dimension)));
        if let Some(n) = top {
            counts.truncate(n);
        }

        writeln!(f, "\n{}:", title)?;
        for (value, count) in counts {
            writeln!(f, "  {:<40} {}", value, count)?;
        }
        Ok(())
    }

    fn write_discount_levels(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nUnique Discount Levels:")?;
        for (level, count) in StatsCalculator::discount_levels(self.records) {
            writeln!(f, "  {:<8} {}", level, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(segment: &str, product: &str, ship: Option<&str>) -> OrderRecord {
        OrderRecord {
            order_date: NaiveDate::from_ymd_opt(2023, 1, 5),
            sales: Some(10.0),
            discount: Some(0.1),
            segment: Some(segment.to_string()),
            product_name: Some(product.to_string()),
            ship_mode: ship.map(str::to_string),
            ..Default::default()
        }
    }

    fn source(columns: &[&str]) -> SourceInfo {
        SourceInfo::new(columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn renders_all_sections_in_order() {
        let records = vec![
            record("Consumer", "Chair", Some("First Class")),
            record("Consumer", "Desk", None),
            record("Corporate", "Chair", None),
        ];
        let source = source(&[
            "Order Date",
            "Sales",
            "Discount",
            "Segment",
            "Product Name",
            "Ship Mode",
        ]);
        let text = SummaryReport::new(&records, &source).to_string();

        assert!(text.starts_with("Dataset shape: (3, 6)"));
        let order = [
            "Column info:",
            "Summary statistics:",
            "Missing values per column:",
            "Segment distribution:",
            "Top 10 Most Frequently Ordered Products:",
            "Shipping Mode distribution:",
            "Unique Discount Levels:",
        ];
        let positions: Vec<usize> = order.iter().map(|s| text.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("Consumer"));
    }

    #[test]
    fn optional_sections_follow_column_presence() {
        let records = vec![record("Consumer", "Chair", None)];
        let source = source(&["Order Date", "Sales"]);
        let text = SummaryReport::new(&records, &source).to_string();
        assert!(!text.contains("Shipping Mode distribution"));
        assert!(!text.contains("Unique Discount Levels"));
    }

    #[test]
    fn absent_columns_are_left_out_of_every_section() {
        let records = vec![
            record("Consumer", "Chair", None),
            record("Corporate", "Desk", None),
        ];
        let source = source(&["Order Date", "Sales", "Discount", "Segment", "Product Name"]);
        let text = SummaryReport::new(&records, &source).to_string();

        assert!(!text.contains("Ship Mode"));
        assert!(!text.contains("Customer ID"));
        assert!(!text.contains("Profit"));
        assert!(text.contains("Segment"));
        assert!(text.contains("Unique Discount Levels:"));
    }

    #[test]
    fn header_whitespace_does_not_hide_a_column() {
        let source = source(&[" Ship Mode ", "Sales"]);
        assert!(source.has_column("Ship Mode"));
        assert_eq!(source.dimensions(), vec![Dimension::ShipMode]);
        assert_eq!(source.measures(), vec![Measure::Sales]);
    }
}
