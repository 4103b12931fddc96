//! Chart Report Module
//! Computes each aggregate from the cleaned records and renders it, in the
//! fixed report order. One failing chart does not stop the others.

use crate::charts::plotter::ColorScale;
use crate::charts::renderer::{Axes, ChartError, HeatmapData, Orientation, StaticChartRenderer};
use crate::data::{Category, DataProcessor, Dimension, Measure, OrderRecord, ProcessorError};
use crate::stats::{BoxStats, StatsCalculator};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ReportChartError {
    #[error(transparent)]
    Aggregate(#[from] ProcessorError),
    #[error(transparent)]
    Render(#[from] ChartError),
}

/// Outcome of a full chart pass.
#[derive(Debug, Default)]
pub struct ChartSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

/// Renders the report charts from one immutable record set.
pub struct ChartReport<'a> {
    renderer: &'a StaticChartRenderer,
    records: &'a [OrderRecord],
    top_n: usize,
}

fn labelled(pairs: Vec<(Category, f64)>) -> Vec<(String, f64)> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

impl<'a> ChartReport<'a> {
    pub fn new(renderer: &'a StaticChartRenderer, records: &'a [OrderRecord], top_n: usize) -> Self {
        Self {
            renderer,
            records,
            top_n,
        }
    }

    /// Render every chart; failures are logged and collected.
    pub fn render_all(&self) -> ChartSummary {
        let charts: [(&str, fn(&Self) -> Result<PathBuf, ReportChartError>); 11] = [
            ("monthly sales trend", Self::monthly_trend),
            ("top products by sales", Self::top_products_by_sales),
            ("top products by quantity", Self::top_products_by_quantity),
            ("sales by segment", Self::segment_sales),
            ("segment sales share", Self::segment_share),
            ("sales by region", Self::region_sales),
            ("sales by category", Self::category_sales),
            ("region/category heatmap", Self::region_category_heatmap),
            ("sales by category box plot", Self::category_sales_box),
            ("profit by region box plot", Self::region_profit_box),
            ("correlation heatmap", Self::correlation_heatmap),
        ];

        let mut summary = ChartSummary::default();
        for (name, render) in charts {
            match render(self) {
                Ok(path) => {
                    info!(chart = name, path = %path.display(), "chart written");
                    summary.written.push(path);
                }
                Err(e) => {
                    warn!(chart = name, error = %e, "chart skipped");
                    summary.failed.push((name.to_string(), e.to_string()));
                }
            }
        }
        summary
    }

    fn monthly_trend(&self) -> Result<PathBuf, ReportChartError> {
        let points: Vec<(String, f64)> = DataProcessor::aggregate_by_month(self.records)?
            .into_iter()
            .map(|(month, total)| (month.to_string(), total))
            .collect();
        Ok(self.renderer.line_chart(
            "monthly_sales_trend.png",
            "Monthly Sales Trend",
            Axes { x: "Month", y: "Sales" },
            &points,
        )?)
    }

    fn top_products(&self, measure: Measure) -> Result<Vec<(String, f64)>, ProcessorError> {
        DataProcessor::aggregate_by_dimension(
            self.records,
            Dimension::ProductName,
            measure,
            Some(self.top_n),
        )
        .map(labelled)
    }

    fn top_products_by_sales(&self) -> Result<PathBuf, ReportChartError> {
        let bars = self.top_products(Measure::Sales)?;
        Ok(self.renderer.bar_chart(
            "top_products_by_sales.png",
            &format!("Top {} Products by Total Sales", self.top_n),
            Axes { x: "Sales", y: "Product" },
            &bars,
            Orientation::Horizontal,
        )?)
    }

    fn top_products_by_quantity(&self) -> Result<PathBuf, ReportChartError> {
        let bars = self.top_products(Measure::Quantity)?;
        Ok(self.renderer.bar_chart(
            "top_products_by_quantity.png",
            &format!("Top {} Products by Quantity Sold", self.top_n),
            Axes { x: "Quantity Sold", y: "Product" },
            &bars,
            Orientation::Horizontal,
        )?)
    }

    fn sales_by(&self, dimension: Dimension) -> Result<Vec<(String, f64)>, ProcessorError> {
        DataProcessor::aggregate_by_dimension(self.records, dimension, Measure::Sales, None).map(labelled)
    }

    fn segment_sales(&self) -> Result<PathBuf, ReportChartError> {
        let bars = self.sales_by(Dimension::Segment)?;
        Ok(self.renderer.bar_chart(
            "sales_by_segment.png",
            "Sales by Customer Segment",
            Axes { x: "Segment", y: "Total Sales" },
            &bars,
            Orientation::Vertical,
        )?)
    }

    fn segment_share(&self) -> Result<PathBuf, ReportChartError> {
        let slices = self.sales_by(Dimension::Segment)?;
        Ok(self
            .renderer
            .pie_chart("segment_sales_share.png", "Sales Share by Segment", &slices)?)
    }

    fn region_sales(&self) -> Result<PathBuf, ReportChartError> {
        let bars = self.sales_by(Dimension::Region)?;
        Ok(self.renderer.bar_chart(
            "sales_by_region.png",
            "Sales by Region",
            Axes { x: "Region", y: "Total Sales" },
            &bars,
            Orientation::Vertical,
        )?)
    }

    fn category_sales(&self) -> Result<PathBuf, ReportChartError> {
        let bars = self.sales_by(Dimension::Category)?;
        Ok(self.renderer.bar_chart(
            "sales_by_category.png",
            "Sales by Category",
            Axes { x: "Category", y: "Total Sales" },
            &bars,
            Orientation::Vertical,
        )?)
    }

    fn region_category_heatmap(&self) -> Result<PathBuf, ReportChartError> {
        let table = DataProcessor::pivot(self.records, Dimension::Region, Dimension::Category, Measure::Sales)?;
        let rows: Vec<String> = table.rows.iter().map(|c| c.to_string()).collect();
        let columns: Vec<String> = table.columns.iter().map(|c| c.to_string()).collect();
        let (min, max) = table.value_range().unwrap_or((0.0, 1.0));

        let title = format!("{} Heatmap: {} vs {}", table.measure, table.row_field, table.col_field);

        Ok(self.renderer.heatmap(
            "region_category_heatmap.png",
            &title,
            Axes {
                x: table.col_field.column_name(),
                y: table.row_field.column_name(),
            },
            &HeatmapData {
                rows: &rows,
                columns: &columns,
                cells: &table.cells,
            },
            ColorScale::Sequential { min, max },
            |v| format!("{:.0}", v),
        )?)
    }

    fn box_stats(&self, dimension: Dimension, measure: Measure) -> Result<Vec<BoxStats>, ProcessorError> {
        if self.records.is_empty() {
            return Err(ProcessorError::EmptyDataset { operation: "box plot" });
        }
        Ok(DataProcessor::values_by_group(self.records, dimension, measure)
            .into_iter()
            .filter_map(|(group, values)| StatsCalculator::box_stats(group, &values))
            .collect())
    }

    fn category_sales_box(&self) -> Result<PathBuf, ReportChartError> {
        let boxes = self.box_stats(Dimension::Category, Measure::Sales)?;
        Ok(self.renderer.box_plot(
            "sales_by_category_boxplot.png",
            "Sales Distribution by Category",
            Axes { x: "Category", y: "Sales" },
            &boxes,
        )?)
    }

    fn region_profit_box(&self) -> Result<PathBuf, ReportChartError> {
        let boxes = self.box_stats(Dimension::Region, Measure::Profit)?;
        Ok(self.renderer.box_plot(
            "profit_by_region_boxplot.png",
            "Profit Distribution by Region",
            Axes { x: "Region", y: "Profit" },
            &boxes,
        )?)
    }

    fn correlation_heatmap(&self) -> Result<PathBuf, ReportChartError> {
        let matrix = DataProcessor::correlation_matrix(self.records, &Measure::ALL)?;
        let names: Vec<String> = matrix.fields.iter().map(|m| m.to_string()).collect();

        Ok(self.renderer.heatmap(
            "correlation_heatmap.png",
            "Correlation Heatmap: Sales, Profit, Quantity, Discount",
            Axes { x: "", y: "" },
            &HeatmapData {
                rows: &names,
                columns: &names,
                cells: &matrix.values,
            },
            ColorScale::Diverging,
            |v| format!("{:.2}", v),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_records(n: usize) -> Vec<OrderRecord> {
        let segments = ["Consumer", "Corporate", "Home Office"];
        let regions = ["West", "East", "Central", "South"];
        let categories = ["Furniture", "Technology", "Office Supplies"];
        (0..n)
            .map(|i| {
                let sales = 20.0 + (i * 37 % 500) as f64;
                let discount = [0.0, 0.1, 0.2, 0.5][i % 4];
                OrderRecord {
                    order_date: NaiveDate::from_ymd_opt(2023, (i % 12) as u32 + 1, (i % 28) as u32 + 1),
                    sales: Some(sales),
                    profit: Some(sales * (0.3 - discount) - (i % 7) as f64),
                    quantity: Some((i % 9) as i64 + 1),
                    discount: Some(discount),
                    segment: Some(segments[i % 3].to_string()),
                    region: Some(regions[i % 4].to_string()),
                    category: Some(categories[i % 3].to_string()),
                    product_name: Some(format!("Product {}", i % 15)),
                    customer_id: Some(format!("CU-{}", i % 20)),
                    ..Default::default()
                }
            })
            .collect()
    }

    #[test]
    fn realistic_record_set_writes_every_chart() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = StaticChartRenderer::new(dir.path(), 800, 500).unwrap();
        let records = sample_records(60);
        let summary = ChartReport::new(&renderer, &records, 10).render_all();

        assert!(summary.failed.is_empty(), "failed: {:?}", summary.failed);
        assert_eq!(summary.written.len(), 11);
        for path in &summary.written {
            assert!(path.starts_with(dir.path()));
            let size = std::fs::metadata(path).unwrap().len();
            assert!(size > 0, "{} is empty", path.display());
        }
        assert!(dir.path().join("monthly_sales_trend.png").exists());
        assert!(dir.path().join("correlation_heatmap.png").exists());
    }

    #[test]
    fn empty_record_set_fails_every_chart_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = StaticChartRenderer::new(dir.path(), 400, 300).unwrap();
        let summary = ChartReport::new(&renderer, &[], 10).render_all();

        assert!(summary.written.is_empty());
        assert_eq!(summary.failed.len(), 11);
        assert!(summary.failed.iter().all(|(_, e)| e.contains("no records survived cleaning")));
    }
}
