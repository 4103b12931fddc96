//! Order Record Module
//! Row model for the sales table plus the field selectors used for grouping.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Label shown wherever a missing categorical value is grouped.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A single row of the sales table. Every field is nullable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderRecord {
    /// Order date exactly as it appeared in the input.
    pub order_date_text: Option<String>,
    /// Parsed order date, filled by `DataProcessor::parse_dates`.
    pub order_date: Option<NaiveDate>,
    pub sales: Option<f64>,
    pub profit: Option<f64>,
    pub quantity: Option<i64>,
    pub discount: Option<f64>,
    pub segment: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub ship_mode: Option<String>,
    pub product_name: Option<String>,
    pub customer_id: Option<String>,
}

impl OrderRecord {
    /// A record survives cleaning only with a date and a sales value.
    pub fn is_complete(&self) -> bool {
        self.order_date.is_some() && self.sales.is_some()
    }

    /// Numeric value of a measure, widened to `f64`.
    pub fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Sales => self.sales,
            Measure::Profit => self.profit,
            Measure::Quantity => self.quantity.map(|q| q as f64),
            Measure::Discount => self.discount,
        }
    }

    /// Raw categorical value of a dimension.
    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        let value = match dimension {
            Dimension::Segment => &self.segment,
            Dimension::Region => &self.region,
            Dimension::Category => &self.category,
            Dimension::SubCategory => &self.sub_category,
            Dimension::ShipMode => &self.ship_mode,
            Dimension::ProductName => &self.product_name,
            Dimension::CustomerId => &self.customer_id,
        };
        value.as_deref()
    }

    /// Grouping key for a dimension; missing values become `Category::Unknown`.
    pub fn category(&self, dimension: Dimension) -> Category {
        match self.dimension(dimension) {
            Some(v) => Category::Known(v.to_string()),
            None => Category::Unknown,
        }
    }
}

/// Categorical columns of the sales table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Segment,
    Region,
    Category,
    SubCategory,
    ShipMode,
    ProductName,
    CustomerId,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Segment,
        Dimension::Region,
        Dimension::Category,
        Dimension::SubCategory,
        Dimension::ShipMode,
        Dimension::ProductName,
        Dimension::CustomerId,
    ];

    /// Column header in the input file.
    pub fn column_name(self) -> &'static str {
        match self {
            Dimension::Segment => "Segment",
            Dimension::Region => "Region",
            Dimension::Category => "Category",
            Dimension::SubCategory => "Sub-Category",
            Dimension::ShipMode => "Ship Mode",
            Dimension::ProductName => "Product Name",
            Dimension::CustomerId => "Customer ID",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Numeric columns of the sales table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Sales,
    Profit,
    Quantity,
    Discount,
}

impl Measure {
    pub const ALL: [Measure; 4] = [
        Measure::Sales,
        Measure::Profit,
        Measure::Quantity,
        Measure::Discount,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Measure::Sales => "Sales",
            Measure::Profit => "Profit",
            Measure::Quantity => "Quantity",
            Measure::Discount => "Discount",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Group key for a categorical value. Known values order before `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Known(String),
    Unknown,
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Category::Known(v) => v,
            Category::Unknown => UNKNOWN_LABEL,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calendar month key; ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_orders_chronologically_not_lexically() {
        let mut months = vec![
            YearMonth::new(2023, 10),
            YearMonth::new(2022, 12),
            YearMonth::new(2023, 2),
        ];
        months.sort();
        let labels: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["2022-12", "2023-02", "2023-10"]);
    }

    #[test]
    fn unknown_category_sorts_last() {
        let mut keys = vec![
            Category::Unknown,
            Category::Known("West".into()),
            Category::Known("East".into()),
        ];
        keys.sort();
        assert_eq!(keys[0].label(), "East");
        assert_eq!(keys[2], Category::Unknown);
        assert_eq!(keys[2].to_string(), UNKNOWN_LABEL);
    }

    #[test]
    fn quantity_measure_widens_to_float() {
        let record = OrderRecord {
            quantity: Some(3),
            ..Default::default()
        };
        assert_eq!(record.measure(Measure::Quantity), Some(3.0));
        assert_eq!(record.measure(Measure::Profit), None);
        assert_eq!(record.category(Dimension::Region), Category::Unknown);
    }
}
