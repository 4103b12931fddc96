//! CSV Data Loader Module
//! Decodes the legacy-encoded sales file, reads it with Polars and coerces
//! each row into an `OrderRecord`.

use crate::data::record::{Dimension, Measure, OrderRecord};
use encoding_rs::Encoding;
use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const ORDER_DATE_COLUMN: &str = "Order Date";

/// Columns without which no record could ever survive cleaning.
pub const REQUIRED_COLUMNS: [&str; 2] = [ORDER_DATE_COLUMN, "Sales"];

/// Cell contents read as null, mirroring the usual CSV NA markers.
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Required column missing: {0}")]
    MissingColumn(String),
    #[error("No data loaded")]
    NoData,
}

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Read `path` decoded with `encoding` and return every row as a record.
    ///
    /// Dates are kept as text here; `DataProcessor::parse_dates` converts them.
    pub fn load(
        &mut self,
        path: impl AsRef<Path>,
        encoding: &str,
    ) -> Result<Vec<OrderRecord>, LoaderError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "read input file");

        self.load_bytes(&bytes, encoding)?;
        self.to_records()
    }

    /// Decode raw bytes and parse them as CSV, every column as text.
    pub fn load_bytes(&mut self, bytes: &[u8], encoding: &str) -> Result<&DataFrame, LoaderError> {
        let text = Self::decode(bytes, encoding)?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
            .finish()?;

        for required in REQUIRED_COLUMNS {
            if Self::resolve_column(&df, required).is_none() {
                return Err(LoaderError::MissingColumn(required.to_string()));
            }
        }

        debug!(rows = df.height(), columns = df.width(), "parsed CSV");
        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Decode with the given WHATWG label; malformed sequences are replaced.
    fn decode(bytes: &[u8], label: &str) -> Result<String, LoaderError> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| LoaderError::UnknownEncoding(label.to_string()))?;

        let (text, used, had_errors) = encoding.decode(bytes);
        if used != encoding {
            debug!(requested = encoding.name(), used = used.name(), "byte order mark overrides encoding");
        }
        if had_errors {
            warn!(encoding = used.name(), "input contained malformed sequences, replaced");
        }
        Ok(text.into_owned())
    }

    /// Convert the loaded frame into records, coercing each field.
    pub fn to_records(&self) -> Result<Vec<OrderRecord>, LoaderError> {
        let df = self.df.as_ref().ok_or(LoaderError::NoData)?;

        let dates = Self::text_column(df, ORDER_DATE_COLUMN)?;
        let sales = Self::text_column(df, Measure::Sales.column_name())?;
        let profit = Self::text_column(df, Measure::Profit.column_name())?;
        let quantity = Self::text_column(df, Measure::Quantity.column_name())?;
        let discount = Self::text_column(df, Measure::Discount.column_name())?;
        let segment = Self::text_column(df, Dimension::Segment.column_name())?;
        let region = Self::text_column(df, Dimension::Region.column_name())?;
        let category = Self::text_column(df, Dimension::Category.column_name())?;
        let sub_category = Self::text_column(df, Dimension::SubCategory.column_name())?;
        let ship_mode = Self::text_column(df, Dimension::ShipMode.column_name())?;
        let product_name = Self::text_column(df, Dimension::ProductName.column_name())?;
        let customer_id = Self::text_column(df, Dimension::CustomerId.column_name())?;

        let records: Vec<OrderRecord> = (0..df.height())
            .map(|i| OrderRecord {
                order_date_text: Self::cell(&dates, i),
                order_date: None,
                sales: Self::cell(&sales, i).as_deref().and_then(parse_float),
                profit: Self::cell(&profit, i).as_deref().and_then(parse_float),
                quantity: Self::cell(&quantity, i).as_deref().and_then(parse_integer),
                discount: Self::cell(&discount, i).as_deref().and_then(parse_float),
                segment: Self::cell(&segment, i),
                region: Self::cell(&region, i),
                category: Self::cell(&category, i),
                sub_category: Self::cell(&sub_category, i),
                ship_mode: Self::cell(&ship_mode, i),
                product_name: Self::cell(&product_name, i),
                customer_id: Self::cell(&customer_id, i),
            })
            .collect();

        info!(records = records.len(), "coerced rows into records");
        Ok(records)
    }

    /// Actual header for `name`, ignoring surrounding whitespace.
    fn resolve_column(df: &DataFrame, name: &str) -> Option<PlSmallStr> {
        df.get_column_names()
            .into_iter()
            .find(|c| c.trim() == name)
            .cloned()
    }

    /// Column as nullable text, or `None` when the column is absent.
    fn text_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>, LoaderError> {
        let Some(actual) = Self::resolve_column(df, name) else {
            return Ok(None);
        };

        let column = df.column(actual.as_str())?.cast(&DataType::String)?;
        let values = column.str()?.into_iter().map(clean_token).collect();
        Ok(Some(values))
    }

    fn cell(column: &Option<Vec<Option<String>>>, i: usize) -> Option<String> {
        column.as_ref().and_then(|values| values.get(i).cloned().flatten())
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.trim().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }
}

fn clean_token(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if NULL_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Numeric coercion; unparseable or non-finite input becomes null.
pub fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer coercion; accepts integral floats such as "3.0".
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        parse_float(text)
            .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
            .map(|v| v as i64)
    })
}
