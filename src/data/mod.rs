//! Data module - CSV loading, cleaning and aggregation

mod dates;
mod loader;
mod processor;
mod record;

pub use loader::{DataLoader, ORDER_DATE_COLUMN};
pub use processor::{DataProcessor, ProcessorError};
pub use record::{Category, Dimension, Measure, OrderRecord};
