//! Stats module - descriptive statistics

mod calculator;

pub use calculator::{BoxStats, StatsCalculator};
