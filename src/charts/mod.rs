//! Charts module - Static chart rendering

mod plotter;
mod renderer;
mod report;

pub use renderer::StaticChartRenderer;
pub use report::ChartReport;
