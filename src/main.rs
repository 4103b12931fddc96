//! Sales EDA - exploratory analysis of a tabular sales dataset
//!
//! Loads the order file, cleans dates and sales, prints a summary report and
//! renders the descriptive charts as PNG files.

mod charts;
mod config;
mod data;
mod stats;
mod summary;

use anyhow::{Context, Result};
use charts::{ChartReport, StaticChartRenderer};
use clap::Parser;
use config::ReportConfig;
use data::{DataLoader, DataProcessor};
use std::path::PathBuf;
use summary::{SourceInfo, SummaryReport};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Exploratory data analysis report for a sales CSV file.
#[derive(Debug, Parser)]
#[command(name = "sales_eda", version, about)]
struct Cli {
    /// Input CSV file
    input: Option<PathBuf>,

    /// JSON file with report settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text encoding of the input (WHATWG label, e.g. latin1, utf-8)
    #[arg(long)]
    encoding: Option<String>,

    /// Directory receiving the chart images
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of products kept in the rankings
    #[arg(long)]
    top_n: Option<usize>,

    /// Chart width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Chart height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Print the summary only
    #[arg(long)]
    no_charts: bool,
}

impl Cli {
    /// Settings from the config file (or defaults) with flags applied on top.
    fn into_config(self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_file(path)?,
            None => ReportConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(n) = self.top_n {
            config.top_n = n;
        }
        if let Some(w) = self.width {
            config.chart_width = w;
        }
        if let Some(h) = self.height {
            config.chart_height = h;
        }
        if self.no_charts {
            config.render_charts = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config()?;
    info!(input = %config.input.display(), encoding = %config.encoding, "startup");

    // Load & clean
    let mut loader = DataLoader::new();
    let mut records = loader
        .load(&config.input, &config.encoding)
        .with_context(|| format!("cannot load {}", config.input.display()))?;

    let bad_dates = DataProcessor::parse_dates(&mut records);
    if bad_dates > 0 {
        warn!(count = bad_dates, "order dates could not be parsed");
    }
    let records = DataProcessor::drop_incomplete(records);
    info!(raw_rows = loader.get_row_count(), kept = records.len(), "cleaning complete");

    // Summary
    let source = SourceInfo::new(loader.get_columns());
    println!("{}", SummaryReport::new(&records, &source));

    // Charts
    if !config.render_charts {
        info!("chart rendering disabled");
        return Ok(());
    }

    let renderer = StaticChartRenderer::new(&config.output_dir, config.chart_width, config.chart_height)?;
    let summary = ChartReport::new(&renderer, &records, config.top_n).render_all();
    info!(
        written = summary.written.len(),
        failed = summary.failed.len(),
        dir = %renderer.output_dir().display(),
        "report complete"
    );
    Ok(())
}
