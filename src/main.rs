//! EV Population Insights - Electric vehicle registration analysis
//!
//! One-shot pipeline: load the registration CSV, clean and narrow it to
//! Washington state, run the group-by/count catalog, and write each result
//! as a static SVG chart.

mod analysis;
mod charts;
mod data;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

/// Analyze the Electric Vehicle Population dataset and emit SVG charts.
#[derive(Debug, Parser)]
#[command(name = "ev-insights", version, about)]
struct Cli {
    /// Path to the registration CSV export.
    #[arg(default_value = "Electric_Vehicle_Population_Data.csv")]
    data: PathBuf,

    /// Directory the rendered charts are written to.
    #[arg(short, long, default_value = "charts")]
    out_dir: PathBuf,

    /// Also write a machine-readable summary.json next to the charts.
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let df = data::loader::load_csv(&cli.data)
        .with_context(|| format!("loading {}", cli.data.display()))?;
    log::info!("loaded {} rows x {} columns", df.height(), df.width());

    let summary = analysis::run(&df, &cli.out_dir)?;
    log::info!(
        "{} charts written to {}",
        summary.charts.len(),
        cli.out_dir.display()
    );

    if cli.summary {
        let path = cli.out_dir.join("summary.json");
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("summary written to {}", path.display());
    }

    Ok(())
}
