//! Measure the ice layer in every photo of a directory and write the result table

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use icering::utils::{TableFormat, write_table};
use icering::{PhotoSeries, PipelineConfig};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Parquet,
    Json,
}

impl From<Format> for TableFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Parquet => TableFormat::Parquet,
            Format::Json => TableFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Measure ice-ring boundaries in a photo series")]
struct Args {
    /// Directory holding the photos
    photo_dir: PathBuf,

    /// Pipeline settings as JSON (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output table path
    #[arg(long, default_value = "ice_measurements.parquet")]
    output: PathBuf,

    /// Output table format
    #[arg(long, value_enum, default_value_t = Format::Parquet)]
    format: Format,

    /// Sort rows by capture time instead of file order
    #[arg(long, default_value_t = false)]
    sort_by_time: bool,

    /// Smooth profiles with a moving average of 2N+1 samples before baseline estimation
    #[arg(long)]
    smooth: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.smooth.is_some() {
        config.smoothing_half_window = args.smooth;
    }

    let series = PhotoSeries::open(&args.photo_dir, config)
        .with_context(|| format!("opening photo directory {}", args.photo_dir.display()))?;
    print!("{}", series.get_summary());

    let mut table = series.measure().context("measuring photo series")?;
    if args.sort_by_time {
        table.sort_by_timestamp();
    }

    write_table(&table, &args.output, args.format.into())
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("wrote {} rows to {}", table.len(), args.output.display());

    let failed = table.failures().count();
    println!(
        "Measured {} of {} photos ({} failed) -> {}",
        table.len() - failed,
        table.len(),
        failed,
        args.output.display()
    );
    Ok(())
}
