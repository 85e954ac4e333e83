//! Offline generator: one UTC day of raw readings to a time-series JSON file.

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use solar_hex_rust::aggregator::{Aggregator, TimeWindow};
use solar_hex_rust::error::{Result, SolarHexError};
use solar_hex_rust::readings::{ReadingsFormat, load_readings_as};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "solar-generate", about = "Aggregate one UTC day of solar readings into hex cells")]
struct Args {
    /// Day to extract, YYYY-MM-DD (UTC)
    #[arg(value_parser = parse_date)]
    date: NaiveDate,

    /// Readings file (ss_id, datetime_GMT, generation_Wh), Parquet or CSV
    #[arg(long, alias = "parquet", default_value = "public/data.parquet")]
    readings: PathBuf,

    /// Readings container; inferred from the file extension when omitted
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Site metadata CSV (ss_id, latitude_rounded, longitude_rounded)
    #[arg(long, default_value = "public/metadata.csv")]
    metadata: PathBuf,

    /// Output path; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Parquet,
    Csv,
}

impl From<FormatArg> for ReadingsFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Parquet => ReadingsFormat::Parquet,
            FormatArg::Csv => ReadingsFormat::Csv,
        }
    }
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date in YYYY-MM-DD form", raw))
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SolarHexError::Configuration(format!("input file {} does not exist", path.display())))
    }
}

fn run(args: &Args) -> Result<()> {
    require_file(&args.readings)?;
    require_file(&args.metadata)?;

    let format = args
        .format
        .map(ReadingsFormat::from)
        .unwrap_or_else(|| ReadingsFormat::from_path(&args.readings));
    let readings = load_readings_as(&args.readings, &args.metadata, format)?;
    let window = TimeWindow::utc_day(args.date);
    let series = Aggregator::default().aggregate(&readings, &window);
    let json = series.to_json(args.pretty)?;

    match &args.out {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("Wrote {} time buckets to {}", series.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            if matches!(e, SolarHexError::Configuration(_)) {
                eprintln!(
                    "Usage: solar-generate <YYYY-MM-DD> [--readings PATH] [--format parquet|csv] [--metadata PATH] [--out PATH] [--pretty]"
                );
            }
            ExitCode::FAILURE
        }
    }
}
