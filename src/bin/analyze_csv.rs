use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use rain_verdict_service::climate::{AnalysisWindow, ParseMode, Precipitation};
use rain_verdict_service::services::AnalysisService;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Fixed column indices of the full hourly layout (quality-gated)
    Positional,
    /// Columns resolved by name (ungated)
    ByName,
}

impl From<Mode> for ParseMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Positional => ParseMode::Positional,
            Mode::ByName => ParseMode::ByName,
        }
    }
}

#[derive(Parser)]
#[command(name = "analyze-csv")]
#[command(about = "Decide whether it rained from an hourly climatology CSV extract", long_about = None)]
struct Cli {
    /// CSV file to analyze (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Target date (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,

    /// First hour of the window (inclusive)
    #[arg(long, default_value = "9")]
    start_hour: u32,

    /// Last hour of the window (inclusive)
    #[arg(long, default_value = "10")]
    end_hour: u32,

    /// Parsing mode
    #[arg(long, value_enum, default_value = "positional")]
    mode: Mode,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let csv = match &cli.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let window = AnalysisWindow::new(cli.date, cli.start_hour, cli.end_hour);
    let report = AnalysisService::new().analyze(&csv, cli.mode.into(), &window)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let verdict = &report.verdict;
    println!(
        "Station {} on {} {}",
        verdict.station.as_deref().unwrap_or("unknown"),
        window.date,
        window.time_label()
    );
    println!(
        "  Records: {} ({} in window, {} valid, {} skipped)",
        verdict.total_record_count,
        verdict.in_window_count,
        verdict.valid_measurement_count,
        report.skipped_rows
    );
    println!(
        "  Precipitation: {:.1} mm (measured {:.1} mm)",
        verdict.total_precipitation_mm, verdict.measured_precipitation_mm
    );
    if let Some(t) = verdict.average_temperature {
        println!("  Average temperature: {t:.1} °C");
    }
    if let Some(confidence) = verdict.confidence {
        println!("  Confidence: {confidence:?}");
    }
    println!(
        "  Verdict: {} ({})",
        if verdict.did_rain { "RAIN" } else { "NO RAIN" },
        verdict.condition.label()
    );

    println!("\nObservations:");
    for obs in &report.observations {
        let time = obs
            .timestamp
            .map(|ts| ts.format("%Y-%m-%d %H:00").to_string())
            .unwrap_or_else(|| "?".to_string());
        let precipitation = match obs.precipitation {
            Some(Precipitation::Measured(mm)) => format!("{mm:.1} mm"),
            Some(Precipitation::Defaulted) => "unreadable".to_string(),
            None => "-".to_string(),
        };
        let quality = obs
            .precipitation_quality
            .map(|q| q.label())
            .unwrap_or_else(|| "-".to_string());
        println!("  {time}  {precipitation:>10}  {quality}");
    }

    Ok(())
}
