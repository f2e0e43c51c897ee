use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::climate::{
    classify, parse_observations, AggregatedVerdict, AnalysisWindow, CsvParseError, ParseMode,
    WeatherObservation,
};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] CsvParseError),
    #[error("Invalid analysis window: hours {start_hour}-{end_hour} (expected 0 <= start <= end <= 23)")]
    InvalidWindow { start_hour: u32, end_hour: u32 },
}

/// Raw extract plus the window to judge
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub csv: String,
    #[serde(default = "default_mode")]
    pub mode: ParseMode,
    pub date: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
}

fn default_mode() -> ParseMode {
    ParseMode::Positional
}

impl AnalysisRequest {
    pub fn window(&self) -> AnalysisWindow {
        AnalysisWindow::new(self.date, self.start_hour, self.end_hour)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub verdict: AggregatedVerdict,
    pub observations: Vec<WeatherObservation>,
    pub header_columns: usize,
    pub data_row_count: usize,
    pub skipped_rows: usize,
}

/// Parse-then-classify over an in-memory extract
#[derive(Debug, Clone, Default)]
pub struct AnalysisService;

impl AnalysisService {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_request(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        self.analyze(&request.csv, request.mode, &request.window())
    }

    #[instrument(skip(self, csv), fields(csv_len = csv.len()))]
    pub fn analyze(
        &self,
        csv: &str,
        mode: ParseMode,
        window: &AnalysisWindow,
    ) -> Result<AnalysisReport, AnalysisError> {
        if !window.is_valid() {
            return Err(AnalysisError::InvalidWindow {
                start_hour: window.start_hour,
                end_hour: window.end_hour,
            });
        }

        let parsed = parse_observations(csv, mode)?;
        let verdict = classify(&parsed.observations, window, mode);

        info!(
            "Analyzed {} records for {} {}: did_rain={}, {:.1} mm, {}",
            verdict.total_record_count,
            window.date,
            window.time_label(),
            verdict.did_rain,
            verdict.total_precipitation_mm,
            verdict.condition.label()
        );

        Ok(AnalysisReport {
            verdict,
            header_columns: parsed.header.len(),
            data_row_count: parsed.data_row_count,
            skipped_rows: parsed.skipped_rows,
            observations: parsed.observations,
        })
    }
}
