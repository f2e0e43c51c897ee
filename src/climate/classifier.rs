/// Rain verdicts over parsed observations
///
/// Two aggregation rules exist side by side and are kept distinct on purpose:
/// - detailed (positional) pathway: only quality code 1 rows count, over the whole table
/// - simple (by-name) pathway: every precipitation-like column of in-window rows is
///   summed with no quality gating
///
/// They disagree on ungated inputs (a 5 mm reading flagged erroneous rains in the simple
/// pathway only). Callers pick the pathway through [`ParseMode`].
///
/// The condition label always thresholds on `measured_precipitation_mm`. In the simple
/// pathway that is the in-window `RR1` amount, since the precipitation-like sum also picks
/// up quality flag columns such as `QRR1`.
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::csv_parser::ParseMode;
use super::observation::WeatherObservation;

/// Target date and inclusive hour range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub date: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl AnalysisWindow {
    pub fn new(date: NaiveDate, start_hour: u32, end_hour: u32) -> Self {
        Self {
            date,
            start_hour,
            end_hour,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start_hour <= self.end_hour && self.end_hour <= 23
    }

    pub fn contains(&self, observation: &WeatherObservation) -> bool {
        match (observation.date(), observation.hour()) {
            (Some(date), Some(hour)) => {
                date == self.date && (self.start_hour..=self.end_hour).contains(&hour)
            }
            _ => false,
        }
    }

    /// "09:00-10:00" style label
    pub fn time_label(&self) -> String {
        format!("{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "heavy precipitation")]
    HeavyPrecipitation,
    #[serde(rename = "moderate precipitation")]
    ModeratePrecipitation,
    #[serde(rename = "light precipitation")]
    LightPrecipitation,
    #[serde(rename = "warm and dry")]
    WarmAndDry,
    #[serde(rename = "cold and dry")]
    ColdAndDry,
    #[serde(rename = "dry")]
    Dry,
    #[serde(rename = "no data")]
    NoData,
}

impl Condition {
    /// Breakpoints: > 5 mm heavy, > 1 mm moderate, > 0 mm light, then > 25 °C warm and
    /// < 5 °C cold
    pub fn from_measurements(precipitation_mm: f64, temperature: Option<f64>) -> Self {
        if precipitation_mm > 5.0 {
            Self::HeavyPrecipitation
        } else if precipitation_mm > 1.0 {
            Self::ModeratePrecipitation
        } else if precipitation_mm > 0.0 {
            Self::LightPrecipitation
        } else {
            match temperature {
                Some(t) if t > 25.0 => Self::WarmAndDry,
                Some(t) if t < 5.0 => Self::ColdAndDry,
                _ => Self::Dry,
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HeavyPrecipitation => "heavy precipitation",
            Self::ModeratePrecipitation => "moderate precipitation",
            Self::LightPrecipitation => "light precipitation",
            Self::WarmAndDry => "warm and dry",
            Self::ColdAndDry => "cold and dry",
            Self::Dry => "dry",
            Self::NoData => "no data",
        }
    }
}

/// One contribution to a rain verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationDetail {
    pub timestamp: Option<NaiveDateTime>,
    pub column: String,
    pub value_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedVerdict {
    pub mode: ParseMode,
    pub window: AnalysisWindow,
    pub station: Option<String>,
    pub total_record_count: usize,
    pub in_window_count: usize,
    pub valid_measurement_count: usize,
    pub precipitation_event_count: usize,
    pub total_precipitation_mm: f64,
    /// Millimetres the condition label is derived from
    pub measured_precipitation_mm: f64,
    pub did_rain: bool,
    pub condition: Condition,
    /// Only set by the detailed pathway
    pub confidence: Option<Confidence>,
    pub average_temperature: Option<f64>,
    pub details: Vec<PrecipitationDetail>,
}

pub fn classify(
    observations: &[WeatherObservation],
    window: &AnalysisWindow,
    mode: ParseMode,
) -> AggregatedVerdict {
    match mode {
        ParseMode::Positional => classify_detailed(observations, window),
        ParseMode::ByName => classify_simple(observations, window),
    }
}

/// Quality-gated aggregation over every observation
///
/// The caller is expected to have narrowed the table to the window already; the window
/// only feeds `in_window_count` and the report.
#[instrument(skip(observations), fields(count = observations.len()))]
pub fn classify_detailed(
    observations: &[WeatherObservation],
    window: &AnalysisWindow,
) -> AggregatedVerdict {
    let mut valid_measurement_count = 0;
    let mut precipitation_event_count = 0;
    let mut total_precipitation_mm = 0.0;
    let mut details = Vec::new();

    for observation in observations {
        let is_valid = observation
            .precipitation_quality
            .map(|q| q.is_valid())
            .unwrap_or(false);
        if !is_valid {
            continue;
        }

        valid_measurement_count += 1;
        // Negative readings count as no rain
        let mm = observation.precipitation_mm().max(0.0);
        total_precipitation_mm += mm;
        if mm > 0.0 {
            precipitation_event_count += 1;
            details.push(PrecipitationDetail {
                timestamp: observation.timestamp,
                column: "RR1".to_string(),
                value_mm: mm,
            });
        }
    }

    let total_record_count = observations.len();
    let did_rain = total_precipitation_mm > 0.0;
    let confidence = if valid_measurement_count == total_record_count {
        Confidence::High
    } else {
        Confidence::Moderate
    };
    let average_temperature = average(observations.iter().filter_map(|o| o.temperature));
    let condition = if observations.is_empty() {
        Condition::NoData
    } else {
        Condition::from_measurements(total_precipitation_mm, average_temperature)
    };

    debug!(
        "Detailed verdict: {} valid of {} records, {:.1} mm",
        valid_measurement_count, total_record_count, total_precipitation_mm
    );

    AggregatedVerdict {
        mode: ParseMode::Positional,
        window: *window,
        station: first_station(observations.iter()),
        total_record_count,
        in_window_count: observations.iter().filter(|o| window.contains(o)).count(),
        valid_measurement_count,
        precipitation_event_count,
        total_precipitation_mm: normalize_zero(total_precipitation_mm),
        measured_precipitation_mm: normalize_zero(total_precipitation_mm),
        did_rain,
        condition,
        confidence: Some(confidence),
        average_temperature,
        details,
    }
}

/// Ungated aggregation of precipitation-like columns over in-window observations
#[instrument(skip(observations), fields(count = observations.len()))]
pub fn classify_simple(
    observations: &[WeatherObservation],
    window: &AnalysisWindow,
) -> AggregatedVerdict {
    let in_window: Vec<&WeatherObservation> =
        observations.iter().filter(|o| window.contains(o)).collect();

    let mut total_precipitation_mm = 0.0;
    let mut precipitation_event_count = 0;
    let mut details = Vec::new();

    for observation in &in_window {
        let row_total = observation.precipitation_like_total();
        if row_total > 0.0 {
            precipitation_event_count += 1;
        }
        total_precipitation_mm += row_total;

        details.extend(
            observation
                .precipitation_columns
                .iter()
                .filter(|reading| reading.value > 0.0)
                .map(|reading| PrecipitationDetail {
                    timestamp: observation.timestamp,
                    column: reading.column.clone(),
                    value_mm: reading.value,
                }),
        );
    }

    let valid_measurement_count = in_window
        .iter()
        .filter(|o| o.precipitation_quality.map(|q| q.is_valid()).unwrap_or(false))
        .count();
    let average_temperature = average(in_window.iter().filter_map(|o| o.temperature));
    let did_rain = total_precipitation_mm > 0.0;

    // Extracts without an RR1 column fall back to the precipitation-like sum
    let has_rr1 = in_window.iter().any(|o| o.precipitation.is_some());
    let measured_precipitation_mm = if has_rr1 {
        in_window
            .iter()
            .map(|o| o.precipitation_mm().max(0.0))
            .sum::<f64>()
    } else {
        total_precipitation_mm
    };
    let condition = if in_window.is_empty() {
        Condition::NoData
    } else {
        Condition::from_measurements(measured_precipitation_mm, average_temperature)
    };

    debug!(
        "Simple verdict: {} of {} rows in window, {:.1} mm",
        in_window.len(),
        observations.len(),
        total_precipitation_mm
    );

    AggregatedVerdict {
        mode: ParseMode::ByName,
        window: *window,
        station: first_station(in_window.iter().copied()),
        total_record_count: observations.len(),
        in_window_count: in_window.len(),
        valid_measurement_count,
        precipitation_event_count,
        total_precipitation_mm: normalize_zero(total_precipitation_mm),
        measured_precipitation_mm: normalize_zero(measured_precipitation_mm),
        did_rain,
        condition,
        confidence: None,
        average_temperature,
        details,
    }
}

fn first_station<'a>(mut observations: impl Iterator<Item = &'a WeatherObservation>) -> Option<String> {
    observations.find_map(|o| o.station.clone())
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Normalize -0.0 to 0.0 for cleaner API responses
fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}
