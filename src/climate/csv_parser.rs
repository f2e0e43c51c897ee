/// Hourly climatology CSV parser
///
/// Input is the raw extract text: `;`-separated columns, `\n`-separated rows, a header on
/// the first line and no quoting. Two modes cover the two header schemas that carry the
/// same semantics:
/// - [`ParseMode::Positional`]: fixed indices of the full hourly layout
/// - [`ParseMode::ByName`]: columns resolved through the recognized name table
///
/// Rows with fewer fields than the header are dropped; nothing else aborts a parse.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::field_mapping::{positional, ColumnMapping, ObservationField};
use super::observation::{
    parse_timestamp, ColumnReading, Precipitation, QualityCode, WeatherObservation,
};
use crate::utils::parse_decimal;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsvParseError {
    #[error("Insufficient CSV data: expected a header and at least one data row, got {lines} line(s)")]
    InsufficientData { lines: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseMode {
    Positional,
    ByName,
}

/// Result of a parse: kept rows plus what was dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCsv {
    pub header: Vec<String>,
    pub observations: Vec<WeatherObservation>,
    pub data_row_count: usize,
    pub skipped_rows: usize,
}

/// Parse a raw extract into observations
#[instrument(skip(text), fields(text_len = text.len()))]
pub fn parse_observations(text: &str, mode: ParseMode) -> Result<ParsedCsv, CsvParseError> {
    let lines: Vec<&str> = text.trim().lines().collect();
    if lines.len() < 2 {
        warn!("CSV has {} line(s), need a header and a data row", lines.len());
        return Err(CsvParseError::InsufficientData { lines: lines.len() });
    }

    let header: Vec<String> = lines[0].split(';').map(|h| h.trim().to_string()).collect();
    let mapping = match mode {
        ParseMode::ByName => Some(ColumnMapping::analyze(&header)),
        ParseMode::Positional => None,
    };
    debug!("Header has {} columns", header.len());

    let mut observations = Vec::with_capacity(lines.len() - 1);
    let mut skipped_rows = 0;

    for (row_idx, line) in lines[1..].iter().enumerate() {
        let values: Vec<&str> = line.split(';').collect();

        if values.len() < header.len() {
            debug!(
                "Row {} has {} fields, header has {} (skipping)",
                row_idx + 1,
                values.len(),
                header.len()
            );
            skipped_rows += 1;
            continue;
        }

        let observation = match &mapping {
            Some(mapping) => parse_row_by_name(&values, mapping),
            None => parse_row_positional(&values),
        };
        observations.push(observation);
    }

    if skipped_rows > 0 {
        warn!(
            "Skipped {} short rows out of {}",
            skipped_rows,
            lines.len() - 1
        );
    }
    debug!("Parsed {} observations", observations.len());

    Ok(ParsedCsv {
        header,
        observations,
        data_row_count: lines.len() - 1,
        skipped_rows,
    })
}

fn non_empty(value: Option<&&str>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn decimal_at(values: &[&str], index: usize) -> Option<f64> {
    values.get(index).and_then(|v| parse_decimal(v))
}

fn parse_row_positional(values: &[&str]) -> WeatherObservation {
    let timestamp = values
        .get(positional::TIMESTAMP)
        .and_then(|v| parse_timestamp(v));

    // The precipitation and quality columns are always considered present here
    let precipitation = Precipitation::from_field(
        values.get(positional::PRECIPITATION).copied().unwrap_or(""),
    );
    let quality = QualityCode::parse_or_missing(
        values
            .get(positional::PRECIPITATION_QUALITY)
            .copied()
            .unwrap_or(""),
    );

    WeatherObservation {
        station: non_empty(values.get(positional::STATION)),
        timestamp,
        precipitation: Some(precipitation),
        precipitation_quality: Some(quality),
        temperature: decimal_at(values, positional::TEMPERATURE),
        temperature_min: decimal_at(values, positional::TEMPERATURE_MIN),
        temperature_max: decimal_at(values, positional::TEMPERATURE_MAX),
        humidity: None,
        pressure: None,
        wind_speed: None,
        wind_direction: None,
        precipitation_columns: Vec::new(),
    }
}

fn parse_row_by_name(values: &[&str], mapping: &ColumnMapping) -> WeatherObservation {
    let raw = |field: ObservationField| {
        mapping
            .index_of(field)
            .and_then(|idx| values.get(idx).copied())
    };
    let decimal = |field: ObservationField| raw(field).and_then(parse_decimal);

    let precipitation_columns = mapping
        .precipitation_columns
        .iter()
        .filter_map(|(column, idx)| {
            let value = values.get(*idx).and_then(|v| parse_decimal(v))?;
            Some(ColumnReading {
                column: column.clone(),
                value,
            })
        })
        .collect();

    WeatherObservation {
        station: raw(ObservationField::Station)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        timestamp: raw(ObservationField::Timestamp).and_then(parse_timestamp),
        precipitation: raw(ObservationField::PrecipitationMm).map(Precipitation::from_field),
        precipitation_quality: raw(ObservationField::PrecipitationQuality)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .map(QualityCode::from_code),
        temperature: decimal(ObservationField::Temperature),
        temperature_min: decimal(ObservationField::TemperatureMin),
        temperature_max: decimal(ObservationField::TemperatureMax),
        humidity: decimal(ObservationField::Humidity),
        pressure: decimal(ObservationField::Pressure),
        wind_speed: decimal(ObservationField::WindSpeed),
        wind_direction: decimal(ObservationField::WindDirection),
        precipitation_columns,
    }
}
