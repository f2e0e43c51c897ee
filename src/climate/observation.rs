use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;

/// Measurement quality flag attached to upstream values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityCode {
    Valid,
    Doubtful,
    Erroneous,
    Missing,
    Other(i32),
}

impl QualityCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Valid,
            2 => Self::Doubtful,
            3 => Self::Erroneous,
            9 => Self::Missing,
            other => Self::Other(other),
        }
    }

    /// Parse a raw quality field; blank or unparseable means missing (9)
    pub fn parse_or_missing(value: &str) -> Self {
        value
            .trim()
            .parse::<i32>()
            .map(Self::from_code)
            .unwrap_or(Self::Missing)
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Valid => 1,
            Self::Doubtful => 2,
            Self::Erroneous => 3,
            Self::Missing => 9,
            Self::Other(code) => *code,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn label(&self) -> String {
        match self {
            Self::Valid => "valid".to_string(),
            Self::Doubtful => "doubtful".to_string(),
            Self::Erroneous => "erroneous".to_string(),
            Self::Missing => "missing".to_string(),
            Self::Other(code) => format!("code {code}"),
        }
    }
}

impl fmt::Display for QualityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for QualityCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

/// Precipitation reading of a row whose precipitation column exists
///
/// `Defaulted` covers blank or unparseable source values: it aggregates as 0 mm but is
/// kept apart from a confirmed `Measured(0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "mm", rename_all = "snake_case")]
pub enum Precipitation {
    Measured(f64),
    Defaulted,
}

impl Precipitation {
    pub fn from_field(value: &str) -> Self {
        crate::utils::parse_decimal(value)
            .map(Self::Measured)
            .unwrap_or(Self::Defaulted)
    }

    pub fn amount_mm(&self) -> f64 {
        match self {
            Self::Measured(mm) => *mm,
            Self::Defaulted => 0.0,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Measured(_))
    }
}

/// Value of one precipitation-like column, kept for the simple pathway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReading {
    pub column: String,
    pub value: f64,
}

/// One parsed data row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherObservation {
    pub station: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub precipitation: Option<Precipitation>,
    pub precipitation_quality: Option<QualityCode>,
    pub temperature: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub precipitation_columns: Vec<ColumnReading>,
}

impl WeatherObservation {
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }

    pub fn hour(&self) -> Option<u32> {
        self.timestamp.map(|ts| ts.hour())
    }

    /// Precipitation in mm, 0 when the column is absent or the value unreadable
    pub fn precipitation_mm(&self) -> f64 {
        self.precipitation.map(|p| p.amount_mm()).unwrap_or(0.0)
    }

    /// Sum of the positive precipitation-like column values of this row
    pub fn precipitation_like_total(&self) -> f64 {
        self.precipitation_columns
            .iter()
            .map(|reading| reading.value)
            .filter(|value| *value > 0.0)
            .sum()
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an observation timestamp
///
/// Accepts the compact `YYYYMMDDHH` form of hourly extracts and ISO-8601 date-times
/// (optional seconds, optional trailing `Z`).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value[0..4].parse::<i32>().ok()?;
        let month = value[4..6].parse::<u32>().ok()?;
        let day = value[6..8].parse::<u32>().ok()?;
        let hour = value[8..10].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0);
    }

    let value = value.strip_suffix('Z').unwrap_or(value);
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_code_labels() {
        assert_eq!(QualityCode::from_code(1).label(), "valid");
        assert_eq!(QualityCode::from_code(2).label(), "doubtful");
        assert_eq!(QualityCode::from_code(3).label(), "erroneous");
        assert_eq!(QualityCode::from_code(9).label(), "missing");
        assert_eq!(QualityCode::from_code(5).label(), "code 5");
        assert_eq!(QualityCode::from_code(-1).to_string(), "code -1");
    }

    #[test]
    fn test_quality_code_defaults_to_missing() {
        assert_eq!(QualityCode::parse_or_missing(""), QualityCode::Missing);
        assert_eq!(QualityCode::parse_or_missing("x"), QualityCode::Missing);
        assert_eq!(QualityCode::parse_or_missing(" 1 "), QualityCode::Valid);
    }

    #[test]
    fn test_precipitation_defaulted_counts_as_zero() {
        let blank = Precipitation::from_field("");
        assert_eq!(blank, Precipitation::Defaulted);
        assert_eq!(blank.amount_mm(), 0.0);
        assert!(!blank.is_confirmed());

        let zero = Precipitation::from_field("0,0");
        assert_eq!(zero, Precipitation::Measured(0.0));
        assert!(zero.is_confirmed());
    }

    #[test]
    fn test_parse_compact_timestamp() {
        let ts = parse_timestamp("2025060709").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2025, 6, 7).unwrap());
        assert_eq!(ts.hour(), 9);
    }

    #[test]
    fn test_parse_iso_timestamps() {
        for raw in [
            "2025-06-07T09:00",
            "2025-06-07T09:00:00",
            "2025-06-07T09:00:00Z",
            "2025-06-07 09:00",
        ] {
            let ts = parse_timestamp(raw).unwrap_or_else(|| panic!("failed on {raw}"));
            assert_eq!(ts.hour(), 9, "{raw}");
        }
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2025061309x").is_none());
        assert!(parse_timestamp("2025139909").is_none());
        assert!(parse_timestamp("2025060725").is_none());
    }

    #[test]
    fn test_precipitation_like_total_ignores_non_positive() {
        let obs = WeatherObservation {
            station: None,
            timestamp: None,
            precipitation: None,
            precipitation_quality: None,
            temperature: None,
            temperature_min: None,
            temperature_max: None,
            humidity: None,
            pressure: None,
            wind_speed: None,
            wind_direction: None,
            precipitation_columns: vec![
                ColumnReading { column: "RR1".into(), value: 1.5 },
                ColumnReading { column: "QRR1".into(), value: 1.0 },
                ColumnReading { column: "DRR1".into(), value: -2.0 },
            ],
        };
        assert_eq!(obs.precipitation_like_total(), 2.5);
    }
}
