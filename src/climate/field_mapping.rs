/// Column-to-field mapping shared by both parsing modes
///
/// Hourly extracts name their columns with short upstream codes (`RR1`, `QRR1`, `T`...).
/// The by-name parser resolves those codes through [`RECOGNIZED_COLUMNS`]; the legacy
/// positional parser relies on the fixed indices in [`positional`] instead, which only hold
/// for the full hourly header layout (`POSTE;DATE;RR1;QRR1;DRR1;...`).
use std::collections::HashMap;

/// Target field of a [`WeatherObservation`](super::WeatherObservation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationField {
    Station,
    Timestamp,
    Temperature,
    TemperatureMin,
    TemperatureMax,
    PrecipitationMm,
    PrecipitationQuality,
    Humidity,
    Pressure,
    WindSpeed,
    WindDirection,
}

/// Recognized column names (exact, case-sensitive, after trimming)
pub const RECOGNIZED_COLUMNS: &[(&str, ObservationField)] = &[
    ("POSTE", ObservationField::Station),
    ("DATE", ObservationField::Timestamp),
    ("T", ObservationField::Temperature),
    ("TN", ObservationField::TemperatureMin),
    ("TX", ObservationField::TemperatureMax),
    ("RR1", ObservationField::PrecipitationMm),
    ("QRR1", ObservationField::PrecipitationQuality),
    ("U", ObservationField::Humidity),
    ("PMER", ObservationField::Pressure),
    ("FF", ObservationField::WindSpeed),
    ("DD", ObservationField::WindDirection),
];

/// Fixed indices of the legacy detailed layout
pub mod positional {
    pub const STATION: usize = 0;
    pub const TIMESTAMP: usize = 1;
    pub const PRECIPITATION: usize = 2;
    pub const PRECIPITATION_QUALITY: usize = 3;
    pub const TEMPERATURE: usize = 10;
    pub const TEMPERATURE_MIN: usize = 14;
    pub const TEMPERATURE_MAX: usize = 18;
}

/// Look up the field a column name maps to
pub fn field_for_column(name: &str) -> Option<ObservationField> {
    let name = name.trim();
    RECOGNIZED_COLUMNS
        .iter()
        .find(|(column, _)| *column == name)
        .map(|(_, field)| *field)
}

/// Whether a column carries precipitation for the simple pathway
///
/// Matches any name containing "rr" or "precip", case-insensitive. This also catches
/// `QRR1` (quality) and `DRR1` (duration) in the full hourly layout.
pub fn is_precipitation_like(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower.contains("rr") || lower.contains("precip")
}

/// Header resolved once per parse
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub field_to_index: HashMap<ObservationField, usize>,
    /// (column name, index) of every precipitation-like column
    pub precipitation_columns: Vec<(String, usize)>,
}

impl ColumnMapping {
    pub fn analyze(headers: &[String]) -> Self {
        let mut field_to_index = HashMap::new();
        let mut precipitation_columns = Vec::new();

        for (index, header) in headers.iter().enumerate() {
            let name = header.trim();

            // First occurrence wins on duplicated headers
            if let Some(field) = field_for_column(name) {
                field_to_index.entry(field).or_insert(index);
            }

            if is_precipitation_like(name) {
                precipitation_columns.push((name.to_string(), index));
            }
        }

        // Without a DATE column the timestamp sits in the first column
        if !headers.is_empty() {
            field_to_index
                .entry(ObservationField::Timestamp)
                .or_insert(0);
        }

        Self {
            field_to_index,
            precipitation_columns,
        }
    }

    pub fn index_of(&self, field: ObservationField) -> Option<usize> {
        self.field_to_index.get(&field).copied()
    }

    pub fn has_field(&self, field: ObservationField) -> bool {
        self.field_to_index.contains_key(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(line: &str) -> Vec<String> {
        line.split(';').map(str::to_string).collect()
    }

    #[test]
    fn test_field_for_column_exact_match() {
        assert_eq!(field_for_column("RR1"), Some(ObservationField::PrecipitationMm));
        assert_eq!(field_for_column(" T "), Some(ObservationField::Temperature));
        assert_eq!(field_for_column("t"), None);
        assert_eq!(field_for_column("RR"), None);
    }

    #[test]
    fn test_is_precipitation_like() {
        assert!(is_precipitation_like("RR1"));
        assert!(is_precipitation_like("QRR1"));
        assert!(is_precipitation_like("Precipitation"));
        assert!(!is_precipitation_like("PMER"));
        assert!(!is_precipitation_like("T"));
    }

    #[test]
    fn test_column_mapping_by_name() {
        let mapping = ColumnMapping::analyze(&headers("DATE;T;RR1;U;FF;PMER"));

        assert_eq!(mapping.index_of(ObservationField::Timestamp), Some(0));
        assert_eq!(mapping.index_of(ObservationField::Temperature), Some(1));
        assert_eq!(mapping.index_of(ObservationField::PrecipitationMm), Some(2));
        assert_eq!(mapping.index_of(ObservationField::Pressure), Some(5));
        assert!(!mapping.has_field(ObservationField::Station));
        assert_eq!(mapping.precipitation_columns, vec![("RR1".to_string(), 2)]);
    }

    #[test]
    fn test_column_mapping_timestamp_falls_back_to_first_column() {
        let mapping = ColumnMapping::analyze(&headers("STAMP;RR1"));
        assert_eq!(mapping.index_of(ObservationField::Timestamp), Some(0));
    }

    #[test]
    fn test_positional_layout_matches_hourly_header() {
        let hourly = headers("POSTE;DATE;RR1;QRR1;DRR1;QDRR1;HNEIGEF;QHNEIGEF;NEIGETOT;QNEIGETOT;T;QT;TD;QTD;TN;QTN;HTN;QHTN;TX");
        assert_eq!(hourly[positional::STATION], "POSTE");
        assert_eq!(hourly[positional::TIMESTAMP], "DATE");
        assert_eq!(hourly[positional::PRECIPITATION], "RR1");
        assert_eq!(hourly[positional::PRECIPITATION_QUALITY], "QRR1");
        assert_eq!(hourly[positional::TEMPERATURE], "T");
        assert_eq!(hourly[positional::TEMPERATURE_MIN], "TN");
        assert_eq!(hourly[positional::TEMPERATURE_MAX], "TX");
    }
}
