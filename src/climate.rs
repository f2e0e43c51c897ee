// Climatology extract module
//
// This module turns hourly climatology extracts (semicolon-delimited CSV with a header
// row) into typed observations and derives rain verdicts from them.
// - field_mapping: recognized column names and the legacy positional layout
// - csv_parser: positional and by-name parsing
// - classifier: quality-gated detailed pathway and ungated simple pathway

pub mod classifier;
pub mod csv_parser;
pub mod field_mapping;
pub mod observation;

pub use classifier::{
    classify, classify_detailed, classify_simple, AggregatedVerdict, AnalysisWindow, Condition,
    Confidence, PrecipitationDetail,
};
pub use csv_parser::{parse_observations, CsvParseError, ParseMode, ParsedCsv};
pub use field_mapping::ObservationField;
pub use observation::{ColumnReading, Precipitation, QualityCode, WeatherObservation};
