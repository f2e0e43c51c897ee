pub mod analysis_service;
pub mod weather_check_service;

pub use analysis_service::{AnalysisError, AnalysisReport, AnalysisRequest, AnalysisService};
pub use weather_check_service::{
    DataSource, PollPolicy, WeatherCheckError, WeatherCheckRequest, WeatherCheckResult,
    WeatherCheckService,
};
