#![allow(dead_code)]

use chrono::NaiveDate;
use rain_verdict_service::api::AppState;
use rain_verdict_service::app::Application;
use rain_verdict_service::config::Config;

/// Real-layout hourly extract for PERS-JUSSY, 2025-06-07 09h and 10h UTC
pub const JUSSY_EXTRACT: &str = include_str!("../sample-data/jussy_2025-06-07.csv");

pub const JUSSY_STATION: &str = "74211002";

pub fn target_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()
}

/// Config pointing at a mock upstream with near-instant polling
pub fn test_config(base_url: &str) -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        dpclim_base_url: base_url.to_string(),
        dpclim_api_key: "test-key".to_string(),
        download_initial_delay_ms: 1,
        download_max_delay_ms: 5,
        download_max_retries: 2,
        recent_search_capacity: 5,
        default_departement: 74,
    }
}

pub fn test_state(base_url: &str) -> AppState {
    Application::build_state(&test_config(base_url))
}
