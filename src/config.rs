use std::env;
use std::time::Duration;

use crate::dpclim_client::DEFAULT_BASE_URL;
use crate::recent_searches::DEFAULT_CAPACITY;
use crate::services::PollPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub dpclim_base_url: String,
    pub dpclim_api_key: String,
    pub download_initial_delay_ms: u64,
    pub download_max_delay_ms: u64,
    pub download_max_retries: usize,
    pub recent_search_capacity: usize,
    pub default_departement: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            dpclim_base_url: env::var("DPCLIM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            dpclim_api_key: env::var("DPCLIM_API_KEY")?,
            download_initial_delay_ms: env::var("DOWNLOAD_INITIAL_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
            download_max_delay_ms: env::var("DOWNLOAD_MAX_DELAY_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30000),
            download_max_retries: env::var("DOWNLOAD_MAX_RETRIES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            recent_search_capacity: env::var("RECENT_SEARCH_CAPACITY")
                .unwrap_or_else(|_| DEFAULT_CAPACITY.to_string())
                .parse()
                .unwrap_or(DEFAULT_CAPACITY),
            default_departement: env::var("DEFAULT_DEPARTEMENT")
                .unwrap_or_else(|_| "74".to_string())
                .parse()
                .unwrap_or(74),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            initial_delay: Duration::from_millis(self.download_initial_delay_ms),
            max_delay: Duration::from_millis(self.download_max_delay_ms),
            max_retries: self.download_max_retries,
        }
    }
}
