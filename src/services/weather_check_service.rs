use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::climate::{AggregatedVerdict, AnalysisWindow, Condition, ParseMode};
use crate::dpclim_client::{DownloadStatus, DpClimClient};
use crate::fetch_error::FetchError;
use crate::recent_searches::{NewSearch, RecentSearchStore, SearchOutcome};
use crate::services::analysis_service::{AnalysisError, AnalysisService};
use crate::utils::extract_station_id;

#[derive(Debug, thiserror::Error)]
pub enum WeatherCheckError {
    #[error("Invalid station: {0}")]
    InvalidStation(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// How long to wait for an ordered extract
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: usize,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            max_retries: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherCheckRequest {
    /// Station id, optionally with its label ("74211002 - PERS-JUSSY")
    pub station: String,
    /// Place name shown in recent searches; defaults to the station id
    pub place: Option<String>,
    pub date: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Api,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataIntegrity {
    pub algorithm: &'static str,
    pub hash: String,
    pub retrieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherCheckResult {
    pub place: String,
    pub station_id: String,
    pub order_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub data_source: DataSource,
    pub did_rain: bool,
    pub condition: Condition,
    pub temperature: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
    pub message: Option<String>,
    pub verdict: Option<AggregatedVerdict>,
    pub integrity: Option<DataIntegrity>,
}

#[derive(Debug)]
enum PollError {
    Pending,
    Fetch(FetchError),
}

/// Order → wait → download → analyze flow for one station and window
#[derive(Clone)]
pub struct WeatherCheckService {
    client: DpClimClient,
    analysis_service: AnalysisService,
    recent_searches: RecentSearchStore,
    poll_policy: PollPolicy,
}

impl WeatherCheckService {
    pub fn new(
        client: DpClimClient,
        analysis_service: AnalysisService,
        recent_searches: RecentSearchStore,
        poll_policy: PollPolicy,
    ) -> Self {
        Self {
            client,
            analysis_service,
            recent_searches,
            poll_policy,
        }
    }

    pub fn client(&self) -> &DpClimClient {
        &self.client
    }

    #[instrument(skip(self), fields(station = %request.station, date = %request.date))]
    pub async fn check(
        &self,
        request: &WeatherCheckRequest,
    ) -> Result<WeatherCheckResult, WeatherCheckError> {
        let window = AnalysisWindow::new(request.date, request.start_hour, request.end_hour);
        if !window.is_valid() {
            return Err(AnalysisError::InvalidWindow {
                start_hour: window.start_hour,
                end_hour: window.end_hour,
            }
            .into());
        }

        let station_id = extract_station_id(&request.station)
            .map_err(|e| WeatherCheckError::InvalidStation(format!("{}: {e}", request.station)))?;
        let place = request.place.clone().unwrap_or_else(|| station_id.clone());

        // Window bounds cover whole hours: [start:00:00, end:59:59]
        let (start, end) = match (
            window.date.and_hms_opt(window.start_hour, 0, 0),
            window.date.and_hms_opt(window.end_hour, 59, 59),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(AnalysisError::InvalidWindow {
                    start_hour: window.start_hour,
                    end_hour: window.end_hour,
                }
                .into())
            }
        };

        let order_id = self.client.order_hourly(&station_id, start, end).await?;
        let status = self.wait_for_extract(&order_id).await?;

        let result = match status {
            DownloadStatus::Ready(csv) => {
                let integrity = DataIntegrity {
                    algorithm: "SHA-256",
                    hash: sha256_hex(&csv),
                    retrieved_at: Utc::now(),
                };
                debug!("Extract {} hash {}", order_id, integrity.hash);

                let report = self
                    .analysis_service
                    .analyze(&csv, ParseMode::ByName, &window)?;
                let first = report
                    .observations
                    .iter()
                    .find(|o| window.contains(o));
                let verdict = report.verdict.clone();

                WeatherCheckResult {
                    place: place.clone(),
                    station_id: station_id.clone(),
                    order_id,
                    date: window.date,
                    time: window.time_label(),
                    data_source: DataSource::Api,
                    did_rain: verdict.did_rain,
                    condition: verdict.condition,
                    temperature: verdict.average_temperature,
                    precipitation_mm: Some(verdict.measured_precipitation_mm),
                    humidity: first.and_then(|o| o.humidity),
                    wind_speed: first.and_then(|o| o.wind_speed),
                    pressure: first.and_then(|o| o.pressure),
                    message: None,
                    verdict: Some(verdict),
                    integrity: Some(integrity),
                }
            }
            DownloadStatus::Pending => unavailable(
                &place,
                &station_id,
                order_id,
                &window,
                "extract still being produced",
            ),
            DownloadStatus::AlreadyDelivered => unavailable(
                &place,
                &station_id,
                order_id,
                &window,
                "extract already delivered",
            ),
        };

        let outcome = (result.data_source == DataSource::Api).then(|| SearchOutcome {
            did_rain: result.did_rain,
            temperature: result.temperature,
            precipitation_mm: result.precipitation_mm,
        });
        self.recent_searches
            .record(NewSearch {
                place,
                station_id,
                date: result.date,
                time: result.time.clone(),
                outcome,
            })
            .await;

        info!(
            "Weather check for {} on {} {}: {:?}, did_rain={}",
            result.place, result.date, result.time, result.data_source, result.did_rain
        );
        Ok(result)
    }

    /// Poll the download endpoint with exponential backoff while the extract is pending
    ///
    /// Returns `Pending` once the retry budget is spent.
    async fn wait_for_extract(&self, order_id: &str) -> Result<DownloadStatus, FetchError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.poll_policy.initial_delay)
            .with_max_delay(self.poll_policy.max_delay)
            .with_factor(2.0)
            .with_max_times(self.poll_policy.max_retries)
            .with_jitter();

        let attempt = || async move {
            match self.client.download_order(order_id).await {
                Ok(DownloadStatus::Pending) => Err(PollError::Pending),
                Ok(other) => Ok(other),
                Err(e) => Err(PollError::Fetch(e)),
            }
        };

        let outcome = attempt
            .retry(backoff)
            .when(|e| matches!(e, PollError::Pending))
            .notify(|_, delay| {
                debug!("Order {} still pending, retrying in {:?}", order_id, delay);
            })
            .await;

        match outcome {
            Ok(status) => Ok(status),
            Err(PollError::Pending) => Ok(DownloadStatus::Pending),
            Err(PollError::Fetch(e)) => Err(e),
        }
    }
}

fn unavailable(
    place: &str,
    station_id: &str,
    order_id: String,
    window: &AnalysisWindow,
    message: &str,
) -> WeatherCheckResult {
    warn!("Order {} unavailable: {}", order_id, message);

    WeatherCheckResult {
        place: place.to_string(),
        station_id: station_id.to_string(),
        order_id,
        date: window.date,
        time: window.time_label(),
        data_source: DataSource::Unavailable,
        did_rain: false,
        condition: Condition::NoData,
        temperature: None,
        precipitation_mm: None,
        humidity: None,
        wind_speed: None,
        pressure: None,
        message: Some(message.to_string()),
        verdict: None,
        integrity: None,
    }
}

fn sha256_hex(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_default_poll_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(2));
        assert_eq!(policy.max_retries, 5);
    }
}
