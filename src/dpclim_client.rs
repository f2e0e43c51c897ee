use chrono::NaiveDateTime;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::fetch_error::FetchError;

/// Default climatology API base URL
pub const DEFAULT_BASE_URL: &str = "https://public-api.meteofrance.fr/public/DPClim/v1";

const USER_AGENT: &str = concat!("rain-verdict-service/", env!("CARGO_PKG_VERSION"));
const PERIOD_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Station entry from the hourly station list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub id: String,
    #[serde(rename(deserialize = "nom"))]
    pub name: String,
    #[serde(rename(deserialize = "posteOuvert"), default)]
    pub open: bool,
    #[serde(rename(deserialize = "postePublic"), default)]
    pub public: bool,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
}

/// State of an ordered extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum DownloadStatus {
    Ready(String),
    Pending,
    AlreadyDelivered,
}

/// Client for the hourly climatology API: station list, order, download
#[derive(Clone)]
pub struct DpClimClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DpClimClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List open, public hourly stations of a departement
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn list_stations(&self, departement: u32) -> Result<Vec<StationSummary>, FetchError> {
        let url = format!("{}/liste-stations/horaire", self.base_url);
        debug!("Requesting station list from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("id-departement", departement.to_string())])
            .header("apikey", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let body = response.text().await?;
        let stations: Vec<StationSummary> = serde_json::from_str(&body).map_err(|e| {
            error!("Station list is not a JSON array of stations: {}", e);
            FetchError::InvalidResponse(format!("station list: {e}"))
        })?;

        let total = stations.len();
        let open_public: Vec<StationSummary> =
            stations.into_iter().filter(|s| s.open && s.public).collect();

        info!(
            "Departement {}: {} open public stations out of {}",
            departement,
            open_public.len(),
            total
        );
        Ok(open_public)
    }

    /// Order an hourly extract for one station and period; returns the order id
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn order_hourly(
        &self,
        station_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<String, FetchError> {
        let url = format!("{}/commande-station/horaire", self.base_url);
        let start = start.format(PERIOD_FORMAT).to_string();
        let end = end.format(PERIOD_FORMAT).to_string();
        debug!("Ordering hourly data for {} from {} to {}", station_id, start, end);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("id-station", station_id),
                ("date-deb-periode", start.as_str()),
                ("date-fin-periode", end.as_str()),
            ])
            .header("apikey", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::InvalidResponse(format!("order response: {e}")))?;

        let order_id = extract_order_id(&value).ok_or_else(|| {
            warn!("No order id in response: {}", body);
            FetchError::InvalidResponse("order response carries no order id".to_string())
        })?;

        info!("Order {} created for station {}", order_id, station_id);
        Ok(order_id)
    }

    /// Download an ordered extract
    ///
    /// 204 means the extract is still being produced, 410 that it was already delivered.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn download_order(&self, order_id: &str) -> Result<DownloadStatus, FetchError> {
        let url = format!("{}/commande/fichier", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("id-cmde", order_id)])
            .header("apikey", &self.api_key)
            .header("Accept", "text/csv,application/json")
            .send()
            .await?;

        let status = response.status();
        debug!("Download of order {} answered {}", order_id, status);

        match status {
            StatusCode::NO_CONTENT => Ok(DownloadStatus::Pending),
            StatusCode::GONE => Ok(DownloadStatus::AlreadyDelivered),
            s if s.is_success() => {
                let data = response.text().await?;
                info!("Downloaded order {} ({} bytes)", order_id, data.len());
                Ok(DownloadStatus::Ready(data))
            }
            _ => Err(Self::status_error(response).await),
        }
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::status_error(response).await)
        }
    }

    async fn status_error(response: reqwest::Response) -> FetchError {
        let status = response.status().as_u16();
        let details = response.text().await.unwrap_or_default();
        error!("Upstream API error {}: {}", status, details);
        FetchError::Status { status, details }
    }
}

/// Order id from `elaboreProduitAvecDemandeResponse.return`, then `id`, then a bare scalar
fn extract_order_id(value: &Value) -> Option<String> {
    let candidates = [
        value.pointer("/elaboreProduitAvecDemandeResponse/return"),
        value.get("id"),
        Some(value),
    ];

    candidates.into_iter().flatten().find_map(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_order_id_from_wrapped_response() {
        let value = json!({"elaboreProduitAvecDemandeResponse": {"return": "2025001234567"}});
        assert_eq!(extract_order_id(&value).as_deref(), Some("2025001234567"));
    }

    #[test]
    fn test_extract_order_id_from_id_field() {
        assert_eq!(extract_order_id(&json!({"id": 42})).as_deref(), Some("42"));
    }

    #[test]
    fn test_extract_order_id_from_scalar() {
        assert_eq!(extract_order_id(&json!("abc")).as_deref(), Some("abc"));
        assert_eq!(extract_order_id(&json!({"other": 1})), None);
    }

    #[test]
    fn test_station_summary_deserializes_upstream_names() {
        let body = r#"[{"id":"74211002","nom":"PERS-JUSSY","posteOuvert":true,"postePublic":true,"typePoste":1,"lon":6.27,"lat":46.1,"alt":485}]"#;
        let stations: Vec<StationSummary> = serde_json::from_str(body).unwrap();
        assert_eq!(stations[0].name, "PERS-JUSSY");
        assert!(stations[0].open && stations[0].public);
        assert_eq!(stations[0].alt, Some(485.0));
    }

    #[test]
    fn test_download_status_serialization() {
        let ready = serde_json::to_value(DownloadStatus::Ready("A;B".into())).unwrap();
        assert_eq!(ready, json!({"status": "ready", "data": "A;B"}));

        let pending = serde_json::to_value(DownloadStatus::Pending).unwrap();
        assert_eq!(pending, json!({"status": "pending"}));

        let delivered = serde_json::to_value(DownloadStatus::AlreadyDelivered).unwrap();
        assert_eq!(delivered, json!({"status": "already_delivered"}));
    }
}
