use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::climate::QualityCode;
use crate::dpclim_client::{DownloadStatus, DpClimClient, StationSummary};
use crate::fetch_error::FetchError;
use crate::recent_searches::{RecentSearch, RecentSearchStore};
use crate::services::{
    AnalysisError, AnalysisReport, AnalysisRequest, AnalysisService, WeatherCheckError,
    WeatherCheckRequest, WeatherCheckResult, WeatherCheckService,
};
use crate::utils::extract_station_id;

#[derive(Clone)]
pub struct AppState {
    pub analysis_service: AnalysisService,
    pub weather_check_service: WeatherCheckService,
    pub dpclim_client: DpClimClient,
    pub recent_searches: RecentSearchStore,
    pub default_departement: u32,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct QualityCodeResponse {
    pub code: i32,
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct StationQuery {
    pub departement: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct StationListResponse {
    pub departement: u32,
    pub total_stations: usize,
    pub stations: Vec<StationSummary>,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub station: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/analysis", post(analyze))
        .route("/quality-codes/{code}", get(get_quality_code))
        .route("/stations", get(list_stations))
        .route("/orders", post(create_order))
        .route("/orders/{order_id}", get(download_order))
        .route("/weather-check", post(weather_check))
        .route(
            "/recent-searches",
            get(list_recent_searches).delete(clear_recent_searches),
        )
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

fn fetch_error_response(e: &FetchError) -> ApiError {
    let status = match e.status_code() {
        Some(code) => StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
        None => StatusCode::BAD_GATEWAY,
    };
    api_error(status, e.to_string())
}

fn analysis_error_response(e: &AnalysisError) -> ApiError {
    match e {
        AnalysisError::Parse(_) => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        AnalysisError::InvalidWindow { .. } => api_error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state, request), fields(mode = ?request.mode, date = %request.date))]
async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    debug!("Analyzing {} bytes of CSV", request.csv.len());
    let report = state
        .analysis_service
        .analyze_request(&request)
        .map_err(|e| {
            warn!("Analysis rejected: {}", e);
            analysis_error_response(&e)
        })?;

    info!(
        "Analysis complete: {} records, did_rain={}",
        report.verdict.total_record_count, report.verdict.did_rain
    );
    Ok(Json(report))
}

#[instrument]
async fn get_quality_code(Path(code): Path<i32>) -> Json<QualityCodeResponse> {
    let quality = QualityCode::from_code(code);
    Json(QualityCodeResponse {
        code,
        label: quality.label(),
    })
}

#[instrument(skip(state))]
async fn list_stations(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<StationListResponse>, ApiError> {
    let departement = query.departement.unwrap_or(state.default_departement);
    debug!("Listing stations for departement {}", departement);

    let stations = state
        .dpclim_client
        .list_stations(departement)
        .await
        .map_err(|e| {
            error!("Failed to list stations for departement {}: {}", departement, e);
            fetch_error_response(&e)
        })?;

    Ok(Json(StationListResponse {
        departement,
        total_stations: stations.len(),
        stations,
    }))
}

#[instrument(skip(state))]
async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let station_id = extract_station_id(&request.station).map_err(|e| {
        warn!("Rejected station '{}': {}", request.station, e);
        api_error(StatusCode::BAD_REQUEST, e)
    })?;
    if request.end < request.start {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Order period ends before it starts",
        ));
    }

    let order_id = state
        .dpclim_client
        .order_hourly(&station_id, request.start, request.end)
        .await
        .map_err(|e| {
            error!("Failed to order data for station {}: {}", station_id, e);
            fetch_error_response(&e)
        })?;

    info!("Created order {} for station {}", order_id, station_id);
    Ok(Json(OrderResponse { order_id }))
}

#[instrument(skip(state), fields(order_id = %order_id))]
async fn download_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<DownloadStatus>, ApiError> {
    let status = state
        .dpclim_client
        .download_order(&order_id)
        .await
        .map_err(|e| {
            error!("Failed to download order {}: {}", order_id, e);
            fetch_error_response(&e)
        })?;

    Ok(Json(status))
}

#[instrument(skip(state))]
async fn weather_check(
    State(state): State<AppState>,
    Json(request): Json<WeatherCheckRequest>,
) -> Result<Json<WeatherCheckResult>, ApiError> {
    let result = state
        .weather_check_service
        .check(&request)
        .await
        .map_err(|e| {
            error!("Weather check failed for {}: {}", request.station, e);
            match &e {
                WeatherCheckError::InvalidStation(_) => {
                    api_error(StatusCode::BAD_REQUEST, e.to_string())
                }
                WeatherCheckError::Fetch(fetch) => fetch_error_response(fetch),
                WeatherCheckError::Analysis(analysis) => analysis_error_response(analysis),
            }
        })?;

    Ok(Json(result))
}

#[instrument(skip(state))]
async fn list_recent_searches(State(state): State<AppState>) -> Json<Vec<RecentSearch>> {
    Json(state.recent_searches.list().await)
}

#[instrument(skip(state))]
async fn clear_recent_searches(State(state): State<AppState>) -> StatusCode {
    state.recent_searches.clear().await;
    info!("Cleared recent searches");
    StatusCode::NO_CONTENT
}
