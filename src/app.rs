use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::dpclim_client::DpClimClient;
use crate::recent_searches::RecentSearchStore;
use crate::services::{AnalysisService, WeatherCheckService};

/// Application with its spawned HTTP server
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build the application state from config
    ///
    /// Split out from [`Application::build`] so tests can drive the router without
    /// binding a socket.
    pub fn build_state(config: &Config) -> AppState {
        let dpclim_client =
            DpClimClient::with_base_url(config.dpclim_base_url.clone(), config.dpclim_api_key.clone());
        let recent_searches = RecentSearchStore::new(config.recent_search_capacity);
        let analysis_service = AnalysisService::new();
        let weather_check_service = WeatherCheckService::new(
            dpclim_client.clone(),
            analysis_service.clone(),
            recent_searches.clone(),
            config.poll_policy(),
        );

        AppState {
            analysis_service,
            weather_check_service,
            dpclim_client,
            recent_searches,
            default_departement: config.default_departement,
        }
    }

    /// Build and initialize the application, then spawn the HTTP server
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");
        info!(
            "Upstream API: {} (poll every {} ms up to {} ms, {} retries)",
            config.dpclim_base_url,
            config.download_initial_delay_ms,
            config.download_max_delay_ms,
            config.download_max_retries
        );

        let app_state = Self::build_state(&config);
        let app = create_router(app_state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
