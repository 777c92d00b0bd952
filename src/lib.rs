pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use config::AppConfig;
use services::{EmissionsService, ErpConnectorService};

/// Process-wide shared state: constant configuration plus the stateless
/// service objects. No per-request state survives the response.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub erp: Arc<ErpConnectorService>,
    pub emissions: Arc<EmissionsService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let emissions = EmissionsService::new(config.emission_factors.clone());
        Ok(Self {
            config: Arc::new(config),
            erp: Arc::new(ErpConnectorService::new()?),
            emissions: Arc::new(emissions),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors_origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(cors_origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/connect/:erp_type", post(handlers::erp::connect))
        .route(
            "/api/records/:erp_type/:resource_type",
            post(handlers::erp::fetch_records),
        )
        .route(
            "/api/emissions/summary",
            get(handlers::emissions::emissions_summary),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use config::{ServiceAccountConfig, SiteProfile, TransportAssumption};
    use services::emissions::EmissionFactors;

    /// State wired to an unreachable backend; enough for handler tests that
    /// must fail before (or instead of) any network call.
    pub fn app_state() -> AppState {
        let config = AppConfig {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
            service_account: Some(ServiceAccountConfig {
                instance_url: "http://127.0.0.1:9".to_string(),
                database: "mill".to_string(),
                username: "svc".to_string(),
                password: "pw".to_string(),
            }),
            site: SiteProfile {
                company: "Test Cement Co".to_string(),
                plant: "TST-01".to_string(),
                location: "Test Town".to_string(),
            },
            transport_assumption: TransportAssumption {
                tonnes: 1950.0,
                distance_km: 250.0,
            },
            emission_factors: EmissionFactors::default(),
        };
        AppState::new(config).unwrap()
    }
}
