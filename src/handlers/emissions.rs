// Emissions Summary Handler
// GET /api/emissions/summary: reads recent purchase lines through the
// deployment-level Odoo service account, keyword-aggregates them into an
// activity vector, and runs the emission-factor calculator.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::middleware::error_handling::{AppError, Result};
use crate::models::{ActivityVector, EmissionResult};
use crate::services::erp::{ConnectRequest, ErpType, ResourceType};
use crate::AppState;

/// How many purchase lines feed one summary. Matches the reporting window
/// the dashboard shows; not user-pageable.
const PURCHASE_WINDOW: u32 = 50;

#[derive(Debug, Serialize)]
pub struct EmissionsSummaryResponse {
    pub success: bool,
    pub company: String,
    pub plant: String,
    pub location: String,
    pub activity_data: ActivityVector,
    pub emissions: EmissionResult,
}

pub async fn emissions_summary(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let account = state.config.service_account.as_ref().ok_or_else(|| {
        AppError::NotConfigured(
            "Emissions summary is unavailable: no Odoo service account configured".to_string(),
        )
    })?;

    let credentials = ConnectRequest {
        instance_url: Some(account.instance_url.clone()),
        database: Some(account.database.clone()),
        username: Some(account.username.clone()),
        password: Some(account.password.clone()),
        ..Default::default()
    };

    let purchases = state
        .erp
        .fetch_raw(
            ErpType::Odoo,
            &credentials,
            ResourceType::PurchaseLines,
            PURCHASE_WINDOW,
            0,
        )
        .await?;

    let mut activity = state.emissions.aggregate_purchases(&purchases);

    // Transport is an assumed figure from configuration, not derived from
    // order data; the upstream ERP exposes no tonne-km information yet.
    activity.transport_tonnes = state.config.transport_assumption.tonnes;
    activity.transport_distance_km = state.config.transport_assumption.distance_km;

    let emissions = state.emissions.calculate(&activity);

    tracing::info!(
        purchase_lines = purchases.len(),
        total_co2_kg = emissions.total_co2_kg,
        "computed emissions summary"
    );

    Ok(Json(EmissionsSummaryResponse {
        success: true,
        company: state.config.site.company.clone(),
        plant: state.config.site.plant.clone(),
        location: state.config.site.location.clone(),
        activity_data: activity,
        emissions,
    }))
}

#[cfg(test)]
mod tests {
    use crate::{create_app, test_support};
    use axum_test::TestServer;

    #[tokio::test]
    async fn summary_without_service_account_is_unavailable() {
        let mut state = test_support::app_state();
        let mut config = (*state.config).clone();
        config.service_account = None;
        state.config = std::sync::Arc::new(config);

        let server = TestServer::new(create_app(state)).unwrap();
        let response = server.get("/api/emissions/summary").await;

        assert_eq!(response.status_code(), 503);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("service account"));
    }
}
