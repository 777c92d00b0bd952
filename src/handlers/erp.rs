// ERP Connection API Handlers
// POST /api/connect/{erp_type} authenticates and confirms the identity;
// POST /api/records/{erp_type}/{resource_type} authenticates, fetches one
// page, and returns it normalized. Credentials live in the request body for
// exactly one request chain and are never stored server-side.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::error_handling::{AppError, Result};
use crate::models::CanonicalOrder;
use crate::services::erp::{ConnectRequest, ErpType, ResourceType};
use crate::utils::log_sanitizer::sanitize_for_log;
use crate::AppState;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RecordsRequest {
    #[serde(flatten)]
    pub credentials: ConnectRequest,

    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub success: bool,
    pub message: String,
    pub authenticated_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub success: bool,
    pub data: Vec<CanonicalOrder>,
    pub count: usize,
    pub limit: u32,
    pub offset: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// Connect-only: authenticate against the declared backend and echo the
/// confirmed identity.
pub async fn connect(
    State(state): State<AppState>,
    Path(erp_type): Path<String>,
    payload: std::result::Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let erp = parse_erp_type(&erp_type)?;
    let Json(request) = payload?;

    let outcome = state.erp.connect(erp, &request).await?;

    Ok(Json(ConnectResponse {
        success: true,
        message: outcome.message,
        authenticated_user: outcome.authenticated_user,
        uid: outcome.uid,
    }))
}

/// Connect and fetch one page of records, normalized into the canonical
/// order shape.
pub async fn fetch_records(
    State(state): State<AppState>,
    Path((erp_type, resource_type)): Path<(String, String)>,
    payload: std::result::Result<Json<RecordsRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let erp = parse_erp_type(&erp_type)?;
    let resource = ResourceType::parse(&resource_type).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unknown resource type: {}. Must be 'sales' or 'purchases'",
            sanitize_for_log(&resource_type)
        ))
    })?;
    let Json(request) = payload?;
    request.validate()?;

    let limit = request.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = request.offset.unwrap_or(0);

    let page = state
        .erp
        .fetch_records(erp, &request.credentials, resource, limit, offset)
        .await?;

    Ok(Json(RecordsResponse {
        success: true,
        data: page.data,
        count: page.count,
        limit: page.limit,
        offset: page.offset,
    }))
}

fn parse_erp_type(raw: &str) -> Result<ErpType> {
    ErpType::parse(raw).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid ERP type: {}. Must be 'odoo' or 'erpnext'",
            sanitize_for_log(raw)
        ))
    })
}

// ============================================================================
// Tests
// ============================================================================
