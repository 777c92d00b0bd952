// Connection Orchestrator
// Validates the credential payload for the declared ERP type, delegates to
// the matching client, and reconciles raw backend records into the
// canonical response contract. Per request the flow is strictly
// validate -> authenticate -> fetch -> normalize; a failure at any stage
// aborts the chain, there is no partial success.

use serde::Deserialize;
use thiserror::Error;

use super::{
    ErpNextAuth, ErpNextClient, ErpNextError, ErpType, OdooClient, OdooCredentials, OdooError,
    RawRecord, ResourceType,
};
use crate::models::CanonicalOrder;
use crate::services::normalizer;
use crate::utils::log_sanitizer::sanitize_for_log;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ErpServiceError {
    /// Missing/malformed input; rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the credentials, or the login call itself
    /// failed server-side.
    #[error("{0}")]
    Auth(String),

    /// Network failure, timeout, or an error payload after successful
    /// transport.
    #[error("{0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, ErpServiceError>;

impl From<OdooError> for ErpServiceError {
    fn from(err: OdooError) -> Self {
        match err {
            OdooError::ConfigError(msg) => ErpServiceError::Validation(msg),
            OdooError::AuthError(msg) => ErpServiceError::Auth(msg),
            OdooError::RpcError(msg) => ErpServiceError::Upstream(msg),
            OdooError::ApiError(status, msg) => {
                ErpServiceError::Upstream(format!("Odoo returned HTTP {}: {}", status, msg))
            }
            OdooError::NetworkError(e) => ErpServiceError::Upstream(unreachable_message("Odoo", &e)),
        }
    }
}

impl From<ErpNextError> for ErpServiceError {
    fn from(err: ErpNextError) -> Self {
        match err {
            ErpNextError::ConfigError(msg) => ErpServiceError::Validation(msg),
            ErpNextError::AuthError(msg) => ErpServiceError::Auth(msg),
            ErpNextError::InvalidResponse(msg) => ErpServiceError::Upstream(msg),
            ErpNextError::ApiError(status, msg) => {
                ErpServiceError::Upstream(format!("ERPNext returned HTTP {}: {}", status, msg))
            }
            ErpNextError::NetworkError(e) => {
                ErpServiceError::Upstream(unreachable_message("ERPNext", &e))
            }
        }
    }
}

/// Generic transport failures get an actionable instruction instead of a
/// raw exception string.
fn unreachable_message(backend: &str, err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!(
            "{} did not respond in time; check that the instance is reachable and try again",
            backend
        )
    } else {
        format!(
            "Could not reach the {} instance; check the URL and that the backend is online",
            backend
        )
    }
}

// ============================================================================
// Request / Response Shapes
// ============================================================================

/// Credential payload as it arrives over HTTP. All fields optional at the
/// wire level; which ones are required depends on the declared ERP type and
/// is enforced before any network call. Nothing is ever silently defaulted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectRequest {
    pub instance_url: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

/// Authenticated-identity confirmation for connect-only calls.
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    pub authenticated_user: String,
    pub uid: Option<i64>,
    pub message: String,
}

/// One full page of normalized records plus the bounds actually used.
#[derive(Debug, Clone)]
pub struct RecordsPage {
    pub data: Vec<CanonicalOrder>,
    pub count: usize,
    pub limit: u32,
    pub offset: u32,
}

// ============================================================================
// Connector Service
// ============================================================================

pub struct ErpConnectorService {
    odoo: OdooClient,
    erpnext: ErpNextClient,
}

impl ErpConnectorService {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            odoo: OdooClient::new()?,
            erpnext: ErpNextClient::new()?,
        })
    }

    /// Authenticate only; confirms the identity without fetching anything.
    pub async fn connect(
        &self,
        erp_type: ErpType,
        request: &ConnectRequest,
    ) -> Result<ConnectOutcome> {
        match erp_type {
            ErpType::Odoo => {
                let credentials = odoo_credentials(request)?;
                tracing::info!(
                    instance = %sanitize_for_log(&credentials.instance_url),
                    user = %sanitize_for_log(&credentials.username),
                    "connecting to Odoo"
                );
                let session = self.odoo.authenticate(&credentials).await?;
                Ok(ConnectOutcome {
                    authenticated_user: credentials.username,
                    uid: Some(session.uid),
                    message: "Successfully connected to Odoo".to_string(),
                })
            }
            ErpType::ErpNext => {
                let (instance_url, auth) = erpnext_parts(request)?;
                tracing::info!(
                    instance = %sanitize_for_log(&instance_url),
                    "connecting to ERPNext"
                );
                let session = self.erpnext.authenticate(&instance_url, &auth).await?;
                Ok(ConnectOutcome {
                    authenticated_user: session.authenticated_user,
                    uid: None,
                    message: "Successfully connected to ERPNext".to_string(),
                })
            }
        }
    }

    /// Authenticate, then fetch one raw page. The fetch is only issued
    /// after authentication resolves; there are no speculative calls.
    pub async fn fetch_raw(
        &self,
        erp_type: ErpType,
        request: &ConnectRequest,
        resource: ResourceType,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RawRecord>> {
        match erp_type {
            ErpType::Odoo => {
                let credentials = odoo_credentials(request)?;
                let session = self.odoo.authenticate(&credentials).await?;
                let records = self
                    .odoo
                    .search_read(
                        &session,
                        resource.odoo_model(),
                        resource.odoo_fields(),
                        limit,
                        offset,
                    )
                    .await?;
                Ok(records)
            }
            ErpType::ErpNext => {
                let (instance_url, auth) = erpnext_parts(request)?;
                let session = self.erpnext.authenticate(&instance_url, &auth).await?;
                let records = self
                    .erpnext
                    .list_resource(
                        &session,
                        resource.erpnext_doctype(),
                        resource.erpnext_fields(),
                        limit,
                        offset,
                    )
                    .await?;
                Ok(records)
            }
        }
    }

    /// Full chain for the records endpoints: fetch one raw page and
    /// normalize every record into the canonical shape.
    pub async fn fetch_records(
        &self,
        erp_type: ErpType,
        request: &ConnectRequest,
        resource: ResourceType,
        limit: u32,
        offset: u32,
    ) -> Result<RecordsPage> {
        let raw = self
            .fetch_raw(erp_type, request, resource, limit, offset)
            .await?;

        let data: Vec<CanonicalOrder> = raw.iter().map(normalizer::normalize).collect();
        tracing::info!(
            erp = erp_type.as_str(),
            count = data.len(),
            limit,
            offset,
            "fetched and normalized records"
        );

        Ok(RecordsPage {
            count: data.len(),
            data,
            limit,
            offset,
        })
    }
}

// ============================================================================
// Credential Validation
// ============================================================================

fn required<'a>(
    missing: &mut Vec<&'static str>,
    name: &'static str,
    value: &'a Option<String>,
) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(name);
            ""
        }
    }
}

fn odoo_credentials(request: &ConnectRequest) -> Result<OdooCredentials> {
    let mut missing = Vec::new();
    let instance_url = required(&mut missing, "instance_url", &request.instance_url);
    let database = required(&mut missing, "database", &request.database);
    let username = required(&mut missing, "username", &request.username);
    let password = required(&mut missing, "password", &request.password);

    if !missing.is_empty() {
        return Err(ErpServiceError::Validation(format!(
            "Missing required fields for odoo: {}",
            missing.join(", ")
        )));
    }

    Ok(OdooCredentials {
        instance_url: instance_url.to_string(),
        database: database.to_string(),
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn erpnext_parts(request: &ConnectRequest) -> Result<(String, ErpNextAuth)> {
    let mut missing = Vec::new();
    let instance_url = required(&mut missing, "instance_url", &request.instance_url);

    // Key/secret takes precedence when either half is present; mixing the
    // two schemes is treated as the token scheme with a missing half rather
    // than silently falling back to password auth.
    let auth = if request.api_key.is_some() || request.api_secret.is_some() {
        let api_key = required(&mut missing, "api_key", &request.api_key);
        let api_secret = required(&mut missing, "api_secret", &request.api_secret);
        ErpNextAuth::Token {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        }
    } else if request.username.is_some() || request.password.is_some() {
        let username = required(&mut missing, "username", &request.username);
        let password = required(&mut missing, "password", &request.password);
        ErpNextAuth::Password {
            username: username.to_string(),
            password: password.to_string(),
        }
    } else {
        return Err(ErpServiceError::Validation(
            "Missing credentials for erpnext: provide api_key/api_secret or username/password"
                .to_string(),
        ));
    };

    if !missing.is_empty() {
        return Err(ErpServiceError::Validation(format!(
            "Missing required fields for erpnext: {}",
            missing.join(", ")
        )));
    }

    Ok((instance_url.to_string(), auth))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn odoo_request() -> ConnectRequest {
        ConnectRequest {
            instance_url: Some("https://mill.odoo.com".to_string()),
            database: Some("mill".to_string()),
            username: Some("svc".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn odoo_request_with_all_fields_validates() {
        let creds = odoo_credentials(&odoo_request()).unwrap();
        assert_eq!(creds.database, "mill");
    }

    #[test]
    fn missing_odoo_password_is_named_in_the_error() {
        let request = ConnectRequest {
            password: None,
            ..odoo_request()
        };
        let err = odoo_credentials(&request).unwrap_err();
        match err {
            ErpServiceError::Validation(msg) => {
                assert!(msg.contains("password"));
                assert!(!msg.contains("username,"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let request = ConnectRequest {
            database: Some("".to_string()),
            ..odoo_request()
        };
        assert!(matches!(
            odoo_credentials(&request),
            Err(ErpServiceError::Validation(_))
        ));
    }

    #[test]
    fn erpnext_prefers_token_scheme_and_requires_both_halves() {
        let request = ConnectRequest {
            instance_url: Some("https://erp.example.com".to_string()),
            api_key: Some("key".to_string()),
            // Password fields present too, but a dangling api_key must not
            // silently fall back to password auth.
            username: Some("user".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        };
        let err = erpnext_parts(&request).unwrap_err();
        assert!(matches!(err, ErpServiceError::Validation(msg) if msg.contains("api_secret")));
    }

    #[test]
    fn erpnext_accepts_either_scheme() {
        let token = ConnectRequest {
            instance_url: Some("https://erp.example.com".to_string()),
            api_key: Some("key".to_string()),
            api_secret: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            erpnext_parts(&token).unwrap().1,
            ErpNextAuth::Token { .. }
        ));

        let password = ConnectRequest {
            instance_url: Some("https://erp.example.com".to_string()),
            username: Some("user".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            erpnext_parts(&password).unwrap().1,
            ErpNextAuth::Password { .. }
        ));
    }

    #[test]
    fn erpnext_with_no_scheme_at_all_is_rejected() {
        let request = ConnectRequest {
            instance_url: Some("https://erp.example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            erpnext_parts(&request),
            Err(ErpServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_network() {
        // Port 9 (discard) is not listening; if validation leaked through
        // to a network call this would error differently or hang.
        let service = ErpConnectorService::new().unwrap();
        let request = ConnectRequest {
            instance_url: Some("http://127.0.0.1:9".to_string()),
            database: Some("db".to_string()),
            username: Some("user".to_string()),
            password: None,
            ..Default::default()
        };

        let err = service.connect(ErpType::Odoo, &request).await.unwrap_err();
        assert!(matches!(err, ErpServiceError::Validation(_)));
    }
}
