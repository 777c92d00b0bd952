// Odoo JSON-RPC Client
// Speaks the external API at {instance}/jsonrpc: "common.login" to
// authenticate, "object.execute_kw" + search_read to fetch records.
// Odoo's external API is stateless per call, so the session echoes the full
// credential tuple instead of holding a token.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::{RawRecord, RecordSource};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum OdooError {
    #[error("Odoo API error ({0}): {1}")]
    ApiError(StatusCode, String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Transport succeeded (HTTP 200) but the RPC body carried an `error`
    /// object; the message is the server-provided one.
    #[error("Odoo RPC error: {0}")]
    RpcError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, OdooError>;

// ============================================================================
// Credentials & Session
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct OdooCredentials {
    pub instance_url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl OdooCredentials {
    pub fn validate(&self) -> Result<()> {
        if self.instance_url.is_empty() {
            return Err(OdooError::ConfigError("instance_url is required".to_string()));
        }
        if self.database.is_empty() {
            return Err(OdooError::ConfigError("database is required".to_string()));
        }
        if self.username.is_empty() {
            return Err(OdooError::ConfigError("username is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(OdooError::ConfigError("password is required".to_string()));
        }
        Ok(())
    }
}

/// Authenticated identity plus the credential tuple every subsequent
/// `execute_kw` call must carry. Lives for one request chain, never stored.
#[derive(Debug, Clone)]
pub struct OdooSession {
    pub uid: i64,
    pub credentials: OdooCredentials,
}

// ============================================================================
// Odoo Client
// ============================================================================

pub struct OdooClient {
    http_client: Client,
}

impl OdooClient {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(OdooError::NetworkError)?;

        Ok(Self { http_client })
    }

    /// Log in via `common.login`. Odoo signals rejected credentials with a
    /// falsy result rather than an error envelope.
    pub async fn authenticate(&self, credentials: &OdooCredentials) -> Result<OdooSession> {
        credentials.validate()?;

        let result = self
            .call(
                &credentials.instance_url,
                "common",
                "login",
                json!([
                    credentials.database,
                    credentials.username,
                    credentials.password
                ]),
            )
            .await
            .map_err(|e| match e {
                // During login the server-side envelope is an auth problem
                // (bad database name, disabled login, ...), not a fetch one.
                OdooError::RpcError(msg) => OdooError::AuthError(msg),
                other => other,
            })?;

        match result.as_i64() {
            Some(uid) if uid > 0 => {
                tracing::debug!(uid, "Odoo login accepted");
                Ok(OdooSession {
                    uid,
                    credentials: credentials.clone(),
                })
            }
            _ => Err(OdooError::AuthError(
                "Odoo rejected the supplied credentials".to_string(),
            )),
        }
    }

    /// Generic `search_read` against an arbitrary model with an unrestricted
    /// domain. Field list and page bounds pass straight through.
    pub async fn search_read(
        &self,
        session: &OdooSession,
        model: &str,
        fields: &[&str],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RawRecord>> {
        let creds = &session.credentials;
        let result = self
            .call(
                &creds.instance_url,
                "object",
                "execute_kw",
                json!([
                    creds.database,
                    session.uid,
                    creds.password,
                    model,
                    "search_read",
                    [[]],
                    {
                        "fields": fields,
                        "limit": limit,
                        "offset": offset,
                    }
                ]),
            )
            .await?;

        let rows = result
            .as_array()
            .cloned()
            .ok_or_else(|| {
                OdooError::RpcError(format!(
                    "expected an array of {} records, got {}",
                    model,
                    value_kind(&result)
                ))
            })?;

        Ok(rows
            .into_iter()
            .map(|row| RawRecord::new(RecordSource::Odoo, row))
            .collect())
    }

    /// One JSON-RPC round trip. An `error` object in a 2xx body is a backend
    /// failure and must never be mistaken for success.
    async fn call(
        &self,
        instance_url: &str,
        service: &str,
        method: &str,
        args: Value,
    ) -> Result<Value> {
        let endpoint = jsonrpc_endpoint(instance_url);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": service,
                "method": method,
                "args": args,
            },
            "id": chrono::Utc::now().timestamp_millis(),
        });

        let response = self.http_client.post(&endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OdooError::ApiError(status, text));
        }

        let envelope: Value = response.json().await.map_err(OdooError::NetworkError)?;

        if let Some(error) = envelope.get("error") {
            return Err(OdooError::RpcError(rpc_error_message(error)));
        }

        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Accepts a bare instance URL or one that already points at the RPC
/// endpoint.
fn jsonrpc_endpoint(instance_url: &str) -> String {
    let trimmed = instance_url.trim_end_matches('/');
    if trimmed.ends_with("/jsonrpc") {
        trimmed.to_string()
    } else {
        format!("{}/jsonrpc", trimmed)
    }
}

/// Prefer the human-readable message Odoo nests under `error.data.message`;
/// fall back to the envelope-level message.
fn rpc_error_message(error: &Value) -> String {
    error
        .get("data")
        .and_then(|d| d.get("message"))
        .and_then(|m| m.as_str())
        .or_else(|| error.get("message").and_then(|m| m.as_str()))
        .map(|s| s.to_string())
        .unwrap_or_else(|| error.to_string())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
