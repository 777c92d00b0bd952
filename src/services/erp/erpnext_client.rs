// ERPNext REST Client
// Two authentication schemes: API key/secret pairs become a `token` header
// with no handshake (validity is confirmed implicitly on the first real
// call); username/password is exchanged through /api/method/login and then
// carried as a basic auth header. Fetch is plain resource-list REST with
// query-string paging and field selection.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

use super::{RawRecord, RecordSource};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ErpNextError {
    #[error("ERPNext API error ({0}): {1}")]
    ApiError(StatusCode, String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Unexpected ERPNext response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ErpNextError>;

// ============================================================================
// Credentials & Session
// ============================================================================

#[derive(Debug, Clone)]
pub enum ErpNextAuth {
    /// API key/secret pair; authenticates every call via a `token` header.
    Token { api_key: String, api_secret: String },
    /// Interactive user credentials; verified against the login endpoint.
    Password { username: String, password: String },
}

impl ErpNextAuth {
    pub fn validate(&self) -> Result<()> {
        match self {
            ErpNextAuth::Token {
                api_key,
                api_secret,
            } => {
                if api_key.is_empty() {
                    return Err(ErpNextError::ConfigError("api_key is required".to_string()));
                }
                if api_secret.is_empty() {
                    return Err(ErpNextError::ConfigError(
                        "api_secret is required".to_string(),
                    ));
                }
            }
            ErpNextAuth::Password { username, password } => {
                if username.is_empty() {
                    return Err(ErpNextError::ConfigError("username is required".to_string()));
                }
                if password.is_empty() {
                    return Err(ErpNextError::ConfigError("password is required".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Opaque authentication result: the `Authorization` value sent with every
/// subsequent call plus the identity the backend confirmed. Request-scoped.
#[derive(Debug, Clone)]
pub struct ErpNextSession {
    pub base_url: String,
    pub auth_header: String,
    pub authenticated_user: String,
}

// ============================================================================
// ERPNext Client
// ============================================================================

pub struct ErpNextClient {
    http_client: Client,
}

impl ErpNextClient {
    pub fn new() -> Result<Self> {
        // No cookie jar: the login endpoint sets a sid cookie, but this
        // client is shared across callers and auth must ride on the
        // per-session Authorization header alone. The cookie is discarded.
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(ErpNextError::NetworkError)?;

        Ok(Self { http_client })
    }

    pub async fn authenticate(
        &self,
        instance_url: &str,
        auth: &ErpNextAuth,
    ) -> Result<ErpNextSession> {
        if instance_url.is_empty() {
            return Err(ErpNextError::ConfigError(
                "instance_url is required".to_string(),
            ));
        }
        auth.validate()?;

        let base_url = instance_url.trim_end_matches('/').to_string();

        match auth {
            ErpNextAuth::Token {
                api_key,
                api_secret,
            } => Ok(ErpNextSession {
                base_url,
                auth_header: format!("token {}:{}", api_key, api_secret),
                authenticated_user: api_key.clone(),
            }),
            ErpNextAuth::Password { username, password } => {
                self.login(base_url, username, password).await
            }
        }
    }

    async fn login(
        &self,
        base_url: String,
        username: &str,
        password: &str,
    ) -> Result<ErpNextSession> {
        let url = format!("{}/api/method/login", base_url);
        let response = self
            .http_client
            .post(&url)
            .form(&[("usr", username), ("pwd", password)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(ErpNextError::AuthError(message));
        }

        let body: Value = response.json().await.map_err(ErpNextError::NetworkError)?;
        let full_name = body
            .get("full_name")
            .and_then(|v| v.as_str())
            .unwrap_or(username)
            .to_string();

        tracing::debug!("ERPNext login accepted");

        Ok(ErpNextSession {
            base_url,
            auth_header: format!("Basic {}", BASE64.encode(format!("{}:{}", username, password))),
            authenticated_user: full_name,
        })
    }

    /// Resource-list call: `GET /api/resource/{DocType}` with field
    /// selection and limit/offset passed through as query parameters.
    pub async fn list_resource(
        &self,
        session: &ErpNextSession,
        doctype: &str,
        fields: &[&str],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RawRecord>> {
        let url = format!("{}/api/resource/{}", session.base_url, doctype);
        let fields_param = serde_json::to_string(fields)
            .map_err(|e| ErpNextError::InvalidResponse(e.to_string()))?;

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", &session.auth_header)
            .header("Accept", "application/json")
            .query(&[
                ("fields", fields_param),
                ("limit_start", offset.to_string()),
                ("limit_page_length", limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Err(ErpNextError::AuthError(message))
                }
                _ => Err(ErpNextError::ApiError(status, message)),
            };
        }

        let body: Value = response.json().await.map_err(ErpNextError::NetworkError)?;
        let rows = body
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .ok_or_else(|| {
                ErpNextError::InvalidResponse(format!(
                    "missing `data` array in {} listing",
                    doctype
                ))
            })?;

        Ok(rows
            .into_iter()
            .map(|row| RawRecord::new(RecordSource::ErpNext, row))
            .collect())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Pull the human-readable message out of an ERPNext error body when there
/// is one; otherwise fall back to the raw text.
async fn error_message(response: Response) -> String {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    if let Ok(body) = serde_json::from_str::<Value>(&text) {
        for key in ["message", "exception", "exc_type"] {
            if let Some(msg) = body.get(key).and_then(|v| v.as_str()) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }
    text
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_auth_requires_both_halves() {
        let auth = ErpNextAuth::Token {
            api_key: "abc".to_string(),
            api_secret: "".to_string(),
        };
        assert!(matches!(auth.validate(), Err(ErpNextError::ConfigError(_))));
    }

    #[tokio::test]
    async fn token_auth_builds_header_without_network() {
        // No server is listening on this address; token auth must still
        // succeed because validity is only confirmed on the first real call.
        let client = ErpNextClient::new().unwrap();
        let session = client
            .authenticate(
                "http://127.0.0.1:9/",
                &ErpNextAuth::Token {
                    api_key: "key".to_string(),
                    api_secret: "secret".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(session.auth_header, "token key:secret");
        assert_eq!(session.base_url, "http://127.0.0.1:9");
        assert_eq!(session.authenticated_user, "key");
    }

    #[test]
    fn password_auth_rejects_missing_fields() {
        let auth = ErpNextAuth::Password {
            username: "".to_string(),
            password: "pw".to_string(),
        };
        assert!(auth.validate().is_err());
    }
}
