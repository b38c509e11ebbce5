//! Client binding for the hosted data/auth backend.
//!
//! The backend exposes a PostgREST-style data API under `/rest/v1` and a
//! GoTrue-style auth API under `/auth/v1`. [`Backend`] is the shared, cheaply
//! cloneable connection handle; [`Client`] is one client context (one browser
//! visitor, or the anonymous public reader) owning at most one auth session.

mod auth;
mod query;

pub use auth::*;
pub use query::*;

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::BackendConfig;

/// Error code the data API returns when a single-object read matched no row.
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Errors raised by backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("unexpected payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("backend returned no row")]
    MissingRow,
}

impl BackendError {
    /// Message suitable for showing to an operator.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            BackendError::Transport(_) => "Could not reach the server. Please try again.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }

    pub fn is_no_rows(&self) -> bool {
        matches!(self, BackendError::Api { code: Some(code), .. } if code == NO_ROWS_CODE)
    }
}

/// Error body shapes used by the data and auth APIs.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_error(self, status: StatusCode) -> BackendError {
        let code = self.error_code.or_else(|| match self.code {
            Some(serde_json::Value::String(code)) => Some(code),
            _ => None,
        });
        let message = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        BackendError::Api {
            status: status.as_u16(),
            code,
            message,
        }
    }
}

/// Turn a non-success response into a [`BackendError`].
async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let err = body.into_error(status);
    tracing::debug!(status = status.as_u16(), error = %err, "Backend call failed");
    Err(err)
}

struct BackendInner {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

/// Shared connection handle to the hosted backend.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<BackendInner>,
}

impl Backend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            inner: Arc::new(BackendInner {
                http,
                url: config.url.trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
            }),
        })
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.inner.url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.inner.url, path)
    }

    /// Attach the key headers; `bearer` defaults to the public key.
    fn authorize(&self, request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.inner.anon_key);
        request
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token)
    }

    /// A client context with no session, for public reads.
    pub fn anonymous(&self) -> Client {
        Client::new(self.clone())
    }
}

/// One client context: data access plus its own auth session.
#[derive(Clone)]
pub struct Client {
    backend: Backend,
    auth: AuthClient,
}

impl Client {
    pub fn new(backend: Backend) -> Self {
        let auth = AuthClient::new(backend.clone());
        Self { backend, auth }
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Start a data API call against `table`, authorized as the current session.
    pub fn from(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.backend.clone(), table, self.auth.access_token())
    }
}
