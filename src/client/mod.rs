/// HTTP client for the CRM REST API.
///
/// Synchronous, built on a shared `ureq` agent. Each call is a single
/// best-effort attempt: no retries, no backoff, and no timeout on
/// user-triggered calls (only the background ping sets one).
///
/// The client never hands a parse exception to its caller. The body is read
/// as text and parsed afterwards; text that is not JSON is wrapped in a
/// synthesized object (see [`decode_body`]) so there is always a structured
/// value to classify and display.
pub mod auth;
pub mod endpoints;
pub mod permissions;
pub mod session;

use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};

use crate::config::schema::ApiConfig;
use crate::error::ApiError;

pub use auth::{LoginGrant, TokenStatus, inspect_token};
pub use permissions::PermissionMatrix;
pub use session::SessionStore;

/// Marker placed in the `error` field of a synthesized body.
pub const DECODE_ERROR: &str = "DECODE_ERROR";

/// Characters of undecodable text kept in `raw_data`.
pub const RAW_DATA_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Outcome of a request that reached the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    /// Status was in 200-299.
    pub ok: bool,
    pub status: u16,
    /// Reason phrase from the status line, e.g. `"Not Found"`.
    pub status_text: String,
    /// Decoded body (or the synthesized decode-error object).
    pub body: Value,
}

/// Parse response text as JSON, falling back to a synthesized
/// `{"error": "DECODE_ERROR", "raw_data": <first 1000 chars>}` object.
pub fn decode_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| {
        json!({
            "error": DECODE_ERROR,
            "raw_data": text.chars().take(RAW_DATA_LIMIT).collect::<String>(),
        })
    })
}

/// Whether a body was synthesized by [`decode_body`].
pub fn is_decode_error(body: &Value) -> bool {
    body.get("error").and_then(Value::as_str) == Some(DECODE_ERROR) && body.get("raw_data").is_some()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// CRM API client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    login_path: String,
    ping_path: String,
    csrf_token: Option<String>,
    agent: ureq::Agent,
}

impl ApiClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &ApiConfig) -> Self {
        let csrf = config.csrf_token.trim();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            ping_path: config.ping_path.clone(),
            csrf_token: (!csrf.is_empty()).then(|| csrf.to_string()),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET` an endpoint with bearer authorization.
    ///
    /// Returns `Err(ApiError::Network)` only for transport failures; any HTTP
    /// status, 2xx or not, comes back as an [`ApiResponse`].
    pub fn call(&self, endpoint: &str, token: &str) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(endpoint);
        let request = self.with_headers(self.agent.get(&url), Some(token));
        read_response(request.call())
    }

    /// Probe the ping endpoint with a bounded wait. Used by the health
    /// monitor only.
    pub fn ping(&self, token: &str, timeout: Duration) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&self.ping_path);
        let request = self
            .with_headers(self.agent.get(&url), Some(token))
            .timeout(timeout);
        read_response(request.call())
    }

    /// Absolute URL for an endpoint path. Absolute URLs pass through.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    fn with_headers(&self, request: ureq::Request, token: Option<&str>) -> ureq::Request {
        let mut request = request.set("Content-Type", "application/json");
        if let Some(token) = token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        if let Some(csrf) = &self.csrf_token {
            request = request.set("X-CSRFToken", csrf);
        }
        request
    }
}

/// Turn a `ureq` result into an [`ApiResponse`], keeping non-2xx bodies.
fn read_response(result: Result<ureq::Response, ureq::Error>) -> Result<ApiResponse, ApiError> {
    let response = match result {
        Ok(resp) => resp,
        Err(ureq::Error::Status(_, resp)) => resp,
        Err(ureq::Error::Transport(transport)) => {
            return Err(ApiError::Network(transport.to_string()));
        }
    };

    let status = response.status();
    let status_text = response.status_text().to_string();
    let text = response
        .into_string()
        .map_err(|e| ApiError::Network(format!("failed to read response body: {e}")))?;

    Ok(ApiResponse {
        ok: (200..300).contains(&status),
        status,
        status_text,
        body: decode_body(&text),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
