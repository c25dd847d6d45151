//! JSON API handlers for the web dashboard.
//!
//! Every mutating handler answers with a fresh [`Snapshot`](super::backend::Snapshot)
//! so the page can redraw from a single response.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiny_http::{Response, StatusCode};

use crate::client::endpoints::{self, Endpoint};
use crate::config;

use super::backend::{HealthView, SharedDashboard, lock};
use super::content_type_json;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CallRequest {
    endpoint: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViewRequest {
    mode: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct EndpointsResponse {
    quick: Vec<&'static Endpoint>,
    all: &'static [Endpoint],
}

#[derive(Serialize)]
struct ConfigResponse {
    config: config::CrmLensConfig,
    toml_text: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

/// `{"error": message}` with the given status.
pub fn error_response(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> std::result::Result<T, HttpResponse> {
    serde_json::from_str(body).map_err(|e| error_response(400, &format!("invalid request body: {e}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/view`: current snapshot.
pub fn get_view(shared: &SharedDashboard) -> Result<HttpResponse> {
    json_response(&lock(shared).snapshot())
}

/// `POST /api/call`: `{endpoint, id?}`.
pub fn post_call(shared: &SharedDashboard, body: &str) -> Result<HttpResponse> {
    let request: CallRequest = match parse_body(body) {
        Ok(r) => r,
        Err(resp) => return Ok(resp),
    };
    let path = match endpoints::resolve(&request.endpoint, request.id.as_deref()) {
        Ok(path) => path,
        Err(e) => return Ok(error_response(400, &e.to_string())),
    };

    let mut dashboard = lock(shared);
    if dashboard.token.is_none() {
        return Ok(error_response(401, "not logged in"));
    }
    dashboard.call(&path);
    json_response(&dashboard.snapshot())
}

/// `POST /api/view`: `{mode}`; re-renders the last payload.
pub fn post_view(shared: &SharedDashboard, body: &str) -> Result<HttpResponse> {
    let request: ViewRequest = match parse_body(body) {
        Ok(r) => r,
        Err(resp) => return Ok(resp),
    };
    let Some(mode) = config::parse_view_mode(&request.mode) else {
        return Ok(error_response(400, &format!("unknown view mode: {}", request.mode)));
    };

    let mut dashboard = lock(shared);
    dashboard.switch_view(mode);
    json_response(&dashboard.snapshot())
}

/// `POST /api/clear`: drop the last payload.
pub fn post_clear(shared: &SharedDashboard) -> Result<HttpResponse> {
    let mut dashboard = lock(shared);
    dashboard.clear();
    json_response(&dashboard.snapshot())
}

/// `POST /api/login`: `{username, password}`; saves the token and keeps
/// the permission matrix for the page.
pub fn post_login(shared: &SharedDashboard, body: &str) -> Result<HttpResponse> {
    let request: LoginRequest = match parse_body(body) {
        Ok(r) => r,
        Err(resp) => return Ok(resp),
    };

    // The login request runs without holding the lock.
    let client = lock(shared).client.clone();
    let grant = match client.login(&request.username, &request.password) {
        Ok(grant) => grant,
        Err(e) => return Ok(error_response(401, &e.to_string())),
    };

    let mut dashboard = lock(shared);
    dashboard.set_login(grant)?;
    json_response(&dashboard.snapshot())
}

/// `GET /api/health`: last probe result.
pub fn get_health(shared: &SharedDashboard) -> Result<HttpResponse> {
    json_response(&HealthView::from(&lock(shared).health))
}

/// `GET /api/endpoints`: endpoint catalog.
pub fn get_endpoints() -> Result<HttpResponse> {
    json_response(&EndpointsResponse {
        quick: endpoints::quick_access().collect(),
        all: endpoints::CATALOG,
    })
}

/// `GET /api/config`: effective configuration.
pub fn get_config() -> Result<HttpResponse> {
    json_response(&ConfigResponse {
        config: config::load(),
        toml_text: config::show_effective_config()?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_request_id_is_optional() {
        let req: CallRequest = serde_json::from_str(r#"{"endpoint": "funnel"}"#).unwrap();
        assert_eq!(req.endpoint, "funnel");
        assert!(req.id.is_none());
    }

    #[test]
    fn parse_body_rejects_garbage_with_400() {
        let err = parse_body::<ViewRequest>("nope").unwrap_err();
        assert_eq!(err.status_code(), StatusCode(400));
    }

    #[test]
    fn endpoints_response_serializes() {
        let resp = EndpointsResponse {
            quick: endpoints::quick_access().collect(),
            all: endpoints::CATALOG,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["quick"][0]["alias"], "ping");
        assert_eq!(value["all"].as_array().unwrap().len(), endpoints::CATALOG.len());
    }
}
