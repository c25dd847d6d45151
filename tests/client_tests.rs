// HTTP client tests against a local tiny_http server.
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use serde_json::json;
use tiny_http::{Header, Response, Server};

use crmlens::analytics::logger::{self, CallOutcome};
use crmlens::client::{ApiClient, DECODE_ERROR, is_decode_error};
use crmlens::config::ViewMode;
use crmlens::config::schema::ApiConfig;
use crmlens::error::ApiError;
use crmlens::insight::NoFiller;
use crmlens::pipeline::{CallReport, ViewState, run_call};
use crmlens::render::TerminalBackend;

// ---------------------------------------------------------------------------
// Fixture server
// ---------------------------------------------------------------------------

/// Answer `requests` requests with a canned reply per path, then exit.
fn serve(requests: usize) -> (String, JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    let handle = thread::spawn(move || {
        for mut request in server.incoming_requests().take(requests) {
            let authorized = request
                .headers()
                .iter()
                .any(|h| h.field.equiv("Authorization") && h.value.as_str() == "Bearer good-token");

            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);

            let (status, text) = match request.url() {
                "/api/funnel/" if authorized => (
                    200,
                    json!({"data": {"funnel": {"queued": 10, "completed": 5}}}).to_string(),
                ),
                "/api/funnel/" => (401, json!({"detail": "token expired"}).to_string()),
                "/api/broken/" => (502, "<html>Bad Gateway</html>".to_string()),
                "/api/auth/login/" if body.contains("\"secret\"") => (
                    200,
                    json!({"data": {
                        "tokens": {"access": "good-token"},
                        "user": {
                            "full_name": "Nash Admin",
                            "role": {"name": "Admin", "level": 1},
                            "frontend_permissions": {"leads": {"view": true, "delete": true}},
                            "status_permissions": {"can_change_status": true}
                        }
                    }})
                    .to_string(),
                ),
                "/api/auth/login/" => (
                    401,
                    json!({"meta": {"errors": {"authentication_error": "Invalid credentials"}}})
                        .to_string(),
                ),
                _ => (404, json!({"detail": "not found"}).to_string()),
            };

            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let _ = request.respond(
                Response::from_string(text)
                    .with_status_code(status)
                    .with_header(header),
            );
        }
    });

    (format!("http://{addr}"), handle)
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::from_config(&ApiConfig {
        base_url: base_url.to_string(),
        ..ApiConfig::default()
    })
}

/// A base URL nobody is listening on.
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

#[test]
fn authorized_call_returns_decoded_body() {
    let (base, handle) = serve(1);
    let response = client(&base).call("/api/funnel/", "good-token").unwrap();
    handle.join().unwrap();

    assert!(response.ok);
    assert_eq!(response.status, 200);
    assert_eq!(response.body["data"]["funnel"]["completed"], 5);
}

#[test]
fn error_status_keeps_the_body() {
    let (base, handle) = serve(1);
    let response = client(&base).call("/api/funnel/", "stale").unwrap();
    handle.join().unwrap();

    assert!(!response.ok);
    assert_eq!(response.status, 401);
    assert_eq!(response.body["detail"], "token expired");
}

#[test]
fn non_json_body_is_wrapped() {
    let (base, handle) = serve(1);
    let response = client(&base).call("api/broken/", "good-token").unwrap();
    handle.join().unwrap();

    assert_eq!(response.status, 502);
    assert_eq!(response.body["error"], DECODE_ERROR);
    assert!(is_decode_error(&response.body));
}

#[test]
fn unreachable_server_is_a_network_error() {
    let err = client(&closed_port_url())
        .call("/api/funnel/", "good-token")
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.status_code(), 0);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_returns_access_token() {
    let (base, handle) = serve(1);
    let grant = client(&base).login("nash", "secret").unwrap();
    handle.join().unwrap();
    assert_eq!(grant.token, "good-token");

    let matrix = grant.permissions.unwrap();
    assert_eq!(matrix.headline().as_deref(), Some("Nash Admin (Admin)"));
    assert_eq!(matrix.section("LEADS").and_then(|s| s.granted("delete")), Some(true));
    let status = matrix.section("STATUS PERMISSIONS").unwrap();
    assert_eq!(status.granted("can_change_status"), Some(true));
    assert_eq!(status.granted("can_decline"), Some(false));
}

#[test]
fn rejected_login_surfaces_server_message() {
    let (base, handle) = serve(1);
    let err = client(&base).login("nash", "wrong").unwrap_err();
    handle.join().unwrap();
    assert_eq!(err, ApiError::Authentication("Invalid credentials".to_string()));
}

#[test]
fn blank_credentials_never_reach_the_server() {
    let err = client(&closed_port_url()).login("  ", "").unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)));
}

// ---------------------------------------------------------------------------
// End to end through the pipeline
// ---------------------------------------------------------------------------

#[test]
fn run_call_presents_and_logs_each_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.jsonl");
    let (base, handle) = serve(2);
    let api = client(&base);
    let mut state = ViewState::new(TerminalBackend::new(Vec::new(), false), ViewMode::Chart);

    let ok = run_call(&api, "/api/funnel/", "good-token", &mut state, &mut NoFiller, Some(log.as_path()));
    assert!(matches!(ok, CallReport::Success { status: 200, .. }));
    assert_eq!(ok.status_line("/api/funnel/"), "Data received from /api/funnel/ (funnel)");
    assert!(state.surface().has_chart());

    let failed = run_call(&api, "/api/broken/", "good-token", &mut state, &mut NoFiller, Some(log.as_path()));
    handle.join().unwrap();
    assert!(matches!(failed, CallReport::HttpError { status: 502, .. }));
    assert!(!state.surface().has_chart());
    assert!(is_decode_error(state.last_payload().unwrap()));

    let entries = logger::read_all_entries(&log);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].outcome, CallOutcome::Ok);
    assert_eq!(entries[0].shape.as_deref(), Some("funnel"));
    assert_eq!(entries[1].outcome, CallOutcome::HttpError);
    assert_eq!(entries[1].status, Some(502));
}

#[test]
fn network_failure_keeps_previous_payload() {
    let (base, handle) = serve(1);
    let mut state = ViewState::new(TerminalBackend::new(Vec::new(), false), ViewMode::Json);
    run_call(&client(&base), "/api/funnel/", "good-token", &mut state, &mut NoFiller, None);
    handle.join().unwrap();

    let report = run_call(
        &client(&closed_port_url()),
        "/api/funnel/",
        "good-token",
        &mut state,
        &mut NoFiller,
        None,
    );
    let CallReport::NetworkFailure { envelope, .. } = report else {
        panic!("expected a network failure");
    };
    assert_eq!(envelope["status_code"], 0);
    assert_eq!(envelope["data"]["type"], "NETWORK_FAILURE");
    assert_eq!(state.last_payload().unwrap()["data"]["funnel"]["queued"], 10);
}
