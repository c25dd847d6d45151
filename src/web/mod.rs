//! Embedded web dashboard for crmlens.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard that draws chart specs, the 3D scene and raw JSON
//! - JSON API endpoints to call the CRM, switch views and read health
//!
//! Launched via `crmlens web` (default: `http://127.0.0.1:9747`).

mod api;
mod backend;
mod frontend;

use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use tiny_http::{Header, Method, Response, Server};

use crate::config::CrmLensConfig;
use crate::monitor::{self, HealthMonitor};

use api::HttpResponse;
pub use backend::{Dashboard, SharedDashboard, WebBackend};

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard on `addr`.
///
/// Blocks the current thread. Requests are handled sequentially; a failing
/// handler produces a 500 for that request only.
pub fn serve(config: &CrmLensConfig, addr: &str, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let shared = Dashboard::from_config(config).into_shared();
    let _monitor = start_health_monitor(config, &shared)?;

    println!("{} http://{addr}  (Ctrl+C stops)", "crmlens web".bold().cyan());
    if open && let Err(e) = open_browser(&format!("http://{addr}")) {
        eprintln!("{}", format!("could not open a browser: {e}").yellow());
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let path = request.url().split('?').next().unwrap_or_default().to_string();

        let mut body = String::new();
        if method == Method::Post {
            let _ = request.as_reader().read_to_string(&mut body);
        }

        let response = route(&method, &path, &body, &shared)
            .unwrap_or_else(|e| api::error_response(500, &format!("{e:#}")));
        let status = response.status_code().0;
        let _ = request.respond(response);

        println!(
            "{} {method} {path} {status}",
            chrono::Local::now().format("%H:%M:%S").to_string().dimmed()
        );
    }

    Ok(())
}

/// Probe once right away, then keep the indicator fresh in the background.
fn start_health_monitor(
    config: &CrmLensConfig,
    shared: &SharedDashboard,
) -> Result<Option<HealthMonitor>> {
    if !config.health.enabled {
        return Ok(None);
    }

    let timeout = Duration::from_millis(config.health.timeout_ms);
    let mut probe = {
        let shared = SharedDashboard::clone(shared);
        move || {
            let (client, token) = {
                let dashboard = backend::lock(&shared);
                (dashboard.client.clone(), dashboard.token.clone())
            };
            monitor::probe_once(&client, token.as_deref(), timeout)
        }
    };
    let on_status = {
        let shared = SharedDashboard::clone(shared);
        move |status| backend::lock(&shared).health = status
    };

    let first = probe();
    backend::lock(shared).health = first;

    let interval = Duration::from_secs(config.health.interval_secs.max(1));
    HealthMonitor::start(interval, probe, on_status)
        .map(Some)
        .context("health monitor did not start")
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Pick the handler for `method` and `path` (query string already removed).
/// An empty POST body counts as `{}`.
fn route(method: &Method, path: &str, body: &str, shared: &SharedDashboard) -> Result<HttpResponse> {
    let body = if body.trim().is_empty() { "{}" } else { body };

    match (method, path) {
        (Method::Get, "/" | "/index.html") => Ok(serve_frontend()),

        (Method::Get, "/api/view") => api::get_view(shared),
        (Method::Post, "/api/view") => api::post_view(shared, body),
        (Method::Post, "/api/call") => api::post_call(shared, body),
        (Method::Post, "/api/clear") => api::post_clear(shared),

        (Method::Post, "/api/login") => api::post_login(shared, body),
        (Method::Get, "/api/health") => api::get_health(shared),
        (Method::Get, "/api/endpoints") => api::get_endpoints(),
        (Method::Get, "/api/config") => api::get_config(),

        _ => Ok(api::error_response(404, &format!("no route for {method} {path}"))),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend() -> HttpResponse {
    Response::from_string(frontend::INDEX_HTML).with_header(content_type_html())
}

pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Open a URL in the system browser (best-effort).
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", url]);
        c
    };

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut c = std::process::Command::new("open");
        c.arg(url);
        c
    };

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(url);
        c
    };

    command.spawn().context("failed to open browser")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
