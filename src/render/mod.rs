/// Render sink: puts a chart spec (or a placeholder) and the raw payload on
/// a display surface.
///
/// A [`DisplaySurface`] owns at most one live chart. The handle returned by
/// [`ChartBackend::attach`] is stored in the surface and handed back to
/// [`ChartBackend::detach`] before anything else is drawn, so two charts can
/// never be attached to the same surface at once.
pub mod scene;
pub mod terminal;

use chrono::Utc;
use serde_json::{Value, json};

use crate::chart::ChartSpec;

pub use scene::{SceneCommand, scene_commands};
pub use terminal::TerminalBackend;

/// Shown on the chart area when no chart applies to the payload.
pub const PLACEHOLDER: &str =
    "No chart available for this payload. Switch to the raw view for details.";

/// Marker in the `error` field of an error envelope.
pub const API_ERROR: &str = "API_ERROR";

/// Hints attached to every error envelope.
pub const ERROR_SUGGESTIONS: [&str; 4] = [
    "Verify the access token is valid and not expired",
    "Check the endpoint path",
    "Retry the request",
    "Contact the CRM administrator",
];

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// A concrete drawing target (terminal, web snapshot, test recorder).
pub trait ChartBackend {
    /// Handle to a chart currently on screen.
    type Chart;

    /// Draw a chart and return its handle.
    fn attach(&mut self, spec: &ChartSpec) -> Self::Chart;

    /// Remove a chart previously returned by [`attach`](Self::attach).
    fn detach(&mut self, chart: Self::Chart);

    /// Show a text message on the chart area.
    fn show_placeholder(&mut self, text: &str);

    /// Replace the raw view content.
    fn show_raw(&mut self, pretty_json: &str);

    /// Apply 3D scene commands. Backends without a scene ignore them.
    fn show_scene(&mut self, _commands: &[SceneCommand]) {}
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// A display area owning at most one live chart.
pub struct DisplaySurface<B: ChartBackend> {
    backend: B,
    live: Option<B::Chart>,
}

impl<B: ChartBackend> DisplaySurface<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            live: None,
        }
    }

    /// Replace whatever is on screen with `spec` (or the placeholder) and
    /// show the full body in the raw view.
    pub fn render(&mut self, spec: Option<&ChartSpec>, raw_body: &Value) {
        self.detach_live();
        match spec {
            Some(spec) => {
                let chart = self.backend.attach(spec);
                self.live = Some(chart);
            }
            None => self.backend.show_placeholder(PLACEHOLDER),
        }
        self.backend.show_raw(&raw_view(raw_body));
    }

    /// Detach any chart and show only the raw view.
    pub fn render_raw(&mut self, raw_body: &Value) {
        self.detach_live();
        self.backend.show_raw(&raw_view(raw_body));
    }

    /// Detach any chart and drive the 3D scene instead.
    pub fn render_scene(&mut self, commands: &[SceneCommand], raw_body: &Value) {
        self.detach_live();
        self.backend.show_scene(commands);
        self.backend.show_raw(&raw_view(raw_body));
    }

    /// Show a failed call: error placeholder plus the envelope as raw view.
    pub fn render_error(&mut self, envelope: &Value) {
        self.detach_live();
        let status = envelope
            .get("status_code")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        self.backend.show_placeholder(&error_placeholder(status));
        self.backend.show_raw(&raw_view(envelope));
    }

    /// Detach any live chart and leave the surface empty.
    pub fn clear(&mut self) {
        self.detach_live();
        self.backend.show_placeholder("");
        self.backend.show_raw("");
    }

    pub fn has_chart(&self) -> bool {
        self.live.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn detach_live(&mut self) {
        if let Some(chart) = self.live.take() {
            self.backend.detach(chart);
        }
    }
}

// ---------------------------------------------------------------------------
// Raw view and error envelope
// ---------------------------------------------------------------------------

/// Pretty-printed JSON for the raw view.
pub fn raw_view(body: &Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}

/// Text on the chart area after a failed call.
pub fn error_placeholder(status_code: u64) -> String {
    if status_code == 0 {
        "Request failed: server unreachable".to_string()
    } else {
        format!("Request failed with status {status_code}")
    }
}

/// Raw-view body shown for a failed call.
pub fn error_envelope(status_code: u16, data: Value) -> Value {
    json!({
        "error": API_ERROR,
        "status_code": status_code,
        "data": data,
        "timestamp": Utc::now().to_rfc3339(),
        "suggestions": ERROR_SUGGESTIONS,
    })
}

/// Error envelope for a transport failure (status code 0).
pub fn network_error_envelope(message: &str) -> Value {
    error_envelope(
        0,
        json!({
            "error": message,
            "type": "NETWORK_FAILURE",
        }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
