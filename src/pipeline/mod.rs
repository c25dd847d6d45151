/// From raw payload to what is on screen.
///
/// [`analyze`] is the pure part: classify once, then derive the chart spec,
/// insights and scene commands from the same shape. [`ViewState`] is the
/// only mutable state between calls: the last payload and the current view
/// mode. [`run_call`] ties a request to both and writes the call log.
use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::analytics::logger::{self, CallLogEntry, CallOutcome};
use crate::chart::{ChartSpec, to_chart_spec};
use crate::client::ApiClient;
use crate::config::ViewMode;
use crate::error::ApiError;
use crate::insight::{FillerSource, InsightSet, NoFiller, to_insights};
use crate::render::{
    ChartBackend, DisplaySurface, SceneCommand, error_envelope, network_error_envelope,
    scene_commands,
};
use crate::shape::{ClassifiedShape, PayloadMeta, classify};

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Everything derived from one payload.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub shape: ClassifiedShape,
    pub meta: PayloadMeta,
    pub spec: Option<ChartSpec>,
    pub insights: InsightSet,
    pub scene: Vec<SceneCommand>,
}

/// Serializable summary of an [`Analysis`] for JSON output.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub shape: &'static str,
    pub chart: Option<&'a ChartSpec>,
    pub insights: &'a InsightSet,
    pub scene: &'a [SceneCommand],
}

impl Analysis {
    pub fn report(&self) -> AnalysisReport<'_> {
        AnalysisReport {
            shape: self.shape.name(),
            chart: self.spec.as_ref(),
            insights: &self.insights,
            scene: &self.scene,
        }
    }
}

/// Classify a body and derive chart spec, insights and scene commands.
pub fn analyze(body: &Value, filler: &mut dyn FillerSource) -> Analysis {
    let shape = classify(body);
    let meta = PayloadMeta::from_body(body);
    let spec = to_chart_spec(&shape);
    let insights = to_insights(&shape, &meta, filler);
    Analysis {
        scene: scene_commands(body),
        shape,
        meta,
        spec,
        insights,
    }
}

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// Last payload, current view mode, and the surface they are shown on.
pub struct ViewState<B: ChartBackend> {
    surface: DisplaySurface<B>,
    mode: ViewMode,
    last: Option<Value>,
}

impl<B: ChartBackend> ViewState<B> {
    pub fn new(backend: B, mode: ViewMode) -> Self {
        Self {
            surface: DisplaySurface::new(backend),
            mode,
            last: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn last_payload(&self) -> Option<&Value> {
        self.last.as_ref()
    }

    pub fn surface(&self) -> &DisplaySurface<B> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DisplaySurface<B> {
        &mut self.surface
    }

    /// Keep `body` as the last payload and present it in the current mode.
    pub fn show_payload(&mut self, body: Value, filler: &mut dyn FillerSource) -> Analysis {
        let analysis = analyze(&body, filler);
        self.present(&analysis, &body);
        self.last = Some(body);
        analysis
    }

    /// Non-2xx response: the body still becomes the last payload, the
    /// surface shows the error envelope.
    pub fn show_http_error(&mut self, status: u16, body: Value) -> Value {
        let envelope = error_envelope(status, body.clone());
        self.surface.render_error(&envelope);
        self.last = Some(body);
        envelope
    }

    /// Transport failure: the last payload is kept as is.
    pub fn show_network_failure(&mut self, message: &str) -> Value {
        let envelope = network_error_envelope(message);
        self.surface.render_error(&envelope);
        envelope
    }

    /// Change mode and re-render the last payload without a new request.
    /// Returns the fresh analysis, or `None` when there is nothing to show.
    pub fn switch_view(&mut self, mode: ViewMode) -> Option<Analysis> {
        self.mode = mode;
        let body = self.last.take()?;
        let analysis = analyze(&body, &mut NoFiller);
        self.present(&analysis, &body);
        self.last = Some(body);
        Some(analysis)
    }

    /// Drop the last payload and detach any chart.
    pub fn clear(&mut self) {
        self.last = None;
        self.surface.clear();
    }

    /// Write the last payload, pretty-printed, to `path`.
    pub fn export(&self, path: &Path) -> Result<()> {
        let body = self.last.as_ref().context("no payload to export")?;
        let json = serde_json::to_string_pretty(body)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn present(&mut self, analysis: &Analysis, body: &Value) {
        match self.mode {
            ViewMode::Chart => self.surface.render(analysis.spec.as_ref(), body),
            ViewMode::Scene => self.surface.render_scene(&analysis.scene, body),
            ViewMode::Json => self.surface.render_raw(body),
        }
    }
}

// ---------------------------------------------------------------------------
// One call, end to end
// ---------------------------------------------------------------------------

/// Result of [`run_call`], for the status line.
#[derive(Debug, Clone)]
pub enum CallReport {
    Success { status: u16, analysis: Analysis },
    HttpError { status: u16, status_text: String, envelope: Value },
    NetworkFailure { message: String, envelope: Value },
}

impl CallReport {
    pub fn outcome(&self) -> CallOutcome {
        match self {
            Self::Success { .. } => CallOutcome::Ok,
            Self::HttpError { .. } => CallOutcome::HttpError,
            Self::NetworkFailure { .. } => CallOutcome::NetworkFailure,
        }
    }

    /// One-line human summary.
    pub fn status_line(&self, endpoint: &str) -> String {
        match self {
            Self::Success { analysis, .. } => {
                format!("Data received from {endpoint} ({})", analysis.shape.name())
            }
            Self::HttpError {
                status,
                status_text,
                ..
            } => format!("API error: {status} {status_text}"),
            Self::NetworkFailure { message, .. } => format!("Network failure: {message}"),
        }
    }
}

/// Request `endpoint`, present the result on `state`, and append a call log
/// entry when `log_path` is set.
pub fn run_call<B: ChartBackend>(
    client: &ApiClient,
    endpoint: &str,
    token: &str,
    state: &mut ViewState<B>,
    filler: &mut dyn FillerSource,
    log_path: Option<&Path>,
) -> CallReport {
    let started = Instant::now();
    let result = client.call(endpoint, token);
    let latency_ms = started.elapsed().as_millis() as u64;

    let report = match result {
        Ok(response) if response.ok => CallReport::Success {
            status: response.status,
            analysis: state.show_payload(response.body, filler),
        },
        Ok(response) => CallReport::HttpError {
            status: response.status,
            status_text: response.status_text,
            envelope: state.show_http_error(response.status, response.body),
        },
        Err(err) => {
            let message = match err {
                ApiError::Network(message) => message,
                other => other.to_string(),
            };
            CallReport::NetworkFailure {
                envelope: state.show_network_failure(&message),
                message,
            }
        }
    };

    if let Some(path) = log_path {
        let (status, shape) = match &report {
            CallReport::Success { status, analysis } => (Some(*status), Some(analysis.shape.name())),
            CallReport::HttpError { status, .. } => (Some(*status), None),
            CallReport::NetworkFailure { .. } => (None, None),
        };
        logger::log_call(
            path,
            &CallLogEntry::now(endpoint, report.outcome(), status, shape, latency_ms),
        );
    }

    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        attached: Vec<ChartKind>,
        live: usize,
        scenes: usize,
        raw: String,
    }

    impl ChartBackend for Recorder {
        type Chart = ();

        fn attach(&mut self, spec: &ChartSpec) {
            self.attached.push(spec.kind);
            self.live += 1;
        }

        fn detach(&mut self, _chart: ()) {
            self.live -= 1;
        }

        fn show_placeholder(&mut self, _text: &str) {}

        fn show_raw(&mut self, pretty_json: &str) {
            self.raw = pretty_json.to_string();
        }

        fn show_scene(&mut self, _commands: &[SceneCommand]) {
            self.scenes += 1;
        }
    }

    fn funnel() -> Value {
        json!({"data": {"funnel": {"queued": 10, "completed": 4, "declined": 5}}})
    }

    #[test]
    fn analyze_derives_everything_from_one_shape() {
        let analysis = analyze(&funnel(), &mut NoFiller);
        assert_eq!(analysis.shape.name(), "funnel");
        assert_eq!(analysis.spec.as_ref().map(|s| s.kind), Some(ChartKind::Doughnut));
        assert_eq!(analysis.insights.lines()[0], "Conversion rate 40.0% (completed / queued)");
        assert_eq!(analysis.scene.last(), Some(&SceneCommand::SpawnParticles(10)));
    }

    #[test]
    fn switch_view_rerenders_last_payload() {
        let mut state = ViewState::new(Recorder::default(), ViewMode::Chart);
        state.show_payload(funnel(), &mut NoFiller);
        assert_eq!(state.surface().backend().live, 1);

        let analysis = state.switch_view(ViewMode::Scene).unwrap();
        assert_eq!(analysis.shape.name(), "funnel");
        assert_eq!(state.surface().backend().live, 0);
        assert_eq!(state.surface().backend().scenes, 1);

        state.switch_view(ViewMode::Chart);
        assert_eq!(state.surface().backend().attached.len(), 2);
        assert_eq!(state.surface().backend().live, 1);
        assert!(state.last_payload().is_some());
    }

    #[test]
    fn switch_view_without_payload_only_changes_mode() {
        let mut state = ViewState::new(Recorder::default(), ViewMode::Chart);
        assert!(state.switch_view(ViewMode::Json).is_none());
        assert_eq!(state.mode(), ViewMode::Json);
    }

    #[test]
    fn clear_drops_payload_and_chart() {
        let mut state = ViewState::new(Recorder::default(), ViewMode::Chart);
        state.show_payload(funnel(), &mut NoFiller);
        state.clear();
        assert!(state.last_payload().is_none());
        assert_eq!(state.surface().backend().live, 0);
        assert!(state.export(Path::new("/nonexistent/x.json")).is_err());
    }

    #[test]
    fn network_failure_keeps_previous_payload() {
        let mut state = ViewState::new(Recorder::default(), ViewMode::Chart);
        state.show_payload(funnel(), &mut NoFiller);
        let envelope = state.show_network_failure("refused");
        assert_eq!(envelope["status_code"], 0);
        assert_eq!(state.last_payload(), Some(&funnel()));
        assert_eq!(state.surface().backend().live, 0);
    }

    #[test]
    fn export_writes_pretty_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        let mut state = ViewState::new(Recorder::default(), ViewMode::Json);
        state.show_payload(funnel(), &mut NoFiller);
        state.export(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), funnel());
    }
}
