//! Dashboard state shared between the HTTP handlers and the health worker.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::analytics::logger;
use crate::chart::ChartSpec;
use crate::client::{ApiClient, LoginGrant, PermissionMatrix, SessionStore};
use crate::config::{CrmLensConfig, ViewMode};
use crate::insight::{InsightSet, filler};
use crate::monitor::HealthStatus;
use crate::pipeline::{CallReport, ViewState};
use crate::render::{ChartBackend, SceneCommand};

// ---------------------------------------------------------------------------
// Chart backend
// ---------------------------------------------------------------------------

/// Keeps what the page should draw; the browser pulls it as a snapshot.
#[derive(Debug, Default)]
pub struct WebBackend {
    next_id: u64,
    chart: Option<(u64, ChartSpec)>,
    placeholder: Option<String>,
    raw: String,
    scene: Vec<SceneCommand>,
}

impl ChartBackend for WebBackend {
    type Chart = u64;

    fn attach(&mut self, spec: &ChartSpec) -> u64 {
        self.next_id += 1;
        self.chart = Some((self.next_id, spec.clone()));
        self.placeholder = None;
        self.next_id
    }

    fn detach(&mut self, chart: u64) {
        if self.chart.as_ref().is_some_and(|(id, _)| *id == chart) {
            self.chart = None;
        }
    }

    fn show_placeholder(&mut self, text: &str) {
        self.placeholder = (!text.is_empty()).then(|| text.to_string());
        self.scene.clear();
    }

    fn show_raw(&mut self, pretty_json: &str) {
        self.raw = pretty_json.to_string();
    }

    fn show_scene(&mut self, commands: &[SceneCommand]) {
        self.placeholder = None;
        self.scene = commands.to_vec();
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    /// `"success"` or `"error"`.
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthView {
    #[serde(flatten)]
    pub status: HealthStatus,
    pub color: &'static str,
    pub label: String,
}

impl From<&HealthStatus> for HealthView {
    fn from(status: &HealthStatus) -> Self {
        Self {
            status: status.clone(),
            color: status.color(),
            label: status.label(),
        }
    }
}

/// Everything the page needs to redraw itself.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub mode: ViewMode,
    pub chart: Option<ChartSpec>,
    pub placeholder: Option<String>,
    pub raw: String,
    pub scene: Vec<SceneCommand>,
    pub insights: InsightSet,
    pub insights_text: Option<String>,
    pub status: Option<StatusMessage>,
    pub health: HealthView,
    pub has_payload: bool,
    pub logged_in: bool,
    /// Role and permission matrix from the last login in this process.
    pub permissions: Option<PermissionMatrix>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard {
    pub(crate) client: ApiClient,
    pub(crate) session: SessionStore,
    pub(crate) token: Option<String>,
    pub(crate) view: ViewState<WebBackend>,
    pub(crate) insights: InsightSet,
    pub(crate) status: Option<StatusMessage>,
    pub(crate) health: HealthStatus,
    pub(crate) permissions: Option<PermissionMatrix>,
    separator: String,
    filler: bool,
    log_path: Option<PathBuf>,
}

pub type SharedDashboard = Arc<Mutex<Dashboard>>;

/// Lock the dashboard, recovering from a poisoned lock.
pub fn lock(shared: &SharedDashboard) -> MutexGuard<'_, Dashboard> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Dashboard {
    pub fn from_config(config: &CrmLensConfig) -> Self {
        let session = SessionStore::from_config(&config.session);
        let token = session.load();
        Self {
            client: ApiClient::from_config(&config.api),
            session,
            token,
            view: ViewState::new(WebBackend::default(), config.view.default_mode),
            insights: InsightSet::default(),
            status: None,
            health: HealthStatus::NoSession,
            permissions: None,
            separator: config.insights.separator.clone(),
            filler: config.insights.filler,
            log_path: logger::call_log_path(&config.logging),
        }
    }

    pub fn into_shared(self) -> SharedDashboard {
        Arc::new(Mutex::new(self))
    }

    /// Run one call against the API and update the page state.
    pub fn call(&mut self, path: &str) {
        let Some(token) = self.token.clone() else {
            self.status = Some(StatusMessage {
                kind: "error",
                message: "Not logged in".to_string(),
            });
            return;
        };

        let mut filler = filler::from_setting(self.filler);
        let report = crate::pipeline::run_call(
            &self.client,
            path,
            &token,
            &mut self.view,
            filler.as_mut(),
            self.log_path.as_deref(),
        );

        let kind = match &report {
            CallReport::Success { analysis, .. } => {
                self.insights = analysis.insights.clone();
                "success"
            }
            _ => {
                self.insights = InsightSet::default();
                "error"
            }
        };
        self.status = Some(StatusMessage {
            kind,
            message: report.status_line(path),
        });
    }

    /// Store a fresh token (memory and session file).
    pub fn set_token(&mut self, token: String) -> anyhow::Result<()> {
        self.session.save(&token)?;
        self.token = Some(token);
        Ok(())
    }

    /// Store the token of a successful login and keep its permission matrix.
    pub fn set_login(&mut self, grant: LoginGrant) -> anyhow::Result<()> {
        self.set_token(grant.token)?;
        self.permissions = grant.permissions;
        Ok(())
    }

    pub fn switch_view(&mut self, mode: ViewMode) {
        self.view.switch_view(mode);
    }

    pub fn clear(&mut self) {
        self.view.clear();
        self.insights = InsightSet::default();
        self.status = None;
    }

    pub fn snapshot(&self) -> Snapshot {
        let backend = self.view.surface().backend();
        Snapshot {
            mode: self.view.mode(),
            chart: backend.chart.as_ref().map(|(_, spec)| spec.clone()),
            placeholder: backend.placeholder.clone(),
            raw: backend.raw.clone(),
            scene: backend.scene.clone(),
            insights: self.insights.clone(),
            insights_text: self
                .status
                .as_ref()
                .filter(|s| s.kind == "success")
                .map(|_| self.insights.join(&self.separator)),
            status: self.status.clone(),
            health: HealthView::from(&self.health),
            has_payload: self.view.last_payload().is_some(),
            logged_in: self.token.is_some(),
            permissions: self.permissions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DisplaySurface;
    use serde_json::json;

    fn spec_for(body: serde_json::Value) -> ChartSpec {
        crate::chart::to_chart_spec(&crate::shape::classify(&body)).unwrap()
    }

    #[test]
    fn backend_holds_single_chart() {
        let mut surface = DisplaySurface::new(WebBackend::default());
        let body = json!({"data": {"cold": 1}});
        let spec = spec_for(body.clone());
        surface.render(Some(&spec), &body);
        surface.render(Some(&spec), &body);
        assert_eq!(surface.backend().chart.as_ref().map(|(id, _)| *id), Some(2));

        surface.render(None, &body);
        assert!(surface.backend().chart.is_none());
        assert!(surface.backend().placeholder.is_some());
    }

    #[test]
    fn login_grant_reaches_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CrmLensConfig::default();
        config.session.path = dir.path().join("session.json").display().to_string();
        config.logging.enabled = false;
        let mut dashboard = Dashboard::from_config(&config);

        let body = json!({"data": {"user": {
            "full_name": "Olena",
            "role": {"name": "Admin", "level": 1},
            "frontend_permissions": {"leads": {"view": true, "delete": false}}
        }}});
        dashboard
            .set_login(LoginGrant {
                token: "tok".to_string(),
                permissions: PermissionMatrix::from_login_body(&body),
            })
            .unwrap();

        let snap = serde_json::to_value(dashboard.snapshot()).unwrap();
        assert_eq!(snap["logged_in"], true);
        assert_eq!(snap["permissions"]["full_name"], "Olena");
        assert_eq!(snap["permissions"]["role"]["level"], 1);
        let leads = &snap["permissions"]["sections"][0];
        assert_eq!(leads["title"], "LEADS");
        assert_eq!(leads["rows"][1]["granted"], false);
        assert_eq!(dashboard.session.load().as_deref(), Some("tok"));
    }

    #[test]
    fn health_view_flattens_status() {
        let view = HealthView::from(&HealthStatus::Degraded(502));
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["state"], "degraded");
        assert_eq!(value["detail"], 502);
        assert_eq!(value["color"], "#ff006e");
    }
}
