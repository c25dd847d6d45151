/// Background health check of the CRM API.
///
/// One worker thread waits for the configured interval, probes, and reports
/// a [`HealthStatus`] through a callback. Probe failures only change the
/// status; they never reach the user's call path. The worker stops when
/// [`HealthMonitor::stop`] is called or the monitor is dropped.
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::client::ApiClient;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum HealthStatus {
    /// Ping answered 2xx.
    Online,
    /// Ping answered with this non-2xx status.
    Degraded(u16),
    /// Ping did not reach the server.
    Unreachable(String),
    /// No saved token, nothing probed.
    NoSession,
}

impl HealthStatus {
    /// Indicator color.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Online => "#00ff41",
            Self::Degraded(_) => "#ff006e",
            Self::Unreachable(_) => "#ffff00",
            Self::NoSession => "#808080",
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Online => "online".to_string(),
            Self::Degraded(status) => format!("degraded (HTTP {status})"),
            Self::Unreachable(msg) => format!("unreachable: {msg}"),
            Self::NoSession => "no session".to_string(),
        }
    }
}

/// Ping the API once with a bounded wait.
pub fn probe_once(client: &ApiClient, token: Option<&str>, timeout: Duration) -> HealthStatus {
    let Some(token) = token else {
        return HealthStatus::NoSession;
    };
    match client.ping(token, timeout) {
        Ok(response) if response.ok => HealthStatus::Online,
        Ok(response) => HealthStatus::Degraded(response.status),
        Err(err) => HealthStatus::Unreachable(err.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Handle to the health check worker.
pub struct HealthMonitor {
    stop_tx: Option<Sender<()>>,
    worker_handle: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Spawn the worker. The first probe runs after one full `interval`.
    pub fn start<P, F>(interval: Duration, mut probe: P, mut on_status: F) -> Result<Self>
    where
        P: FnMut() -> HealthStatus + Send + 'static,
        F: FnMut(HealthStatus) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let worker_handle = thread::Builder::new()
            .name("crmlens-health".to_string())
            .spawn(move || {
                // Either a stop message or a dropped sender ends the loop.
                while let Err(RecvTimeoutError::Timeout) = stop_rx.recv_timeout(interval) {
                    on_status(probe());
                }
            })
            .context("failed to spawn health monitor thread")?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            worker_handle: Some(worker_handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.worker_handle.is_some()
    }

    /// Wake the worker and wait for it to exit. An in-flight probe finishes
    /// first. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
