//! Per-endpoint aggregation of the call log for `crmlens history`.

use std::collections::HashMap;

use serde::Serialize;

use super::logger::{CallLogEntry, CallOutcome};

/// Aggregated figures for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStat {
    pub endpoint: String,
    pub calls: usize,
    pub ok: usize,
    pub http_errors: usize,
    pub network_failures: usize,
    pub avg_latency_ms: f64,
    /// Shape seen on the most recent successful call.
    pub last_shape: Option<String>,
}

impl EndpointStat {
    /// Share of calls that succeeded, 0-100.
    pub fn success_pct(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.ok as f64 / self.calls as f64 * 100.0
        }
    }
}

/// Group entries by endpoint, busiest first (ties by endpoint name).
pub fn summarize(entries: &[CallLogEntry]) -> Vec<EndpointStat> {
    let mut by_endpoint: HashMap<&str, EndpointStat> = HashMap::new();
    let mut latency_sum: HashMap<&str, u64> = HashMap::new();

    for entry in entries {
        let stat = by_endpoint
            .entry(entry.endpoint.as_str())
            .or_insert_with(|| EndpointStat {
                endpoint: entry.endpoint.clone(),
                calls: 0,
                ok: 0,
                http_errors: 0,
                network_failures: 0,
                avg_latency_ms: 0.0,
                last_shape: None,
            });

        stat.calls += 1;
        match entry.outcome {
            CallOutcome::Ok => {
                stat.ok += 1;
                if entry.shape.is_some() {
                    stat.last_shape = entry.shape.clone();
                }
            }
            CallOutcome::HttpError => stat.http_errors += 1,
            CallOutcome::NetworkFailure => stat.network_failures += 1,
        }
        *latency_sum.entry(entry.endpoint.as_str()).or_default() += entry.latency_ms;
    }

    let mut stats: Vec<EndpointStat> = by_endpoint
        .into_iter()
        .map(|(endpoint, mut stat)| {
            let sum = latency_sum.get(endpoint).copied().unwrap_or(0);
            stat.avg_latency_ms = sum as f64 / stat.calls as f64;
            stat
        })
        .collect();

    stats.sort_by(|a, b| b.calls.cmp(&a.calls).then_with(|| a.endpoint.cmp(&b.endpoint)));
    stats
}
