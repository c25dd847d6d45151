// Payload-to-view tests: classification, chart specs and insights taken
// through the public pipeline.
use serde_json::json;

use crmlens::chart::{ChartKind, RADAR_MAX, to_chart_spec};
use crmlens::client::{DECODE_ERROR, decode_body};
use crmlens::insight::{FixedFiller, NO_INSIGHTS, NoFiller, FILLER_REMARKS};
use crmlens::pipeline::analyze;
use crmlens::render::{PLACEHOLDER, raw_view};
use crmlens::shape::{ClassifiedShape, classify};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn funnel_wins_over_summary() {
    let body = json!({"data": {
        "funnel": {"queued": 10},
        "summary": {"total_clients": 5}
    }});
    assert!(matches!(classify(&body), ClassifiedShape::Funnel(_)));
}

#[test]
fn same_body_always_classifies_the_same() {
    let body = json!({"data": [{"code": "new", "name": "New"}]});
    assert_eq!(classify(&body), classify(&body.clone()));
}

#[test]
fn empty_data_list_is_unclassified() {
    let body = json!({"data": []});
    assert_eq!(classify(&body).name(), "unclassified");
    assert!(to_chart_spec(&classify(&body)).is_none());
}

#[test]
fn partial_status_list_falls_back_to_generic_array() {
    let body = json!({"data": [{"code": 1, "name": "New"}, {"code": 2}]});
    assert_eq!(classify(&body).name(), "generic_array");
}

// ---------------------------------------------------------------------------
// Funnel
// ---------------------------------------------------------------------------

#[test]
fn funnel_payload_reports_conversion_and_warehouse() {
    let body = json!({"data": {"funnel": {
        "queued": 100,
        "completed": 40,
        "declined": 5,
        "warehouse_ready": 12,
        "warehouse_processing": 3,
        "warehouse_analytics": {"orders": 9}
    }}});

    let analysis = analyze(&body, &mut NoFiller);
    let spec = analysis.spec.expect("funnel chart");
    assert_eq!(spec.kind, ChartKind::Doughnut);
    assert!(!spec.labels.iter().any(|l| l.contains("ANALYTICS")));
    assert_eq!(spec.labels.len(), 5);

    let lines = analysis.insights.lines();
    assert_eq!(lines[0], "Conversion rate 40.0% (completed / queued)");
    assert!(lines[1].contains("12 orders ready to ship"));
    assert!(!lines.iter().any(|l| l.contains("decline")));
}

#[test]
fn heavy_declines_are_flagged() {
    let body = json!({"data": {"funnel": {"queued": 10, "completed": 0, "declined": 40}}});
    let analysis = analyze(&body, &mut NoFiller);
    assert!(
        analysis
            .insights
            .lines()
            .iter()
            .any(|l| l.starts_with("High decline rate: 80.0%"))
    );
}

#[test]
fn funnel_without_queued_has_no_conversion_line() {
    let body = json!({"data": {"funnel": {"queued": 0, "completed": 3}}});
    let analysis = analyze(&body, &mut NoFiller);
    assert!(
        !analysis
            .insights
            .lines()
            .iter()
            .any(|l| l.contains("Conversion"))
    );
    assert!(analysis.insights.lines().iter().all(|l| !l.contains("NaN") && !l.contains("inf")));
}

// ---------------------------------------------------------------------------
// Dashboard, temperature, status list
// ---------------------------------------------------------------------------

#[test]
fn dashboard_axes_are_clamped() {
    let body = json!({"data": {"summary": {
        "total_clients": 1_000_000,
        "akb_clients": 0,
        "hot_leads": 50,
        "total_revenue": "2500.50",
        "urgent_tasks": 0
    }}});
    let analysis = analyze(&body, &mut NoFiller);
    let values = &analysis.spec.expect("radar").series[0].values;
    assert_eq!(values[0], RADAR_MAX);
    assert_eq!(values[2], RADAR_MAX);
    assert!((values[3] - 2.5005).abs() < 1e-9);
    assert!(values.iter().all(|v| (0.0..=RADAR_MAX).contains(v)));

    let lines = analysis.insights.lines();
    assert_eq!(lines[0], "50 hot leads need immediate follow-up");
    assert_eq!(lines[1], "Active client base: 0.0% of all clients");
}

#[test]
fn temperature_map_fills_missing_bands_with_zero() {
    let body = json!({"data": {"cold": 4, "hot": 1}});
    let spec = to_chart_spec(&classify(&body)).expect("polar chart");
    assert_eq!(spec.kind, ChartKind::PolarArea);
    assert_eq!(spec.labels, vec!["COLD", "WARM", "HOT", "SLEEPING"]);
    assert_eq!(spec.series[0].values, vec![4.0, 0.0, 1.0, 0.0]);
}

#[test]
fn status_list_plots_one_per_status() {
    let body = json!({
        "data": [
            {"code": "new", "name": "New"},
            {"code": "won", "name": "Won"}
        ],
        "meta": {"total_count": 8}
    });
    let analysis = analyze(&body, &mut NoFiller);
    let spec = analysis.spec.expect("bar chart");
    assert_eq!(spec.kind, ChartKind::Bar);
    assert_eq!(spec.labels, vec!["New", "Won"]);
    assert_eq!(spec.series[0].values, vec![1.0, 1.0]);
    assert_eq!(
        analysis.insights.lines(),
        ["2 records received", "25.0% of 8 records transmitted"]
    );
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

#[test]
fn malformed_body_falls_back_to_raw_view() {
    let body = decode_body("<html>upstream timed out</html>");
    let analysis = analyze(&body, &mut NoFiller);

    assert_eq!(body["error"], DECODE_ERROR);
    assert!(analysis.spec.is_none());
    assert!(raw_view(&body).contains("upstream timed out"));
    assert!(!PLACEHOLDER.is_empty());
    assert_eq!(analysis.insights.join(" | "), NO_INSIGHTS);
}

#[test]
fn cached_payload_mentions_cache() {
    let body = json!({"data": {"cold": 1}, "meta": {"cache_hit": true, "cache_expires_in": 300}});
    let analysis = analyze(&body, &mut NoFiller);
    assert_eq!(analysis.insights.lines(), ["Served from server cache (TTL 300s)"]);
}

#[test]
fn filler_remark_comes_last() {
    let body = json!({"data": [1, 2, 3]});
    let analysis = analyze(&body, &mut FixedFiller(1));
    let lines = analysis.insights.lines();
    assert_eq!(lines.first().map(String::as_str), Some("3 records received"));
    assert_eq!(lines.last().map(String::as_str), Some(FILLER_REMARKS[1]));
}
