/// Visualization dispatcher: classified shape → renderer-agnostic chart spec.
///
/// Each shape maps to exactly one chart kind. `None` means no numeric chart
/// makes sense and the caller should fall back to the raw JSON view.
///
/// | Shape              | Kind       | Values                                   |
/// |--------------------|------------|------------------------------------------|
/// | Funnel             | doughnut   | stage values                             |
/// | DashboardSummary   | radar      | 5 derived axes, clamped to [0, 100]      |
/// | TemperatureMap     | polarArea  | cold, warm, hot, sleeping                |
/// | StatusList         | bar        | 1 per status (presence, not a count)     |
/// | GenericArray       | line       | field count per item, first 10 items     |
/// | Unclassified       | none       | `None`                                   |
pub mod theme;

use serde::Serialize;

use crate::shape::{ClassifiedShape, NamedValues, TEMPERATURE_BANDS};

pub use theme::Theme;

/// Items beyond this index are not plotted on a generic trend chart.
pub const MAX_TREND_POINTS: usize = 10;

/// Magnitude plotted for array items that are not objects.
pub const NON_OBJECT_MAGNITUDE: f64 = 0.0;

/// Upper bound of every radar axis.
pub const RADAR_MAX: f64 = 100.0;

// ---------------------------------------------------------------------------
// Spec types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Doughnut,
    Radar,
    PolarArea,
    Bar,
    Line,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Doughnut => write!(f, "doughnut"),
            Self::Radar => write!(f, "radar"),
            Self::PolarArea => write!(f, "polarArea"),
            Self::Bar => write!(f, "bar"),
            Self::Line => write!(f, "line"),
        }
    }
}

/// One named data series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Abstract description of a chart: what to draw, not how.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub theme: Theme,
}

impl ChartSpec {
    fn single(kind: ChartKind, title: &str, labels: Vec<String>, name: &str, values: Vec<f64>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            labels,
            series: vec![Series {
                name: name.to_string(),
                values,
            }],
            theme: Theme::for_kind(kind),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Build the chart spec for a classified shape.
pub fn to_chart_spec(shape: &ClassifiedShape) -> Option<ChartSpec> {
    match shape {
        ClassifiedShape::Funnel(stages) => Some(funnel_chart(stages)),
        ClassifiedShape::DashboardSummary(fields) => Some(dashboard_chart(fields)),
        ClassifiedShape::TemperatureMap(bands) => Some(ChartSpec::single(
            ChartKind::PolarArea,
            "Lead Temperature",
            TEMPERATURE_BANDS.iter().map(|b| b.to_uppercase()).collect(),
            "Leads",
            bands.values().to_vec(),
        )),
        ClassifiedShape::StatusList(statuses) => Some(ChartSpec::single(
            ChartKind::Bar,
            "Status Codes",
            statuses.iter().map(|s| s.name.clone()).collect(),
            "Status Distribution",
            vec![1.0; statuses.len()],
        )),
        ClassifiedShape::GenericArray(items) => {
            let shown = &items[..items.len().min(MAX_TREND_POINTS)];
            Some(ChartSpec::single(
                ChartKind::Line,
                "Data Stream",
                (1..=shown.len()).map(|i| format!("Item {i}")).collect(),
                "Data Points",
                shown
                    .iter()
                    .map(|item| match item.as_object() {
                        Some(obj) => obj.len() as f64,
                        None => NON_OBJECT_MAGNITUDE,
                    })
                    .collect(),
            ))
        }
        ClassifiedShape::Unclassified(_) => None,
    }
}

fn funnel_chart(stages: &NamedValues) -> ChartSpec {
    let (labels, values) = stages
        .iter()
        .map(|(key, value)| (funnel_label(key), value))
        .unzip();
    ChartSpec::single(ChartKind::Doughnut, "Sales Funnel", labels, "Funnel", values)
}

/// `warehouse_ready` → `WAREHOUSE READY`.
fn funnel_label(key: &str) -> String {
    key.replace('_', " ").to_uppercase()
}

enum Scale {
    Div(f64),
    Mul(f64),
}

/// Radar axes: (label, summary field, scaling).
const DASHBOARD_AXES: [(&str, &str, Scale); 5] = [
    ("Clients", "total_clients", Scale::Div(10.0)),
    ("AKB", "akb_clients", Scale::Div(5.0)),
    ("Hot Leads", "hot_leads", Scale::Mul(20.0)),
    ("Revenue (k)", "total_revenue", Scale::Div(1000.0)),
    ("Tasks", "urgent_tasks", Scale::Mul(10.0)),
];

fn dashboard_chart(fields: &NamedValues) -> ChartSpec {
    let (labels, values) = DASHBOARD_AXES
        .iter()
        .map(|(label, field, scale)| {
            let raw = fields.value_or_zero(field);
            let scaled = match scale {
                Scale::Div(d) => raw / d,
                Scale::Mul(m) => raw * m,
            };
            (label.to_string(), scaled.clamp(0.0, RADAR_MAX))
        })
        .unzip();
    ChartSpec::single(ChartKind::Radar, "Dashboard Metrics", labels, "CRM Metrics", values)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
