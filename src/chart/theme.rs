//! Shared cosmetic styling for every chart spec. Purely visual; renderers
//! are free to ignore any of it.

use serde::Serialize;

use super::ChartKind;

const SEGMENT_PALETTE: &[&str] = &[
    "rgba(0, 255, 65, 0.8)",
    "rgba(0, 212, 255, 0.8)",
    "rgba(255, 0, 110, 0.8)",
    "rgba(255, 255, 0, 0.8)",
    "rgba(138, 43, 226, 0.8)",
    "rgba(255, 69, 0, 0.8)",
    "rgba(50, 205, 50, 0.8)",
    "rgba(255, 20, 147, 0.8)",
];

// cold, warm, hot, sleeping
const BAND_PALETTE: &[&str] = &[
    "rgba(0, 212, 255, 0.7)",
    "rgba(255, 255, 0, 0.7)",
    "rgba(255, 0, 110, 0.7)",
    "rgba(128, 128, 128, 0.7)",
];

const SINGLE_PALETTE: &[&str] = &["rgba(0, 255, 65, 0.6)"];

/// Colors for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    /// Text, border and axis color.
    pub foreground: &'static str,
    /// Grid line color.
    pub grid: &'static str,
    /// Fill colors, cycled over data points (or series for line/radar).
    pub palette: &'static [&'static str],
}

impl Theme {
    pub fn for_kind(kind: ChartKind) -> Self {
        let palette = match kind {
            ChartKind::Doughnut => SEGMENT_PALETTE,
            ChartKind::PolarArea => BAND_PALETTE,
            ChartKind::Radar | ChartKind::Bar | ChartKind::Line => SINGLE_PALETTE,
        };
        Self {
            foreground: "#00ff41",
            grid: "rgba(0, 255, 65, 0.1)",
            palette,
        }
    }

    /// Fill color for the `index`-th data point.
    pub fn color_at(&self, index: usize) -> &'static str {
        self.palette[index % self.palette.len()]
    }
}
