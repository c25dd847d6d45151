//! Terminal surface: horizontal bars drawn with `colored`.

use std::io::Write;

use colored::Colorize;

use super::{ChartBackend, SceneCommand};
use crate::chart::ChartSpec;
use crate::client::PermissionMatrix;

/// Width of the longest bar, in cells.
const BAR_WIDTH: usize = 40;

/// Writes charts, placeholders and raw JSON to any `Write` sink.
///
/// Output is best-effort: write errors are ignored, so a closed pipe never
/// aborts a render.
pub struct TerminalBackend<W: Write> {
    out: W,
    show_raw: bool,
}

/// Title of the chart currently printed.
#[derive(Debug)]
pub struct PrintedChart {
    pub title: String,
}

impl<W: Write> TerminalBackend<W> {
    /// `show_raw` controls whether the raw view is printed after the chart.
    pub fn new(out: W, show_raw: bool) -> Self {
        Self { out, show_raw }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartBackend for TerminalBackend<W> {
    type Chart = PrintedChart;

    fn attach(&mut self, spec: &ChartSpec) -> PrintedChart {
        for line in chart_lines(spec) {
            let _ = writeln!(self.out, "{line}");
        }
        PrintedChart {
            title: spec.title.clone(),
        }
    }

    // A printed chart cannot be erased; the next render just follows it.
    fn detach(&mut self, _chart: PrintedChart) {}

    fn show_placeholder(&mut self, text: &str) {
        if !text.is_empty() {
            let _ = writeln!(self.out, "{}", text.yellow());
        }
    }

    fn show_raw(&mut self, pretty_json: &str) {
        if self.show_raw && !pretty_json.is_empty() {
            let _ = writeln!(self.out, "{}", pretty_json.dimmed());
        }
    }

    fn show_scene(&mut self, commands: &[SceneCommand]) {
        let _ = writeln!(self.out, "{}", "3D Scene".bold().cyan());
        for command in commands {
            let line = match command {
                SceneCommand::Scale(s) => format!("scale      {s:.2}"),
                SceneCommand::Color(c) => format!("color      #{c:06x}"),
                SceneCommand::ClearParticles => "particles  cleared".to_string(),
                SceneCommand::SpawnParticles(n) => format!("particles  {n}"),
            };
            let _ = writeln!(self.out, "  {line}");
        }
    }
}

// ---------------------------------------------------------------------------
// Bar layout
// ---------------------------------------------------------------------------

/// Lines for one chart: title, rule, then one bar per label and series.
pub fn chart_lines(spec: &ChartSpec) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", spec.title, spec.kind).bold().cyan().to_string(),
        "=".repeat(60),
    ];

    let label_width = spec.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let max = spec
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(0.0_f64, f64::max);

    let multi = spec.series.len() > 1;
    for (s_idx, series) in spec.series.iter().enumerate() {
        if multi {
            lines.push(format!("  {}", series.name.bold()));
        }
        for (idx, label) in spec.labels.iter().enumerate() {
            let value = series.values.get(idx).copied().unwrap_or(0.0);
            let color_idx = if multi { s_idx } else { idx };
            let bar = paint(&"█".repeat(bar_len(value, max)), spec.theme.color_at(color_idx));
            lines.push(format!(
                "  {:<width$}  {} {}",
                label,
                bar,
                format_value(value),
                width = label_width
            ));
        }
    }

    lines
}

fn bar_len(value: f64, max: f64) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

fn paint(text: &str, color: &str) -> String {
    match parse_rgb(color) {
        Some((r, g, b)) => text.truecolor(r, g, b).to_string(),
        None => text.green().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Permission matrix
// ---------------------------------------------------------------------------

/// Role badge, one block per permission section, then the stats record.
pub fn permission_lines(matrix: &PermissionMatrix) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(role) = &matrix.role {
        let level = role.level.map(|l| format!(" \u{2022} level {l}")).unwrap_or_default();
        let badge = format!(" {}{level} ", role.name);
        lines.push(match role.color.as_deref().and_then(parse_rgb) {
            Some((r, g, b)) => badge.black().on_truecolor(r, g, b).to_string(),
            None => badge.reversed().to_string(),
        });
        if let Some(description) = &role.description {
            lines.push(description.dimmed().to_string());
        }
    }

    for section in &matrix.sections {
        lines.push(String::new());
        lines.push(section.title.bold().cyan().to_string());
        let width = section.rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
        for row in &section.rows {
            let mark = if row.granted { "\u{2713}".green() } else { "\u{2717}".red() };
            lines.push(format!("  {:<width$}  {mark}", row.label));
        }
    }

    if !matrix.stats.is_empty() {
        lines.push(String::new());
        lines.push("STATISTICS".bold().cyan().to_string());
        let width = matrix.stats.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        for (label, value) in &matrix.stats {
            lines.push(format!("  {label:<width$}  {value}"));
        }
    }

    lines
}

/// `"rgba(0, 255, 65, 0.8)"` or `"#00ff41"` → `(0, 255, 65)`.
fn parse_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#')
        && hex.len() == 6
        && hex.is_ascii()
    {
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some((channel(0)?, channel(2)?, channel(4)?));
    }

    let inner = color
        .strip_prefix("rgba(")
        .or_else(|| color.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>().ok());
    Some((parts.next()??, parts.next()??, parts.next()??))
}
