//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `crmlens login` / `crmlens token`: obtain and inspect the bearer token
//! - `crmlens call <endpoint>`: request, classify, chart and explain a payload
//! - `crmlens render <file>`: the same pipeline over a saved payload
//! - `crmlens endpoints`: list the endpoint catalog
//! - `crmlens watch`: foreground health monitor
//! - `crmlens history`: recent calls and per-endpoint summary
//! - `crmlens config show|init|set|reset`: configuration management

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use colored::Colorize;
use serde_json::Value;

use crate::analytics::logger::{self, CallLogEntry, CallOutcome};
use crate::analytics::reporter;
use crate::client::{self, ApiClient, SessionStore, TokenStatus, endpoints, inspect_token};
use crate::config::{self, CrmLensConfig, ViewMode};
use crate::insight::filler;
use crate::monitor::{self, HealthMonitor, HealthStatus};
use crate::pipeline::{self, Analysis, CallReport, ViewState};
use crate::render::TerminalBackend;
use crate::render::terminal::permission_lines;

/// Output format for printable results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// crmlens login | token
// ---------------------------------------------------------------------------

/// Exchange credentials for a token and save it.
///
/// Missing username or password are read from stdin.
pub fn run_login(config: &CrmLensConfig, username: Option<String>, password: Option<String>) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => prompt("Username: ")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };

    let client = ApiClient::from_config(&config.api);
    let grant = client.login(&username, &password)?;

    let store = SessionStore::from_config(&config.session);
    store.save(&grant.token)?;

    let who = grant
        .permissions
        .as_ref()
        .and_then(|m| m.headline())
        .unwrap_or(username);
    println!(
        "{} Logged in as {} (token saved to {})",
        "✓".green().bold(),
        who.bold(),
        store.path().display()
    );
    if let Some(matrix) = &grant.permissions {
        println!();
        for line in permission_lines(matrix) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Show where the token lives and what it says about itself.
pub fn run_token(config: &CrmLensConfig) -> Result<()> {
    let store = SessionStore::from_config(&config.session);
    println!("{}", "Session".bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "File:   ".bold(), store.path().display());

    let Some(token) = store.load() else {
        println!("  {} {}", "Status: ".bold(), "no saved token".yellow());
        return Ok(());
    };

    println!("  {} {}", "Token:  ".bold(), mask_token(&token));
    match inspect_token(&token, Utc::now()) {
        TokenStatus::Active {
            username,
            expires_at,
        } => {
            println!("  {} {}", "Status: ".bold(), "active".green());
            if let Some(user) = username {
                println!("  {} {}", "User:   ".bold(), user);
            }
            if let Some(at) = expires_at {
                println!("  {} {}", "Expires:".bold(), at.to_rfc3339());
            }
        }
        TokenStatus::Expired { expired_at } => {
            println!(
                "  {} {}",
                "Status: ".bold(),
                format!("expired at {}", expired_at.to_rfc3339()).red()
            );
        }
        TokenStatus::Opaque => {
            println!("  {} {}", "Status: ".bold(), "opaque (not a JWT)".dimmed());
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ---------------------------------------------------------------------------
// crmlens call | render
// ---------------------------------------------------------------------------

/// Options shared by `call` and `render`.
#[derive(Debug, Clone)]
pub struct PresentOptions<'a> {
    pub view: Option<ViewMode>,
    pub format: OutputFormat,
    pub export: Option<&'a Path>,
}

/// Request an endpoint and present the result.
pub fn run_call(
    config: &CrmLensConfig,
    endpoint: &str,
    id: Option<&str>,
    options: PresentOptions<'_>,
) -> Result<()> {
    let path = endpoints::resolve(endpoint, id)?;
    let token = SessionStore::from_config(&config.session)
        .load()
        .context("not logged in; run `crmlens login` first")?;

    if let TokenStatus::Expired { expired_at } = inspect_token(&token, Utc::now()) {
        eprintln!(
            "{}",
            format!("warning: saved token expired at {}", expired_at.to_rfc3339()).yellow()
        );
    }

    let client = ApiClient::from_config(&config.api);
    let mode = options.view.unwrap_or(config.view.default_mode);
    let json_out = options.format == OutputFormat::Json;
    let mut state = terminal_state(mode, json_out);
    let mut filler = filler::from_setting(config.insights.filler);
    let log_path = logger::call_log_path(&config.logging);

    let report = pipeline::run_call(
        &client,
        &path,
        &token,
        &mut state,
        filler.as_mut(),
        log_path.as_deref(),
    );

    if let Some(target) = options.export {
        state.export(target)?;
    }

    match &report {
        CallReport::Success { analysis, .. } => {
            if json_out {
                println!("{}", serde_json::to_string_pretty(&analysis.report())?);
            } else {
                println!("{}", report.status_line(&path).green());
                print_insights(analysis, &config.insights.separator);
            }
            Ok(())
        }
        CallReport::HttpError { envelope, .. } | CallReport::NetworkFailure { envelope, .. } => {
            if json_out {
                println!("{}", serde_json::to_string_pretty(envelope)?);
            }
            bail!(report.status_line(&path))
        }
    }
}

/// Run the pipeline over a payload saved to disk.
pub fn run_render(config: &CrmLensConfig, file: &Path, options: PresentOptions<'_>) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let body: Value = client::decode_body(&text);

    let mode = options.view.unwrap_or(config.view.default_mode);
    let json_out = options.format == OutputFormat::Json;
    let mut state = terminal_state(mode, json_out);
    let mut filler = filler::from_setting(config.insights.filler);
    let analysis = state.show_payload(body, filler.as_mut());

    if let Some(target) = options.export {
        state.export(target)?;
    }

    if json_out {
        println!("{}", serde_json::to_string_pretty(&analysis.report())?);
    } else {
        println!(
            "{}",
            format!("Rendered {} ({})", file.display(), analysis.shape.name()).green()
        );
        print_insights(&analysis, &config.insights.separator);
    }
    Ok(())
}

/// Terminal surface for the given mode. JSON output suppresses drawing.
fn terminal_state(mode: ViewMode, json_out: bool) -> ViewState<TerminalBackend<Box<dyn Write>>> {
    let out: Box<dyn Write> = if json_out {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout())
    };
    ViewState::new(TerminalBackend::new(out, mode == ViewMode::Json), mode)
}

fn print_insights(analysis: &Analysis, separator: &str) {
    println!();
    println!("{}", "Insights".bold().cyan());
    println!("{}", "-".repeat(50));
    println!("{}", analysis.insights.join(separator));
}

// ---------------------------------------------------------------------------
// crmlens endpoints
// ---------------------------------------------------------------------------

/// List the endpoint catalog, quick-access entries first.
pub fn run_endpoints(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(endpoints::CATALOG)?);
        }
        OutputFormat::Csv => {
            println!("alias,path,quick,description");
            for e in endpoints::CATALOG {
                println!("{},{},{},\"{}\"", e.alias, e.path, e.quick, e.description);
            }
        }
        OutputFormat::Table => {
            println!("{}", "Quick Access".bold().cyan());
            println!("{}", "=".repeat(70));
            for e in endpoints::quick_access() {
                println!("  {:<20} {:<38} {}", e.alias.bold(), e.path, e.description.dimmed());
            }
            println!();
            println!("{}", "All Endpoints".bold().cyan());
            println!("{}", "=".repeat(70));
            for e in endpoints::CATALOG.iter().filter(|e| !e.quick) {
                let alias = if e.needs_id() {
                    format!("{} <id>", e.alias)
                } else {
                    e.alias.to_string()
                };
                println!("  {:<20} {:<38} {}", alias, e.path, e.description.dimmed());
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// crmlens watch
// ---------------------------------------------------------------------------

/// Print a status line per probe. Stops after `count` probes, or runs until
/// interrupted.
pub fn run_watch(config: &CrmLensConfig, interval_secs: Option<u64>, count: Option<usize>) -> Result<()> {
    let client = ApiClient::from_config(&config.api);
    let token = SessionStore::from_config(&config.session).load();
    let timeout = Duration::from_millis(config.health.timeout_ms);
    let interval = Duration::from_secs(interval_secs.unwrap_or(config.health.interval_secs).max(1));

    println!(
        "Watching {} every {}s (Ctrl+C to stop)",
        client.base_url().bold(),
        interval.as_secs()
    );

    let (tx, rx) = mpsc::channel();
    let mut watcher = HealthMonitor::start(
        interval,
        move || monitor::probe_once(&client, token.as_deref(), timeout),
        move |status| {
            let _ = tx.send(status);
        },
    )?;

    let mut seen = 0;
    for status in rx.iter() {
        println!(
            "{} {}",
            chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
            colorize_health(&status)
        );
        seen += 1;
        if count.is_some_and(|limit| seen >= limit) {
            break;
        }
    }

    watcher.stop();
    Ok(())
}

fn colorize_health(status: &HealthStatus) -> colored::ColoredString {
    let label = format!("● {}", status.label());
    match status {
        HealthStatus::Online => label.green(),
        HealthStatus::Degraded(_) => label.magenta(),
        HealthStatus::Unreachable(_) => label.yellow(),
        HealthStatus::NoSession => label.dimmed(),
    }
}

// ---------------------------------------------------------------------------
// crmlens history
// ---------------------------------------------------------------------------

/// Show the most recent calls and a per-endpoint summary.
pub fn run_history(config: &CrmLensConfig, limit: usize, format: OutputFormat) -> Result<()> {
    let Some(path) = logger::call_log_path(&config.logging) else {
        println!("{}", "Call logging is disabled ([logging] enabled = false).".yellow());
        return Ok(());
    };

    let recent = logger::read_recent(&path, limit);
    if recent.is_empty() {
        println!("{}", "No calls logged yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let summary = reporter::summarize(&logger::read_all_entries(&path));
            let value = serde_json::json!({ "recent": recent, "summary": summary });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            println!("timestamp,endpoint,outcome,status,shape,latency_ms");
            for e in &recent {
                println!(
                    "{},{},{},{},{},{}",
                    e.timestamp,
                    e.endpoint,
                    e.outcome,
                    e.status.map(|s| s.to_string()).unwrap_or_default(),
                    e.shape.as_deref().unwrap_or(""),
                    e.latency_ms
                );
            }
        }
        OutputFormat::Table => print_history_table(&recent, &logger::read_all_entries(&path)),
    }
    Ok(())
}

fn print_history_table(recent: &[CallLogEntry], all: &[CallLogEntry]) {
    println!("{}", "Recent Calls".bold().cyan());
    println!("{}", "=".repeat(78));
    println!(
        "  {:<20} {:<34} {:<8} {:<18} {:>8}",
        "Time".bold(),
        "Endpoint".bold(),
        "Status".bold(),
        "Shape".bold(),
        "ms".bold()
    );
    println!("  {}", "-".repeat(76));
    for e in recent {
        let time = e.timestamp.get(..19).unwrap_or(&e.timestamp).replace('T', " ");
        let status = e
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<20} {:<34} {:<8} {:<18} {:>8}",
            time,
            truncate(&e.endpoint, 34),
            colorize_outcome(e.outcome, &status),
            e.shape.as_deref().unwrap_or("-"),
            e.latency_ms
        );
    }

    println!();
    println!("{}", "By Endpoint".bold().cyan());
    println!("{}", "=".repeat(78));
    for stat in reporter::summarize(all) {
        println!(
            "  {:<34} {:>5} calls  {:>5.1}% ok  {:>8.1} ms avg  {}",
            truncate(&stat.endpoint, 34),
            stat.calls,
            stat.success_pct(),
            stat.avg_latency_ms,
            stat.last_shape.as_deref().unwrap_or("").dimmed()
        );
    }
}

fn colorize_outcome(outcome: CallOutcome, text: &str) -> colored::ColoredString {
    match outcome {
        CallOutcome::Ok => text.green(),
        CallOutcome::HttpError => text.red(),
        CallOutcome::NetworkFailure => text.yellow(),
    }
}

// ---------------------------------------------------------------------------
// crmlens config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective crmlens Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let source = |found: bool, name: &str| {
        if found {
            println!("  {} {}", "✓".green(), name.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
        }
    };

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    source(
        config::global_config_file().is_some_and(|p| p.exists()),
        "~/.crmlens/config.toml",
    );
    source(
        config::project_config_file().is_some_and(|p| p.exists()),
        ".crmlens.toml",
    );
    println!("  {} {}", "·".dimmed(), "CRMLENS_* environment variables".dimmed());

    Ok(())
}

/// Write the default config to `~/.crmlens/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Config written to {}", "✓".green().bold(), path.display());
    Ok(())
}

/// Set one dotted key in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// First and last few characters of a token.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
