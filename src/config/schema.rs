/// Shape of `config.toml`: seven sections (`[api]`, `[session]`, `[health]`,
/// `[insights]`, `[view]`, `[logging]`, `[web]`), each with a default for
/// every field.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level crmlens configuration.
///
/// Maps directly to the `~/.crmlens/config.toml` and `.crmlens.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmLensConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub health: HealthConfig,
    pub insights: InsightsConfig,
    pub view: ViewConfig,
    pub logging: LoggingConfig,
    pub web: WebConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// CRM API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Scheme + host (+ port) of the CRM server. Endpoint paths are appended.
    pub base_url: String,
    /// Path of the credential exchange endpoint.
    pub login_path: String,
    /// Path probed by the background health check.
    pub ping_path: String,
    /// Anti-forgery token sent as `X-CSRFToken`. Empty means the header is
    /// not sent.
    pub csrf_token: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            login_path: "/api/auth/login/".to_string(),
            ping_path: "/api/ping/".to_string(),
            csrf_token: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

/// Where the bearer token is persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path to the session file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "~/.crmlens/session.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [health]
// ---------------------------------------------------------------------------

/// Background health-check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Whether `crmlens web` runs the periodic probe.
    pub enabled: bool,
    /// Seconds between probes.
    pub interval_secs: u64,
    /// Timeout for a single probe (milliseconds). User-triggered calls are
    /// never timed out.
    pub timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_ms: 5000,
        }
    }
}

// ---------------------------------------------------------------------------
// [insights]
// ---------------------------------------------------------------------------

/// Insight text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Append a random canned remark half of the time.
    pub filler: bool,
    /// Separator placed between insight lines when displayed.
    pub separator: String,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            filler: true,
            separator: "\n\n".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [view]
// ---------------------------------------------------------------------------

/// Which representation of the last payload is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// Chart drawn from the chart spec (default).
    #[default]
    Chart,
    /// Commands for the 3D scene widget.
    Scene,
    /// Pretty-printed raw JSON only.
    Json,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chart => write!(f, "chart"),
            Self::Scene => write!(f, "scene"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// View settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Mode used when a command does not pass `--view`.
    pub default_mode: ViewMode,
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Call log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether each call is appended to the JSONL call log.
    pub enabled: bool,
    /// Path to the call log file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.crmlens/call-log.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `crmlens web`.
    pub addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl CrmLensConfig {
    /// Commented file written by `crmlens config init`.
    pub fn default_toml() -> String {
        r#"# crmlens Configuration
#
# Sources, strongest first: CRMLENS_* environment variables, then
# .crmlens.toml in the working directory, then this file, then built-in
# defaults.

[api]
base_url = "http://127.0.0.1:8000"
login_path = "/api/auth/login/"
ping_path = "/api/ping/"
csrf_token = ""                      # Sent as X-CSRFToken when non-empty

[session]
path = "~/.crmlens/session.json"

[health]
enabled = true
interval_secs = 30
timeout_ms = 5000                    # Background probe only

[insights]
filler = true                        # Random canned remark, 50% of the time
separator = "\n\n"

[view]
default_mode = "chart"               # chart | scene | json

[logging]
enabled = true
path = "~/.crmlens/call-log.jsonl"

[web]
addr = "127.0.0.1:9747"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = CrmLensConfig::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.api.login_path, "/api/auth/login/");
        assert!(config.api.csrf_token.is_empty());
        assert_eq!(config.health.interval_secs, 30);
        assert!(config.insights.filler);
        assert_eq!(config.view.default_mode, ViewMode::Chart);
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[api]
base_url = "https://crm.example.com"
"#;
        let config: CrmLensConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://crm.example.com");
        // Everything else falls back to defaults
        assert_eq!(config.api.ping_path, "/api/ping/");
        assert_eq!(config.web.addr, "127.0.0.1:9747");
    }

    #[test]
    fn default_toml_parses_back() {
        let toml_str = CrmLensConfig::default_toml();
        let config: CrmLensConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.insights.separator, "\n\n");
        assert_eq!(config.view.default_mode, ViewMode::Chart);
    }

    #[test]
    fn view_mode_round_trips_through_toml() {
        let config: CrmLensConfig = toml::from_str("[view]\ndefault_mode = \"scene\"\n").unwrap();
        assert_eq!(config.view.default_mode, ViewMode::Scene);
        assert_eq!(ViewMode::Json.to_string(), "json");
    }
}
