/// Settings for crmlens, resolved from four sources.
///
/// Lowest to highest precedence: the built-in defaults, the per-user file
/// `~/.crmlens/config.toml`, a `.crmlens.toml` next to where the command
/// runs, and `CRMLENS_*` environment variables.
///
/// Files do not merge key by key. The highest file present is taken as a
/// whole; sections and keys it omits fall back to the built-in defaults
/// because every section deserializes with `serde(default)`.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub use schema::{CrmLensConfig, ViewMode};

const USER_DIR: &str = ".crmlens";
const USER_FILE: &str = "config.toml";
const PROJECT_FILE: &str = ".crmlens.toml";

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the effective configuration. Never fails: unreadable or
/// malformed files are skipped.
pub fn load() -> CrmLensConfig {
    let mut config = [project_config_file(), global_config_file()]
        .into_iter()
        .find_map(read_file)
        .unwrap_or_default();
    apply_env(&mut config);
    config
}

fn read_file(path: Option<PathBuf>) -> Option<CrmLensConfig> {
    let text = fs::read_to_string(path?).ok()?;
    toml::from_str(&text).ok()
}

/// `~/.crmlens/config.toml`, or `None` without a home directory.
pub fn global_config_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(USER_DIR).join(USER_FILE))
}

/// `.crmlens.toml` in the working directory.
pub fn project_config_file() -> Option<PathBuf> {
    std::env::current_dir().ok().map(|cwd| cwd.join(PROJECT_FILE))
}

/// Expand a leading `~` in a configured path to the home directory.
///
/// Paths without a leading `~`, or when no home directory is known, are
/// returned unchanged.
pub fn expand_path(raw: &str) -> PathBuf {
    if raw == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// `CRMLENS_BASE_URL`, `CRMLENS_CSRF_TOKEN`, `CRMLENS_SESSION_PATH`,
/// `CRMLENS_HEALTH_INTERVAL_SECS`, `CRMLENS_FILLER`, `CRMLENS_VIEW` and
/// `CRMLENS_LOGGING`. Empty or unparsable values are ignored, except for the
/// CSRF token where empty means "send no header".
fn apply_env(config: &mut CrmLensConfig) {
    if let Some(url) = env("CRMLENS_BASE_URL").filter(|v| !v.is_empty()) {
        config.api.base_url = url;
    }
    if let Some(csrf) = env("CRMLENS_CSRF_TOKEN") {
        config.api.csrf_token = csrf;
    }
    if let Some(path) = env("CRMLENS_SESSION_PATH").filter(|v| !v.is_empty()) {
        config.session.path = path;
    }
    if let Some(secs) = env("CRMLENS_HEALTH_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        config.health.interval_secs = secs;
    }
    if let Some(flag) = env("CRMLENS_FILLER") {
        config.insights.filler = parse_flag(&flag);
    }
    if let Some(mode) = env("CRMLENS_VIEW").as_deref().and_then(parse_view_mode) {
        config.view.default_mode = mode;
    }
    if let Some(flag) = env("CRMLENS_LOGGING") {
        config.logging.enabled = parse_flag(&flag);
    }
}

/// `1`, `true`, `yes` and `on` (any case) are true; anything else is false.
fn parse_flag(raw: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|t| raw.trim().eq_ignore_ascii_case(t))
}

/// `chart`, `scene` (or `3d`), `json` (or `raw`), case-insensitive.
pub fn parse_view_mode(val: &str) -> Option<ViewMode> {
    match val.trim().to_ascii_lowercase().as_str() {
        "chart" => Some(ViewMode::Chart),
        "scene" | "3d" => Some(ViewMode::Scene),
        "json" | "raw" => Some(ViewMode::Json),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Editing the user file
// ---------------------------------------------------------------------------

fn user_file() -> Result<PathBuf> {
    global_config_file().context("no home directory; cannot locate ~/.crmlens")
}

fn write_user_file(path: &Path, text: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }
    fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}

/// Write the commented default file. Refuses to replace an existing file
/// unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = user_file()?;
    if !force && path.exists() {
        bail!("{} exists; pass --force to replace it", path.display());
    }
    write_user_file(&path, &CrmLensConfig::default_toml())?;
    Ok(path)
}

/// Overwrite the user file with defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Change one `section.key` in the user file, creating the file from
/// defaults if needed. The raw value is parsed as the type the key already
/// holds.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = user_file()?;
    let mut doc: toml::Table = match fs::read_to_string(&path) {
        Ok(text) => toml::from_str(&text)
            .with_context(|| format!("{} is not valid TOML", path.display()))?,
        Err(_) => default_table()?,
    };

    assign(&mut doc, key, value)?;

    let text = toml::to_string_pretty(&doc).context("cannot serialize config")?;
    write_user_file(&path, &text)
}

fn default_table() -> Result<toml::Table> {
    let text = toml::to_string(&CrmLensConfig::default()).context("cannot serialize defaults")?;
    toml::from_str(&text).context("cannot build default config table")
}

/// Walk `key` through nested tables and replace the leaf with `raw`,
/// converted to the leaf's current type. Unknown keys are an error.
fn assign(table: &mut toml::Table, key: &str, raw: &str) -> Result<()> {
    match key.split_once('.') {
        Some((head, rest)) => match table.get_mut(head) {
            Some(toml::Value::Table(inner)) => assign(inner, rest, raw),
            Some(_) => bail!("'{head}' is a value, not a section"),
            None => bail!("unknown config section '{head}'"),
        },
        None => {
            let slot = table
                .get_mut(key)
                .with_context(|| format!("unknown config key '{key}'"))?;
            *slot = coerce(slot, key, raw)?;
            Ok(())
        }
    }
}

fn coerce(current: &toml::Value, key: &str, raw: &str) -> Result<toml::Value> {
    Ok(match current {
        toml::Value::Boolean(_) => toml::Value::Boolean(parse_flag(raw)),
        toml::Value::Integer(_) => toml::Value::Integer(
            raw.trim()
                .parse()
                .with_context(|| format!("'{key}' takes a whole number, not '{raw}'"))?,
        ),
        toml::Value::Float(_) => toml::Value::Float(
            raw.trim()
                .parse()
                .with_context(|| format!("'{key}' takes a number, not '{raw}'"))?,
        ),
        _ => toml::Value::String(raw.to_string()),
    })
}

/// The resolved configuration rendered back to TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("cannot serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> toml::Table {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn flags_accept_common_spellings() {
        for yes in ["1", "true", "YES", " on "] {
            assert!(parse_flag(yes), "{yes}");
        }
        for no in ["0", "off", "", "nope"] {
            assert!(!parse_flag(no), "{no}");
        }
    }

    #[test]
    fn view_mode_aliases() {
        assert_eq!(parse_view_mode("chart"), Some(ViewMode::Chart));
        assert_eq!(parse_view_mode("3D"), Some(ViewMode::Scene));
        assert_eq!(parse_view_mode("scene"), Some(ViewMode::Scene));
        assert_eq!(parse_view_mode("raw"), Some(ViewMode::Json));
        assert_eq!(parse_view_mode("pie"), None);
    }

    #[test]
    fn expand_path_leaves_plain_paths_alone() {
        assert_eq!(expand_path("/tmp/session.json"), PathBuf::from("/tmp/session.json"));
        assert_eq!(expand_path("relative/x"), PathBuf::from("relative/x"));
    }

    #[test]
    fn expand_path_resolves_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_path("~/.crmlens/session.json"),
                home.join(".crmlens").join("session.json")
            );
        }
    }

    #[test]
    fn assign_replaces_string() {
        let mut doc = table("[api]\nbase_url = \"http://a\"\n");
        assign(&mut doc, "api.base_url", "http://b").unwrap();
        assert_eq!(doc["api"]["base_url"].as_str(), Some("http://b"));
    }

    #[test]
    fn assign_keeps_value_types() {
        let mut doc = table("[health]\nenabled = true\ninterval_secs = 30\n");
        assign(&mut doc, "health.enabled", "off").unwrap();
        assign(&mut doc, "health.interval_secs", "10").unwrap();
        assert_eq!(doc["health"]["enabled"].as_bool(), Some(false));
        assert_eq!(doc["health"]["interval_secs"].as_integer(), Some(10));
        assert!(assign(&mut doc, "health.interval_secs", "soon").is_err());
    }

    #[test]
    fn assign_rejects_unknown_paths() {
        let mut doc = table("[api]\nbase_url = \"x\"\n");
        assert!(assign(&mut doc, "nonexistent.key", "value").is_err());
        assert!(assign(&mut doc, "api.nope", "value").is_err());
        assert!(assign(&mut doc, "api.base_url.deeper", "value").is_err());
    }

    #[test]
    fn default_config_converts_to_table() {
        let doc = default_table().unwrap();
        assert!(doc["view"]["default_mode"].is_str());
    }

    #[test]
    fn effective_config_is_valid_toml() {
        let text = show_effective_config().unwrap();
        let _: CrmLensConfig = toml::from_str(&text).unwrap();
    }
}
