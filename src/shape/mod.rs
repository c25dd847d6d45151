/// Structural classification of CRM API payloads.
///
/// The server never declares what kind of data it returned, so the shape is
/// sniffed from the envelope `{ "data": ..., "meta": ... }`. Rules are
/// evaluated in a fixed order and the first match wins; a payload can
/// satisfy several rules at once (a funnel response may also carry a
/// `summary`), and the order is what settles it:
///
/// 1. `data.funnel` is an object → [`ClassifiedShape::Funnel`]
/// 2. `data.summary` is an object → [`ClassifiedShape::DashboardSummary`]
/// 3. `data` is an object with a `cold`, `warm` or `hot` key →
///    [`ClassifiedShape::TemperatureMap`]
/// 4. `data` is a non-empty array of objects that all carry `code` and
///    `name` → [`ClassifiedShape::StatusList`]
/// 5. `data` is a non-empty array → [`ClassifiedShape::GenericArray`]
/// 6. anything else → [`ClassifiedShape::Unclassified`]
///
/// [`classify`] only ever sees the body. It does not know which endpoint
/// produced it, so identical payloads always classify identically.
use serde_json::{Map, Value};

/// Funnel key that holds a nested analytics object rather than a stage.
pub const EXCLUDED_FUNNEL_KEY: &str = "warehouse_analytics";

/// Keys that mark a temperature distribution.
const TEMPERATURE_MARKERS: [&str; 3] = ["cold", "warm", "hot"];

/// Canonical band order used for display.
pub const TEMPERATURE_BANDS: [&str; 4] = ["cold", "warm", "hot", "sleeping"];

// ---------------------------------------------------------------------------
// Shape types
// ---------------------------------------------------------------------------

/// Ordered name → number pairs, in payload key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedValues(Vec<(String, f64)>);

impl NamedValues {
    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    /// Look up a field, treating a missing field as zero.
    pub fn value_or_zero(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    /// Sum of every value.
    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, value)| value).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for NamedValues {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Lead temperature distribution over the four canonical bands.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureBands {
    pub cold: f64,
    pub warm: f64,
    pub hot: f64,
    pub sleeping: f64,
}

impl TemperatureBands {
    /// Values in [`TEMPERATURE_BANDS`] order.
    pub fn values(&self) -> [f64; 4] {
        [self.cold, self.warm, self.hot, self.sleeping]
    }
}

/// One entry of a status code list.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEntry {
    pub code: Value,
    pub name: String,
}

/// The structural category a payload falls into.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedShape {
    /// Sales funnel stages, `warehouse_analytics` removed.
    Funnel(NamedValues),
    /// Numeric fields of a dashboard summary record.
    DashboardSummary(NamedValues),
    /// Lead temperature distribution.
    TemperatureMap(TemperatureBands),
    /// Status code dictionary.
    StatusList(Vec<StatusEntry>),
    /// Any other non-empty list.
    GenericArray(Vec<Value>),
    /// Nothing recognizable; carries the whole body for raw display.
    Unclassified(Value),
}

impl ClassifiedShape {
    /// Short stable name, used in logs and JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Funnel(_) => "funnel",
            Self::DashboardSummary(_) => "dashboard_summary",
            Self::TemperatureMap(_) => "temperature_map",
            Self::StatusList(_) => "status_list",
            Self::GenericArray(_) => "generic_array",
            Self::Unclassified(_) => "unclassified",
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a decoded response body. Total and deterministic.
pub fn classify(body: &Value) -> ClassifiedShape {
    let data = body.get("data");

    if let Some(funnel) = data.and_then(|d| d.get("funnel")).and_then(Value::as_object) {
        return ClassifiedShape::Funnel(funnel_stages(funnel));
    }

    if let Some(summary) = data.and_then(|d| d.get("summary")).and_then(Value::as_object) {
        return ClassifiedShape::DashboardSummary(numeric_fields(summary));
    }

    if let Some(obj) = data.and_then(Value::as_object)
        && TEMPERATURE_MARKERS.iter().any(|k| obj.contains_key(*k))
    {
        return ClassifiedShape::TemperatureMap(temperature_bands(obj));
    }

    if let Some(items) = data.and_then(Value::as_array)
        && !items.is_empty()
    {
        if let Some(statuses) = status_entries(items) {
            return ClassifiedShape::StatusList(statuses);
        }
        return ClassifiedShape::GenericArray(items.clone());
    }

    ClassifiedShape::Unclassified(body.clone())
}

/// Read a JSON value as a number.
///
/// Decimal fields (revenue, payments) are often serialized as strings, so
/// numeric strings count too.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Every funnel key except the excluded one; non-numeric stages count as 0.
fn funnel_stages(funnel: &Map<String, Value>) -> NamedValues {
    funnel
        .iter()
        .filter(|(key, _)| key.as_str() != EXCLUDED_FUNNEL_KEY)
        .map(|(key, value)| (key.clone(), numeric(value).unwrap_or(0.0)))
        .collect()
}

/// Numeric fields only.
fn numeric_fields(record: &Map<String, Value>) -> NamedValues {
    record
        .iter()
        .filter_map(|(key, value)| numeric(value).map(|n| (key.clone(), n)))
        .collect()
}

fn temperature_bands(obj: &Map<String, Value>) -> TemperatureBands {
    let band = |name: &str| obj.get(name).and_then(numeric).unwrap_or(0.0);
    TemperatureBands {
        cold: band("cold"),
        warm: band("warm"),
        hot: band("hot"),
        sleeping: band("sleeping"),
    }
}

/// `Some` only when every item is an object with both `code` and `name`.
fn status_entries(items: &[Value]) -> Option<Vec<StatusEntry>> {
    items
        .iter()
        .map(|item| {
            let obj = item.as_object()?;
            let code = obj.get("code")?;
            let name = obj.get("name")?;
            Some(StatusEntry {
                code: code.clone(),
                name: match name {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Envelope metadata
// ---------------------------------------------------------------------------

/// Fields of `body.meta` that insights report on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadMeta {
    /// Total record count the server says exists (`total_leads`,
    /// `total_count` or `total`, first present wins).
    pub declared_total: Option<f64>,
    /// Whether the server answered from its cache.
    pub cache_hit: bool,
    /// Remaining cache lifetime in seconds.
    pub cache_expires_in: Option<f64>,
}

impl PayloadMeta {
    pub fn from_body(body: &Value) -> Self {
        let Some(meta) = body.get("meta").and_then(Value::as_object) else {
            return Self::default();
        };

        let declared_total = ["total_leads", "total_count", "total"]
            .iter()
            .find_map(|key| meta.get(*key).and_then(numeric));

        let cache_hit = match meta.get("cache_hit") {
            Some(Value::Bool(b)) => *b,
            Some(other) => numeric(other).is_some_and(|n| n != 0.0),
            None => false,
        };

        Self {
            declared_total,
            cache_hit,
            cache_expires_in: meta.get("cache_expires_in").and_then(numeric),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn funnel_excludes_warehouse_analytics() {
        let body = json!({"data": {"funnel": {
            "queued": 10,
            "warehouse_analytics": {"avg_days": 3},
            "completed": 4
        }}});
        let ClassifiedShape::Funnel(stages) = classify(&body) else {
            panic!("expected funnel");
        };
        let keys: Vec<&str> = stages.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["queued", "completed"]);
    }

    #[test]
    fn funnel_wins_over_summary() {
        let body = json!({"data": {
            "summary": {"total_clients": 5},
            "funnel": {"queued": 1},
            "cold": 3
        }});
        assert_eq!(classify(&body).name(), "funnel");
    }

    #[test]
    fn summary_wins_over_temperature() {
        let body = json!({"data": {"summary": {"hot_leads": 2}, "hot": 4}});
        assert_eq!(classify(&body).name(), "dashboard_summary");
    }

    #[test]
    fn summary_keeps_only_numeric_fields() {
        let body = json!({"data": {"summary": {
            "total_clients": 100,
            "total_revenue": "2500.50",
            "label": "Q3"
        }}});
        let ClassifiedShape::DashboardSummary(fields) = classify(&body) else {
            panic!("expected summary");
        };
        assert_eq!(fields.get("total_clients"), Some(100.0));
        assert_eq!(fields.get("total_revenue"), Some(2500.5));
        assert_eq!(fields.get("label"), None);
    }

    #[test]
    fn funnel_that_is_not_an_object_falls_through() {
        let body = json!({"data": {"funnel": [1, 2], "warm": 7}});
        assert_eq!(classify(&body).name(), "temperature_map");
    }

    #[test]
    fn temperature_map_defaults_missing_bands() {
        let body = json!({"data": {"hot": 5, "cold": 2}});
        let ClassifiedShape::TemperatureMap(bands) = classify(&body) else {
            panic!("expected temperature map");
        };
        assert_eq!(bands.values(), [2.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn sleeping_alone_is_not_a_temperature_map() {
        let body = json!({"data": {"sleeping": 5}});
        assert_eq!(classify(&body).name(), "unclassified");
    }

    #[test]
    fn status_list_requires_code_and_name_on_every_item() {
        let body = json!({"data": [{"code": 1, "name": "New"}, {"code": 2}]});
        assert_eq!(classify(&body).name(), "generic_array");

        let body = json!({"data": [{"code": "new", "name": "New"}]});
        assert_eq!(classify(&body).name(), "status_list");
    }

    #[test]
    fn empty_array_is_unclassified() {
        let body = json!({"data": []});
        assert_eq!(classify(&body), ClassifiedShape::Unclassified(body.clone()));
    }

    #[test]
    fn non_envelope_bodies_are_unclassified() {
        for body in [json!(null), json!("pong"), json!([1, 2, 3]), json!({"status": "ok"})] {
            assert_eq!(classify(&body), ClassifiedShape::Unclassified(body.clone()));
        }
    }

    #[test]
    fn numeric_accepts_numbers_and_numeric_strings() {
        assert_eq!(numeric(&json!(3)), Some(3.0));
        assert_eq!(numeric(&json!(" 1.5 ")), Some(1.5));
        assert_eq!(numeric(&json!("abc")), None);
        assert_eq!(numeric(&json!(true)), None);
        assert_eq!(numeric(&json!("NaN")), None);
    }

    #[test]
    fn meta_reads_declared_total_and_cache() {
        let body = json!({"data": [], "meta": {
            "total_count": 40,
            "cache_hit": true,
            "cache_expires_in": 300
        }});
        let meta = PayloadMeta::from_body(&body);
        assert_eq!(meta.declared_total, Some(40.0));
        assert!(meta.cache_hit);
        assert_eq!(meta.cache_expires_in, Some(300.0));
    }

    #[test]
    fn meta_prefers_total_leads() {
        let body = json!({"meta": {"total": 1, "total_leads": 9}});
        assert_eq!(PayloadMeta::from_body(&body).declared_total, Some(9.0));
    }

    #[test]
    fn missing_meta_is_default() {
        assert_eq!(PayloadMeta::from_body(&json!({"data": 1})), PayloadMeta::default());
    }
}
