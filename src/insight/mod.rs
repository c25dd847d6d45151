/// Human-readable insights derived from a classified payload.
///
/// Lines are emitted in a fixed order: funnel, dashboard, list, cache, and
/// finally the optional canned remark. A ratio whose denominator is zero is
/// not computable and its line is left out, so no `NaN` or `inf` text ever
/// reaches the user.
pub mod filler;

use serde::Serialize;

use crate::shape::{ClassifiedShape, NamedValues, PayloadMeta};

pub use filler::{FillerSource, FixedFiller, NoFiller, RandomFiller};

/// Canned remarks; one may be appended at random.
pub const FILLER_REMARKS: [&str; 5] = [
    "Request patterns look healthy across the sampled endpoints",
    "Token-authenticated channel verified",
    "Payload integrity confirmed for this response",
    "Data synchronization is running at normal throughput",
    "Trend models suggest room for 15% growth",
];

/// Shown in place of an empty insight set.
pub const NO_INSIGHTS: &str = "Analysis complete. Nothing notable in this payload.";

/// Share of total funnel volume above which declines are flagged.
const DECLINE_WARNING_SHARE: f64 = 0.2;

// ---------------------------------------------------------------------------
// InsightSet
// ---------------------------------------------------------------------------

/// Ordered insight lines. Derived only; never fed back into classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InsightSet(Vec<String>);

impl InsightSet {
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Join lines for display, or [`NO_INSIGHTS`] when there are none.
    pub fn join(&self, separator: &str) -> String {
        if self.0.is_empty() {
            NO_INSIGHTS.to_string()
        } else {
            self.0.join(separator)
        }
    }

    fn push(&mut self, line: String) {
        self.0.push(line);
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Derive insights for a shape. `meta` is the envelope metadata of the same
/// payload.
pub fn to_insights(
    shape: &ClassifiedShape,
    meta: &PayloadMeta,
    filler: &mut dyn FillerSource,
) -> InsightSet {
    let mut out = InsightSet::default();

    match shape {
        ClassifiedShape::Funnel(stages) => funnel_insights(stages, &mut out),
        ClassifiedShape::DashboardSummary(fields) => dashboard_insights(fields, &mut out),
        ClassifiedShape::StatusList(items) => list_insights(items.len(), meta, &mut out),
        ClassifiedShape::GenericArray(items) => list_insights(items.len(), meta, &mut out),
        ClassifiedShape::TemperatureMap(_) | ClassifiedShape::Unclassified(_) => {}
    }

    if meta.cache_hit {
        out.push(match meta.cache_expires_in {
            Some(ttl) => format!("Served from server cache (TTL {}s)", format_count(ttl)),
            None => "Served from server cache".to_string(),
        });
    }

    if let Some(idx) = filler.pick(FILLER_REMARKS.len()) {
        out.push(FILLER_REMARKS[idx].to_string());
    }

    out
}

fn funnel_insights(stages: &NamedValues, out: &mut InsightSet) {
    let completed = stages.value_or_zero("completed");
    if let Some(conversion) = stages.get("queued").and_then(|q| percent(completed, q)) {
        out.push(format!("Conversion rate {conversion:.1}% (completed / queued)"));
    }

    let ready = stages.value_or_zero("warehouse_ready");
    let processing = stages.value_or_zero("warehouse_processing");
    if ready > processing {
        out.push(format!(
            "Warehouse efficiency: {} orders ready to ship, {} still in processing",
            format_count(ready),
            format_count(processing)
        ));
    }

    let declined = stages.value_or_zero("declined");
    let total = stages.total();
    if declined > total * DECLINE_WARNING_SHARE
        && let Some(rate) = percent(declined, total)
    {
        out.push(format!(
            "High decline rate: {rate:.1}% of funnel volume declined, review lead qualification"
        ));
    }
}

fn dashboard_insights(fields: &NamedValues, out: &mut InsightSet) {
    let hot = fields.value_or_zero("hot_leads");
    if hot > 0.0 {
        out.push(format!("{} hot leads need immediate follow-up", format_count(hot)));
    }

    let churn = fields.value_or_zero("churn_risk");
    if churn > 0.0 {
        out.push(format!("{} clients at risk of churn", format_count(churn)));
    }

    let akb = fields.value_or_zero("akb_clients");
    if let Some(efficiency) = fields
        .get("total_clients")
        .and_then(|total| percent(akb, total))
    {
        out.push(format!(
            "Active client base: {efficiency:.1}% of all clients"
        ));
    }
}

fn list_insights(count: usize, meta: &PayloadMeta, out: &mut InsightSet) {
    out.push(format!("{count} records received"));

    if let Some(total) = meta.declared_total
        && let Some(share) = percent(count as f64, total)
    {
        out.push(format!(
            "{share:.1}% of {} records transmitted",
            format_count(total)
        ));
    }
}

/// `part / whole * 100`, or `None` when the ratio is not computable.
fn percent(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 {
        return None;
    }
    let pct = part / whole * 100.0;
    pct.is_finite().then_some(pct)
}

/// Whole numbers without a decimal point, anything else to one place.
fn format_count(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n:.1}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::classify;
    use serde_json::json;

    fn insights_for(body: serde_json::Value) -> InsightSet {
        let shape = classify(&body);
        let meta = PayloadMeta::from_body(&body);
        to_insights(&shape, &meta, &mut NoFiller)
    }

    #[test]
    fn percent_guards_zero_denominator() {
        assert_eq!(percent(5.0, 0.0), None);
        assert_eq!(percent(0.0, 0.0), None);
        assert_eq!(percent(1.0, 4.0), Some(25.0));
    }

    #[test]
    fn format_count_drops_trailing_zero() {
        assert_eq!(format_count(5.0), "5");
        assert_eq!(format_count(2.24), "2.2");
        assert_eq!(format_count(-3.0), "-3");
    }

    #[test]
    fn funnel_without_queued_has_no_conversion_line() {
        let set = insights_for(json!({"data": {"funnel": {"completed": 4}}}));
        assert!(set.lines().iter().all(|l| !l.contains("Conversion")));
    }

    #[test]
    fn dashboard_efficiency_omitted_for_zero_clients() {
        let set = insights_for(json!({"data": {"summary": {
            "total_clients": 0,
            "akb_clients": 0,
            "hot_leads": 3
        }}}));
        assert_eq!(set.lines(), &["3 hot leads need immediate follow-up".to_string()]);
    }

    #[test]
    fn dashboard_emits_in_rule_order() {
        let set = insights_for(json!({"data": {"summary": {
            "total_clients": 200,
            "akb_clients": 50,
            "hot_leads": 4,
            "churn_risk": 2
        }}}));
        assert_eq!(set.len(), 3);
        assert!(set.lines()[0].starts_with("4 hot leads"));
        assert!(set.lines()[1].starts_with("2 clients at risk"));
        assert_eq!(set.lines()[2], "Active client base: 25.0% of all clients");
    }

    #[test]
    fn list_reports_share_of_declared_total() {
        let set = insights_for(json!({
            "data": [{"id": 1}, {"id": 2}],
            "meta": {"total_leads": 8}
        }));
        assert_eq!(set.lines()[0], "2 records received");
        assert_eq!(set.lines()[1], "25.0% of 8 records transmitted");
    }

    #[test]
    fn cache_remark_follows_shape_remarks() {
        let set = insights_for(json!({
            "data": [{"code": 1, "name": "New"}],
            "meta": {"cache_hit": true, "cache_expires_in": 300}
        }));
        assert_eq!(set.lines().last().unwrap(), "Served from server cache (TTL 300s)");
    }

    #[test]
    fn filler_is_appended_last() {
        let body = json!({"data": {"summary": {"hot_leads": 1}}});
        let set = to_insights(&classify(&body), &PayloadMeta::default(), &mut FixedFiller(1));
        assert_eq!(set.lines().last().unwrap(), FILLER_REMARKS[1]);
    }

    #[test]
    fn empty_set_joins_to_fallback() {
        let set = insights_for(json!({"data": {"cold": 1}}));
        assert!(set.is_empty());
        assert_eq!(set.join(" | "), NO_INSIGHTS);
    }
}
