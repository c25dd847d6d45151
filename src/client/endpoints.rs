//! Named aliases for the known CRM resources.

use serde::Serialize;

use crate::error::ApiError;

/// Placeholder replaced by the caller-supplied id.
pub const ID_PLACEHOLDER: &str = "{id}";

/// A known CRM resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub alias: &'static str,
    pub path: &'static str,
    pub description: &'static str,
    /// Listed first by `crmlens endpoints` and on the dashboard.
    pub quick: bool,
}

impl Endpoint {
    pub fn needs_id(&self) -> bool {
        self.path.contains(ID_PLACEHOLDER)
    }
}

const fn ep(alias: &'static str, path: &'static str, description: &'static str, quick: bool) -> Endpoint {
    Endpoint {
        alias,
        path,
        description,
        quick,
    }
}

pub const CATALOG: &[Endpoint] = &[
    ep("ping", "/api/ping/", "Service heartbeat", true),
    ep("dashboard", "/api/crm/dashboard/", "CRM dashboard summary", true),
    ep("funnel", "/api/analytics/funnel/", "Sales funnel by stage", true),
    ep("hot-leads", "/api/clients/hot-leads/", "Clients marked hot", true),
    ep("payments", "/api/analytics/payments/", "Payment analytics", true),
    ep("leads-report", "/api/analytics/leads-report/", "Lead report", true),
    ep("churn-risk", "/api/clients/churn-risk/", "Clients at risk of churn", true),
    ep("segments", "/api/crm/segments/", "Client segments", true),
    ep("leads", "/api/leads/", "All leads", false),
    ep("clients", "/api/clients/", "All clients", false),
    ep("detailed-report", "/api/analytics/detailed-report/", "Detailed analytics report", false),
    ep("rfm", "/api/clients/rfm-analysis/", "RFM analysis", false),
    ep("temperature", "/api/clients/temperature-stats/", "Client temperature bands", false),
    ep("akb-segments", "/api/clients/akb-segments/", "Active client base segments", false),
    ep("statuses", "/api/statuses/", "Lead status codes", false),
    ep("managers", "/api/managers/", "Managers", false),
    ep("external-leads", "/api/external/leads/", "Leads from external sources", false),
    ep("my-tasks", "/api/tasks/my-tasks/", "Tasks assigned to me", false),
    ep("overdue-tasks", "/api/tasks/overdue-tasks/", "Overdue tasks", false),
    ep("tasks", "/api/tasks/", "All tasks", false),
    ep("interactions", "/api/interactions/", "Client interactions", false),
    ep("update-metrics", "/api/crm/update-metrics/", "Recompute CRM metrics", false),
    ep("create-tasks", "/api/crm/create-tasks/", "Generate follow-up tasks", false),
    ep("check-duplicate", "/api/leads/check-duplicate/", "Duplicate lead check", false),
    ep("geocode", "/api/utils/geocode/", "Geocoding helper", false),
    ep("map-config", "/api/utils/map-config/", "Map widget configuration", false),
    ep("journey", "/api/clients/journey/{id}/", "Journey of one client", false),
    ep("update-temperature", "/api/clients/update-temperature/{id}/", "Temperature of one client", false),
    ep("lead-files", "/api/leads/files/{id}/", "Files attached to a lead", false),
    ep("add-payment", "/api/leads/add-payment/{id}/", "Payments of one lead", false),
    ep("update-status", "/api/leads/update-status/{id}/", "Status of one lead", false),
];

/// Look up an alias (case-insensitive).
pub fn find(alias: &str) -> Option<&'static Endpoint> {
    CATALOG.iter().find(|e| e.alias.eq_ignore_ascii_case(alias))
}

pub fn quick_access() -> impl Iterator<Item = &'static Endpoint> {
    CATALOG.iter().filter(|e| e.quick)
}

/// Map an alias or raw path to the path to request.
///
/// Raw input is accepted when it starts with `/` or an `http(s)://` scheme.
/// Any `{id}` placeholder must be filled from `id`.
pub fn resolve(input: &str, id: Option<&str>) -> Result<String, ApiError> {
    let input = input.trim();
    let template = match find(input) {
        Some(endpoint) => endpoint.path,
        None if is_raw_path(input) => input,
        None => return Err(ApiError::UnknownEndpoint(input.to_string())),
    };

    if !template.contains(ID_PLACEHOLDER) {
        return Ok(template.to_string());
    }

    match id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => Ok(template.replace(ID_PLACEHOLDER, id)),
        None => Err(ApiError::MissingId(template.to_string())),
    }
}

fn is_raw_path(input: &str) -> bool {
    input.starts_with('/') || input.starts_with("http://") || input.starts_with("https://")
}
