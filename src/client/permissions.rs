//! Role badge and permission matrix carried by a successful login response.
//!
//! The login body describes the user under `data.user`:
//! `frontend_permissions` is a `section -> {permission -> flag}` object,
//! `status_permissions` holds `can_change_status` plus a nested
//! `role_limitations` object, and `stats` is a flat record of counters.
//! Flags follow JavaScript truthiness; a flag that is absent reads as not
//! granted.

use serde::Serialize;
use serde_json::{Map, Value};

/// Title of the section built from `status_permissions`.
pub const STATUS_SECTION: &str = "STATUS PERMISSIONS";

/// Flags of the status section, in display order. The first lives directly
/// under `status_permissions`, the rest under `role_limitations`.
const STATUS_FLAGS: [&str; 4] = [
    "can_change_status",
    "warehouse_operations",
    "can_complete",
    "can_decline",
];

/// Display labels for known permission keys. Unknown keys show as is.
const LABELS: &[(&str, &str)] = &[
    ("view", "View"),
    ("create", "Create"),
    ("edit", "Edit"),
    ("delete", "Delete"),
    ("change_status", "Change status"),
    ("assign_manager", "Assign manager"),
    ("view_payments", "View payments"),
    ("view_analytics", "View analytics"),
    ("export", "Export"),
    ("add", "Add"),
    ("user_management", "Users"),
    ("system_settings", "System settings"),
    ("database_access", "Database access"),
    ("logs", "Logs"),
    ("bulk_operations", "Bulk operations"),
    ("assign_leads", "Assign leads"),
    ("team_stats", "Team statistics"),
    ("dashboard", "Dashboard"),
    ("admin_panel", "Admin panel"),
    ("advanced_filters", "Advanced filters"),
    ("bulk_edit", "Bulk edit"),
    ("export_data", "Export data"),
    ("can_change_status", "Can change statuses"),
    ("warehouse_operations", "Warehouse operations"),
    ("can_complete", "Can complete"),
    ("can_decline", "Can decline"),
];

pub fn permission_label(key: &str) -> &str {
    LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(key, |(_, label)| *label)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleBadge {
    pub name: String,
    pub level: Option<i64>,
    pub description: Option<String>,
    /// CSS color the server assigns to the role.
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRow {
    pub key: String,
    pub label: String,
    pub granted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionSection {
    pub title: String,
    pub rows: Vec<PermissionRow>,
}

/// Who logged in and what they may do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionMatrix {
    pub full_name: Option<String>,
    pub role: Option<RoleBadge>,
    /// One section per `frontend_permissions` entry, in payload order, then
    /// the status section.
    pub sections: Vec<PermissionSection>,
    /// `stats` as `(label, value)`; strings unquoted, other values as JSON.
    pub stats: Vec<(String, String)>,
}

impl PermissionMatrix {
    /// Build the matrix from a login response body. `None` when the body
    /// carries no `data.user` object.
    pub fn from_login_body(body: &Value) -> Option<Self> {
        let user = body.pointer("/data/user")?.as_object()?;

        let mut sections: Vec<PermissionSection> = user
            .get("frontend_permissions")
            .and_then(Value::as_object)
            .map(|perms| {
                perms
                    .iter()
                    .map(|(section, flags)| PermissionSection {
                        title: section.replace('_', " ").to_uppercase(),
                        rows: flags
                            .as_object()
                            .map(|flags| flags.iter().map(|(k, v)| row(k, Some(v))).collect())
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let status = user.get("status_permissions");
        let limits = status.and_then(|s| s.get("role_limitations"));
        sections.push(PermissionSection {
            title: STATUS_SECTION.to_string(),
            rows: STATUS_FLAGS
                .iter()
                .enumerate()
                .map(|(idx, key)| {
                    let source = if idx == 0 { status } else { limits };
                    row(key, source.and_then(|s| s.get(*key)))
                })
                .collect(),
        });

        Some(Self {
            full_name: user.get("full_name").and_then(Value::as_str).map(str::to_string),
            role: user.get("role").and_then(Value::as_object).map(role_badge),
            sections,
            stats: user
                .get("stats")
                .and_then(Value::as_object)
                .map(|stats| {
                    stats
                        .iter()
                        .map(|(k, v)| (permission_label(k).to_string(), display_value(v)))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// `"Jane Doe (Manager)"`, falling back to whichever part is known.
    pub fn headline(&self) -> Option<String> {
        let role = self.role.as_ref().map(|r| r.name.as_str());
        match (self.full_name.as_deref(), role) {
            (Some(name), Some(role)) => Some(format!("{name} ({role})")),
            (Some(name), None) => Some(name.to_string()),
            (None, Some(role)) => Some(role.to_string()),
            (None, None) => None,
        }
    }

    pub fn section(&self, title: &str) -> Option<&PermissionSection> {
        self.sections.iter().find(|s| s.title == title)
    }
}

impl PermissionSection {
    pub fn granted(&self, key: &str) -> Option<bool> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.granted)
    }
}

fn row(key: &str, value: Option<&Value>) -> PermissionRow {
    PermissionRow {
        key: key.to_string(),
        label: permission_label(key).to_string(),
        granted: value.is_some_and(truthy),
    }
}

fn role_badge(role: &Map<String, Value>) -> RoleBadge {
    let text = |k: &str| role.get(k).and_then(Value::as_str).map(str::to_string);
    RoleBadge {
        name: text("name").unwrap_or_default(),
        level: role.get("level").and_then(crate::shape::numeric).map(|n| n as i64),
        description: text("description"),
        color: text("color"),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
