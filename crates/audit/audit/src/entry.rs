use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use iyashi_core::Role;

/// A single audit entry for a critical gateway action.
///
/// Flat by design: the collector receives exactly this shape as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for this entry (UUID v7).
    pub id: String,
    /// When the gateway produced the entry.
    pub timestamp: DateTime<Utc>,
    /// Subject identifier of the caller.
    pub subject_id: String,
    /// The caller's role.
    pub role: Role,
    /// The action performed, as `"<METHOD> <path>"`.
    pub action: String,
    /// Trailing path segment when it looks like a resource identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// HTTP status of the response returned to the caller.
    pub result_status: u16,
}

impl AuditEntry {
    /// Build an entry for an action performed now.
    pub fn new(
        subject_id: impl Into<String>,
        role: Role,
        method: &str,
        path: &str,
        result_status: u16,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            subject_id: subject_id.into(),
            role,
            action: format!("{method} {path}"),
            resource_id: resource_id_from_path(path),
            result_status,
        }
    }
}

/// Extract the trailing path segment when it is identifier-shaped
/// (all-numeric or a UUID). Collection paths yield `None`.
pub fn resource_id_from_path(path: &str) -> Option<String> {
    let last = path.trim_end_matches('/').rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }
    let numeric = last.bytes().all(|b| b.is_ascii_digit());
    let uuid_like = uuid::Uuid::parse_str(last).is_ok();
    (numeric || uuid_like).then(|| last.to_owned())
}
