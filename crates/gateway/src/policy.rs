use iyashi_core::Role;

use crate::error::GatewayError;

/// One access rule: a path prefix and the roles allowed beneath it.
#[derive(Debug, Clone)]
pub struct PolicyEntry {
    /// Path prefix this entry covers (e.g. `/api/admin`).
    pub path_prefix: String,
    /// Roles permitted to invoke paths under the prefix.
    pub allowed_roles: Vec<Role>,
}

impl PolicyEntry {
    /// Build an entry.
    pub fn new(path_prefix: impl Into<String>, allowed_roles: impl Into<Vec<Role>>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            allowed_roles: allowed_roles.into(),
        }
    }
}

/// Ordered allow-list mapping path prefixes to permitted roles.
///
/// Built once at startup and read-only afterwards. Lookup returns the
/// first entry whose prefix the path starts with; a path matching no
/// entry is unrestricted. Deployments that want deny-by-default can
/// append a catch-all `"/"` entry as the last rule.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: Vec<PolicyEntry>,
}

impl PolicyTable {
    /// Build a table from ordered entries.
    pub fn new(entries: Vec<PolicyEntry>) -> Self {
        Self { entries }
    }

    /// The built-in allow-list for the platform's sensitive sub-trees.
    pub fn platform_defaults() -> Self {
        use Role::{Affiliate, Agency, FacilityHost, PlatformAdmin, Therapist};
        Self::new(vec![
            PolicyEntry::new("/api/admin", vec![PlatformAdmin]),
            PolicyEntry::new("/api/agency", vec![Agency, PlatformAdmin]),
            PolicyEntry::new("/api/hosts", vec![FacilityHost, Agency, PlatformAdmin]),
            PolicyEntry::new("/api/therapists", vec![Therapist, Agency, PlatformAdmin]),
            PolicyEntry::new("/api/affiliates", vec![Affiliate, PlatformAdmin]),
        ])
    }

    /// The allowed-role set for a path, or `None` when no prefix matches
    /// (the route is unrestricted).
    pub fn allowed_roles(&self, path: &str) -> Option<&[Role]> {
        self.entries
            .iter()
            .find(|e| path.starts_with(e.path_prefix.as_str()))
            .map(|e| e.allowed_roles.as_slice())
    }

    /// Check a role against the table. Pure and side-effect free.
    pub fn authorize(&self, role: Role, path: &str) -> Result<(), GatewayError> {
        match self.allowed_roles(path) {
            None => Ok(()),
            Some(allowed) if allowed.contains(&role) => Ok(()),
            Some(_) => Err(GatewayError::Forbidden {
                role,
                path: path.to_owned(),
            }),
        }
    }
}
