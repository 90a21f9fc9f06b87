use std::path::Path;

use serde::Deserialize;

use iyashi_core::Role;
use iyashi_gateway::{PolicyEntry, PolicyTable};

use crate::error::ServerError;

/// Top-level configuration for the BFF server, loaded from a TOML file.
///
/// Every external endpoint can also be supplied from the environment;
/// environment values override the file.
#[derive(Debug, Default, Deserialize)]
pub struct BffConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token verification configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upstream domain API configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Audit collector configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Access policy entries. Empty means the built-in platform defaults.
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Token verification configuration.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// JWKS discovery URI. Required (`IYASHI_JWKS_URI`).
    pub jwks_uri: Option<String>,
    /// Expected `iss` claim, matched exactly. Required (`IYASHI_ISSUER`).
    pub issuer: Option<String>,
    /// Expected `aud` claim, matched exactly. Required (`IYASHI_AUDIENCE`).
    pub audience: Option<String>,
    /// Name of the token claim carrying the caller's role.
    #[serde(default = "default_role_claim")]
    pub role_claim: String,
    /// Interval for the out-of-band key set refresh task.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwks_uri: None,
            issuer: None,
            audience: None,
            role_claim: default_role_claim(),
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

/// Upstream domain API configuration.
#[derive(Debug, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the domain API. Required (`IYASHI_UPSTREAM_URL`).
    pub base_url: Option<String>,
    /// Per-request upstream timeout.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: default_upstream_timeout(),
        }
    }
}

/// Audit collector configuration.
#[derive(Debug, Deserialize)]
pub struct AuditConfig {
    /// Whether critical actions are recorded at all.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Collector endpoint. Required when enabled (`IYASHI_AUDIT_URL`).
    pub collector_url: Option<String>,
    /// Path prefixes audited regardless of HTTP method.
    #[serde(default = "default_sensitive_prefixes")]
    pub sensitive_prefixes: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            collector_url: None,
            sensitive_prefixes: default_sensitive_prefixes(),
        }
    }
}

/// Access policy entries as written in TOML.
#[derive(Debug, Default, Deserialize)]
pub struct PolicyConfig {
    /// Ordered entries; the first matching prefix wins.
    #[serde(default)]
    pub entries: Vec<PolicyEntryConfig>,
}

/// One configured policy entry.
#[derive(Debug, Deserialize)]
pub struct PolicyEntryConfig {
    /// Path prefix this entry covers.
    pub path_prefix: String,
    /// Role names permitted under the prefix.
    pub allowed_roles: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_role_claim() -> String {
    "role".to_owned()
}

fn default_refresh_interval() -> u64 {
    3600
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_audit_enabled() -> bool {
    true
}

fn default_sensitive_prefixes() -> Vec<String> {
    vec!["/api/incidents".to_owned(), "/api/identity-checks".to_owned()]
}

impl BffConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist, then apply environment overrides.
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let mut config: Self = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents).map_err(|e| ServerError::Config(e.to_string()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment-style overrides via a lookup function.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("IYASHI_JWKS_URI") {
            self.auth.jwks_uri = Some(v);
        }
        if let Some(v) = lookup("IYASHI_ISSUER") {
            self.auth.issuer = Some(v);
        }
        if let Some(v) = lookup("IYASHI_AUDIENCE") {
            self.auth.audience = Some(v);
        }
        if let Some(v) = lookup("IYASHI_UPSTREAM_URL") {
            self.upstream.base_url = Some(v);
        }
        if let Some(v) = lookup("IYASHI_AUDIT_URL") {
            self.audit.collector_url = Some(v);
        }
    }

    /// Build the policy table: configured entries with strictly parsed
    /// roles, or the built-in platform defaults when none are configured.
    pub fn policy_table(&self) -> Result<PolicyTable, ServerError> {
        if self.policy.entries.is_empty() {
            return Ok(PolicyTable::platform_defaults());
        }

        let mut entries = Vec::with_capacity(self.policy.entries.len());
        for entry in &self.policy.entries {
            let mut roles = Vec::with_capacity(entry.allowed_roles.len());
            for name in &entry.allowed_roles {
                let role = Role::from_claim(name).ok_or_else(|| {
                    ServerError::Config(format!(
                        "unknown role '{name}' in policy entry '{}'",
                        entry.path_prefix
                    ))
                })?;
                roles.push(role);
            }
            entries.push(PolicyEntry::new(entry.path_prefix.clone(), roles));
        }
        Ok(PolicyTable::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: BffConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.role_claim, "role");
        assert_eq!(config.auth.refresh_interval_seconds, 3600);
        assert_eq!(config.upstream.timeout_seconds, 30);
        assert!(config.audit.enabled);
        assert_eq!(
            config.audit.sensitive_prefixes,
            vec!["/api/incidents", "/api/identity-checks"]
        );
    }

    #[test]
    fn full_config_parses() {
        let config: BffConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9090

            [auth]
            jwks_uri = "https://auth.iyashi.example/.well-known/jwks.json"
            issuer = "https://auth.iyashi.example/"
            audience = "iyashi-api"
            role_claim = "https://iyashi.example/role"

            [upstream]
            base_url = "http://domain-api.internal:8000"
            timeout_seconds = 10

            [audit]
            collector_url = "http://audit.internal:9200/entries"

            [[policy.entries]]
            path_prefix = "/api/admin"
            allowed_roles = ["platform_admin"]

            [[policy.entries]]
            path_prefix = "/api/bookings"
            allowed_roles = ["client", "therapist", "agency", "platform_admin"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.role_claim, "https://iyashi.example/role");
        let table = config.policy_table().unwrap();
        assert!(table.authorize(Role::Client, "/api/bookings/1").is_ok());
        assert!(table.authorize(Role::Client, "/api/admin/users").is_err());
    }

    #[test]
    fn unknown_role_in_policy_is_a_config_error() {
        let config: BffConfig = toml::from_str(
            r#"
            [[policy.entries]]
            path_prefix = "/api/admin"
            allowed_roles = ["superuser"]
            "#,
        )
        .unwrap();
        let err = config.policy_table().unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn empty_policy_falls_back_to_platform_defaults() {
        let config = BffConfig::default();
        let table = config.policy_table().unwrap();
        assert!(table.authorize(Role::PlatformAdmin, "/api/admin/users").is_ok());
        assert!(table.authorize(Role::Client, "/api/admin/users").is_err());
    }

    #[test]
    fn overrides_take_precedence_over_file_values() {
        let mut config: BffConfig = toml::from_str(
            r#"
            [auth]
            jwks_uri = "https://file.example/jwks.json"
            "#,
        )
        .unwrap();

        config.apply_overrides(|key| match key {
            "IYASHI_JWKS_URI" => Some("https://env.example/jwks.json".to_owned()),
            "IYASHI_UPSTREAM_URL" => Some("http://env-upstream:8000".to_owned()),
            _ => None,
        });

        assert_eq!(
            config.auth.jwks_uri.as_deref(),
            Some("https://env.example/jwks.json")
        );
        assert_eq!(
            config.upstream.base_url.as_deref(),
            Some("http://env-upstream:8000")
        );
        assert!(config.auth.issuer.is_none());
    }
}
