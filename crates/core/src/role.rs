use std::fmt;

use serde::{Deserialize, Serialize};

/// Roles that a verified token may carry.
///
/// This is a closed enumeration: the credential verifier rejects any role
/// claim that does not parse to one of these variants. The gateway never
/// defaults an unknown role to something permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// End user booking treatments.
    Client,
    /// Service provider performing treatments (the platform's therapist role).
    Therapist,
    /// Host offering a facility where treatments take place.
    FacilityHost,
    /// Agency managing therapists and their bookings.
    Agency,
    /// Affiliate partner referring clients.
    Affiliate,
    /// Platform operations staff.
    PlatformAdmin,
}

impl Role {
    /// Parse a role claim value.
    ///
    /// Accepts the canonical snake_case names, case-insensitively. Returns
    /// `None` for anything else; callers must treat that as an
    /// authentication failure, not fall back to a default role.
    pub fn from_claim(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "client" => Some(Self::Client),
            "therapist" => Some(Self::Therapist),
            "facility_host" => Some(Self::FacilityHost),
            "agency" => Some(Self::Agency),
            "affiliate" => Some(Self::Affiliate),
            "platform_admin" => Some(Self::PlatformAdmin),
            _ => None,
        }
    }

    /// Whether this role sees disclosure records at full visibility
    /// regardless of lifecycle state.
    pub fn is_unrestricted(self) -> bool {
        matches!(self, Self::PlatformAdmin | Self::Agency)
    }

    /// Whether counterpart contact fields are stripped from responses for
    /// this role, independent of lifecycle state.
    pub fn strips_contacts(self) -> bool {
        matches!(self, Self::Client | Self::Affiliate)
    }

    /// The canonical claim string for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Therapist => "therapist",
            Self::FacilityHost => "facility_host",
            Self::Agency => "agency",
            Self::Affiliate => "affiliate",
            Self::PlatformAdmin => "platform_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
