use crate::role::Role;

/// Caller identity extracted from a verified bearer token.
///
/// Built once per request by the credential verifier and threaded through
/// the pipeline via request extensions. Immutable for the request's
/// lifetime and never persisted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Subject identifier from the token's `sub` claim.
    pub subject_id: String,
    /// The caller's verified role.
    pub role: Role,
}

impl CallerIdentity {
    /// Build an identity from verified claims.
    pub fn new(subject_id: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
        }
    }
}
