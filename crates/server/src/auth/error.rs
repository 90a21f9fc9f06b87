use thiserror::Error;

/// Token verification failures.
///
/// Every variant maps to HTTP 401: a token the gateway cannot fully
/// validate is never partially trusted.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header was present.
    #[error("missing bearer token")]
    MissingToken,

    /// The verification key set could not be fetched or parsed.
    #[error("key set unavailable: {0}")]
    KeySet(String),

    /// No key in the set matches the token's key ID.
    #[error("no verification key matches the token")]
    UnknownKey,

    /// Signature, expiry, issuer, or audience validation failed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token carries no role claim.
    #[error("missing role claim")]
    MissingRole,

    /// The role claim is not one of the platform's roles.
    #[error("unrecognized role claim: {0}")]
    UnknownRole(String),
}
