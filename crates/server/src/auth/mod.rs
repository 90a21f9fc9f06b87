pub mod error;
pub mod jwks;
pub mod middleware;

use std::str::FromStr;
use std::sync::Arc;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

use iyashi_core::{CallerIdentity, Role};

pub use self::error::AuthError;
pub use self::jwks::KeySetCache;

/// Claims the verifier reads from a token.
///
/// `exp`, `iss`, and `aud` are enforced by [`Validation`]; the role claim
/// is looked up by its configured name in the remaining claims.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

/// Verifies bearer tokens against the cached key set and produces the
/// per-request [`CallerIdentity`].
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    issuer: String,
    audience: String,
    role_claim: String,
}

impl TokenVerifier {
    /// Create a verifier with exact-match issuer and audience values.
    pub fn new(
        keys: Arc<KeySetCache>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        role_claim: impl Into<String>,
    ) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            role_claim: role_claim.into(),
        }
    }

    /// Verify a token and extract the caller identity.
    ///
    /// Any failure (bad signature, expiry, wrong issuer or audience,
    /// missing or unrecognized role) is an [`AuthError`], never a
    /// partially trusted identity. An unknown key ID triggers one key set
    /// refresh before giving up, so freshly rotated keys are picked up
    /// without waiting for the periodic task.
    pub async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let keys = self.keys.current().await?;
        let jwk = match find_key(&keys, header.kid.as_deref()) {
            Some(jwk) => jwk.clone(),
            None => {
                let keys = self.keys.refresh().await?;
                find_key(&keys, header.kid.as_deref())
                    .cloned()
                    .ok_or(AuthError::UnknownKey)?
            }
        };

        let decoding_key =
            DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::KeySet(e.to_string()))?;

        // Prefer the key's declared algorithm; a token header claiming a
        // different key family fails inside `decode`.
        let algorithm = jwk
            .common
            .key_algorithm
            .and_then(|ka| Algorithm::from_str(ka.to_string().as_str()).ok())
            .unwrap_or(header.alg);

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        let data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let role_value = data
            .claims
            .rest
            .get(self.role_claim.as_str())
            .and_then(serde_json::Value::as_str)
            .ok_or(AuthError::MissingRole)?;
        let role =
            Role::from_claim(role_value).ok_or_else(|| AuthError::UnknownRole(role_value.to_owned()))?;

        Ok(CallerIdentity::new(data.claims.sub, role))
    }
}

/// Select a key: by `kid` when the header carries one, otherwise the sole
/// key of a single-key set.
fn find_key<'a>(set: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => set.find(kid),
        None if set.keys.len() == 1 => set.keys.first(),
        None => None,
    }
}
