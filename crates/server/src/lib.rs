//! Backend-for-frontend edge server for the Iyashi booking platform.
//!
//! A single edge process between the client applications and the upstream
//! domain API: verifies bearer tokens against a rotating JWKS, enforces
//! the path-prefix role policy, forwards to the upstream, applies the
//! progressive disclosure filter to responses, and records critical
//! actions to the audit collector off the response path.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
