//! Shared vocabulary for the Iyashi BFF gateway.
//!
//! This crate holds the types that every other gateway crate speaks:
//! the closed [`Role`] enumeration extracted from verified tokens and
//! the per-request [`CallerIdentity`]. It intentionally carries no I/O
//! and no platform schema: the gateway holds no user records.

pub mod identity;
pub mod role;

pub use identity::CallerIdentity;
pub use role::Role;
