//! Audit trail trait and core types for the Iyashi BFF gateway.
//!
//! The gateway records critical actions (mutations and reads of sensitive
//! sub-trees) to an [`AuditSink`]. Entries are write-once and best-effort:
//! the gateway has no read path and a lost entry never fails a request.

pub mod entry;
pub mod error;
pub mod sink;

pub use entry::AuditEntry;
pub use error::AuditError;
pub use sink::AuditSink;
