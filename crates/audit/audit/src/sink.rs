use async_trait::async_trait;

use crate::entry::AuditEntry;
use crate::error::AuditError;

/// Trait for audit entry destinations.
///
/// Implementations must be `Send + Sync`; entries are recorded from
/// detached tasks after the response has been returned, so a sink must
/// never assume it runs on the request path.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one entry. Write-once; there is no read path.
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}
