/// Errors that can occur while recording an audit entry.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The collector rejected the entry or could not be reached.
    #[error("collector error: {0}")]
    Collector(String),

    /// The entry could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}
