//! HTTP collector audit sink.
//!
//! POSTs each entry as flat JSON to a configured collector endpoint. The
//! collector's response body is never consumed; only the status matters.

mod sink;

pub use sink::WebhookAuditSink;
