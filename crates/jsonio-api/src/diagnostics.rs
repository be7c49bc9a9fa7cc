//! # Diagnostic Sinks
//!
//! Where the translator reports responses it refused to send. A sink
//! receives one preformatted message per blocked response.

use std::sync::Arc;

use parking_lot::Mutex;

/// Append-only destination for server-side diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Record one message.
    fn record(&self, message: String);
}

/// Emits each message as a `tracing` error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, message: String) {
        tracing::error!(target: "jsonio::diagnostics", "{message}");
    }
}

/// Keeps messages in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn record(&self, message: String) {
        self.messages.lock().push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_messages() {
        let sink = CollectingSink::new();
        let shared: Arc<dyn DiagnosticSink> = Arc::new(sink.clone());
        shared.record("first".into());
        shared.record("second".into());
        assert_eq!(sink.messages(), vec!["first", "second"]);
        assert_eq!(sink.len(), 2);
    }
}
