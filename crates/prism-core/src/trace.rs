//! Per-request debug trace.
//!
//! Components write notes through a [`Trace`] handle without knowing whether
//! anyone is collecting them. Every note also goes to `tracing` at debug
//! level.

use std::sync::{Arc, Mutex};

/// Destination for trace notes.
pub trait TraceSink: Send + Sync {
    fn record(&self, line: String);
}

/// Sink that drops every note.
#[derive(Debug, Default)]
pub struct Discard;

impl TraceSink for Discard {
    fn record(&self, _line: String) {}
}

/// Sink that keeps every note in order.
#[derive(Debug, Default)]
pub struct TraceLog {
    lines: Mutex<Vec<String>>,
}

impl TraceLog {
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TraceSink for TraceLog {
    fn record(&self, line: String) {
        match self.lines.lock() {
            Ok(mut guard) => guard.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

/// Cloneable handle to the request's trace sink.
#[derive(Clone)]
pub struct Trace {
    sink: Arc<dyn TraceSink>,
    log: Option<Arc<TraceLog>>,
}

impl Trace {
    /// A trace that records nothing.
    pub fn discard() -> Self {
        Self {
            sink: Arc::new(Discard),
            log: None,
        }
    }

    /// A trace that collects notes for the debug response.
    pub fn collecting() -> Self {
        let log = Arc::new(TraceLog::default());
        Self {
            sink: log.clone(),
            log: Some(log),
        }
    }

    /// Wrap a custom sink.
    pub fn with_sink(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink, log: None }
    }

    pub fn note(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!("{line}");
        self.sink.record(line);
    }

    /// Whether notes are being kept for the caller.
    pub fn is_collecting(&self) -> bool {
        self.log.is_some()
    }

    /// Collected notes; empty unless built with [`Trace::collecting`].
    pub fn lines(&self) -> Vec<String> {
        self.log.as_ref().map(|log| log.lines()).unwrap_or_default()
    }

    /// Collected notes joined one per line.
    pub fn render(&self) -> String {
        let mut out = self.lines().join("\n");
        out.push('\n');
        out
    }
}

impl std::fmt::Debug for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trace")
            .field("collecting", &self.is_collecting())
            .finish()
    }
}
