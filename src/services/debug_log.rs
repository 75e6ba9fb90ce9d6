use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    layer::{Context, Layer, SubscriberExt},
    EnvFilter,
};

pub const DEFAULT_DEBUG_LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DebugEntry {
    pub at: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Last N log lines, kept in memory for the in-app debug panel.
/// Cloning shares the same buffer.
#[derive(Debug, Clone)]
pub struct DebugLog {
    entries: Arc<Mutex<VecDeque<DebugEntry>>>,
    capacity: usize,
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new(DEFAULT_DEBUG_LOG_CAPACITY)
    }
}

impl DebugLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    // A panic while holding the lock leaves the buffer usable; keep logging.
    fn lock(&self) -> MutexGuard<'_, VecDeque<DebugEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append an entry, dropping the oldest once full.
    pub fn push(&self, entry: DebugEntry) {
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<DebugEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// A `tracing` layer that copies every event into this buffer.
    pub fn layer(&self) -> DebugLogLayer {
        DebugLogLayer { log: self.clone() }
    }
}

/// The subscriber the binary installs: stderr output filtered by `filter`
/// (normally `RUST_LOG`), while the debug buffer records every event.
pub fn subscriber(log: &DebugLog, filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .with(log.layer())
}

pub struct DebugLogLayer {
    log: DebugLog,
}

impl<S: Subscriber> Layer<S> for DebugLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        self.log.push(DebugEntry {
            at: Utc::now(),
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message: visitor.finish(),
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {}", self.message, fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> DebugEntry {
        DebugEntry {
            at: Utc::now(),
            level: "INFO".into(),
            target: "test".into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let log = DebugLog::new(3);
        for i in 0..5 {
            log.push(entry(&format!("line {i}")));
        }
        let messages: Vec<String> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["line 2", "line 3", "line 4"]);
        assert_eq!(log.len(), 3);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let log = DebugLog::new(0);
        log.push(entry("a"));
        log.push(entry("b"));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.entries()[0].message, "b");
    }

    #[test]
    fn test_buffer_ignores_output_filter() {
        let log = DebugLog::new(10);
        let installed = subscriber(&log, EnvFilter::new("error"));

        tracing::subscriber::with_default(installed, || {
            tracing::debug!("activity: 3 candidate event(s)");
            tracing::info!("Loaded 2 repair record(s)");
        });

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, "DEBUG");
        assert_eq!(entries[0].message, "activity: 3 candidate event(s)");
        assert_eq!(entries[1].level, "INFO");
    }

    #[test]
    fn test_layer_captures_tracing_events() {
        let log = DebugLog::new(10);
        let subscriber = tracing_subscriber::registry().with(log.layer());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("export finished");
            tracing::warn!(rows = 12, "export slow");
        });

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, "INFO");
        assert_eq!(entries[0].message, "export finished");
        assert_eq!(entries[1].level, "WARN");
        assert_eq!(entries[1].message, "export slow rows=12");
    }
}
