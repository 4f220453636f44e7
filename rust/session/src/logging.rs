use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "info,felt_session=debug";

/// One captured event with its fields rendered as text.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A layer that records every event it sees. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut entry = LogEntry {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut entry);
        self.lock().push(entry);
    }
}

impl Visit for LogEntry {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{value:?}"));
    }
}

impl LogEntry {
    fn record_text(&mut self, field: &Field, text: String) {
        match field.name() {
            "message" => self.message = text,
            name => self.fields.push((name.to_string(), text)),
        }
    }
}

/// Installs the process-wide subscriber. `RUST_LOG` overrides the default
/// filter; `json` switches to one JSON object per line.
pub fn init_logging(json: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        tracing::subscriber::set_global_default(builder.json().with_current_span(false).finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Captures events on the current thread until the guard drops.
pub fn capture_logs() -> (LogCapture, DefaultGuard) {
    let capture = LogCapture::new();
    let guard = tracing::subscriber::set_default(Registry::default().with(capture.clone()));
    (capture, guard)
}

/// Process-wide capture shared by every test in the binary. The buffer is
/// emptied on each call.
pub fn init_test_logging() -> LogCapture {
    static CAPTURE: OnceLock<LogCapture> = OnceLock::new();
    let capture = CAPTURE.get_or_init(|| {
        let capture = LogCapture::new();
        if tracing::subscriber::set_global_default(Registry::default().with(capture.clone()))
            .is_err()
        {
            tracing::warn!("a global tracing subscriber is already installed");
        }
        capture
    });
    capture.lock().clear();
    capture.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, error, info, warn};

    #[test]
    fn captures_levels_in_order() {
        let (logs, guard) = capture_logs();
        debug!("debug message");
        info!("info message");
        warn!("warn message");
        error!("error message");
        drop(guard);
        info!("after the guard");

        let entries = logs.entries();
        let levels: Vec<Level> = entries.iter().map(|e| e.level).collect();
        assert_eq!(levels, [Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR]);
        assert_eq!(entries[2].message, "warn message");
    }

    #[test]
    fn captures_structured_fields() {
        let (logs, _guard) = capture_logs();
        info!(seat = 3, reason = "timeout", "falling back");

        let entries = logs.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "falling back");
        assert_eq!(entries[0].field("seat"), Some("3"));
        assert_eq!(entries[0].field("reason"), Some("timeout"));
        assert_eq!(entries[0].field("missing"), None);
    }

    #[test]
    #[serial_test::serial]
    fn shared_capture_starts_empty() {
        let first = init_test_logging();
        warn!("left over");
        assert!(first
            .entries()
            .iter()
            .any(|e| e.message.contains("left over")));

        let second = init_test_logging();
        info!(target: "felt_session", "fresh");
        let messages: Vec<String> = second.entries().into_iter().map(|e| e.message).collect();
        assert!(!messages.iter().any(|m| m == "left over"));
        assert_eq!(messages.iter().filter(|m| *m == "fresh").count(), 1);
    }
}
