//! Span helpers for patchboard operations.

use tracing::{info_span, Span};

/// Span for a directory scan of an inbox.
pub fn scan_span(inbox: &str) -> Span {
    info_span!("inbox_scan", inbox = %inbox)
}

/// Span for emitting one message on a channel.
pub fn emit_span(channel: &str) -> Span {
    info_span!("emit", channel = %channel)
}

/// Span for a file operation.
pub fn file_span(operation: &str, path: &str) -> Span {
    info_span!("file", op = %operation, path = %path)
}

/// Logs the elapsed time of an operation at debug level.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Complete the timer and record duration.
    pub fn finish(self) {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    fn with_subscriber<F>(f: F)
    where
        F: FnOnce(),
    {
        let subscriber = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(EnvFilter::new("trace"))
            .finish();

        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn test_nested_spans() {
        with_subscriber(|| {
            let scan = scan_span("/srv/inbox");
            let _g1 = scan.enter();
            let file = file_span("consume", "/srv/inbox/a.json");
            let _g2 = file.enter();
            tracing::info!("nested operation");
        });
    }

    #[test]
    fn test_timer_finish() {
        with_subscriber(|| {
            let timer = Timer::start("scan");
            let _span = emit_span("output").entered();
            timer.finish();
        });
    }
}
