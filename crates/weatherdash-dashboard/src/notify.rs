//! User-facing notifications.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// Sink for short messages confirming user actions.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity, duration: Duration);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        let duration_ms = duration.as_millis() as u64;
        match severity {
            Severity::Success => tracing::info!(duration_ms, "{}", message),
            Severity::Warning => tracing::warn!(duration_ms, "{}", message),
            Severity::Error => tracing::error!(duration_ms, "{}", message),
        }
    }
}
