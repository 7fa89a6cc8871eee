//! Optional logging and failure-report collaborators.
//!
//! The client always emits `tracing` events; these traits let an integration
//! forward the same information to its own sinks.

use tracing::{debug, warn};

/// Receives the client's debug trail.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
}

/// Failure details handed to a [`ReportSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Request URL; empty when the failure happened before a URL existed.
    pub url: String,
    /// `GET`/`POST` for API calls, `S3`/`PUT` for uploads, empty otherwise.
    pub http_method: String,
    pub api_key: String,
    pub language: Option<String>,
    pub store_code: Option<String>,
    pub message: String,
}

/// Fire-and-forget sink for failure reports. The client ignores whatever
/// happens inside the sender.
pub trait ReportSender: Send + Sync {
    fn send_report(&self, report: &ErrorReport);
}

/// [`Logger`] that forwards to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        debug!(target: "tooso_sdk::logger", "{message}");
    }
}

/// [`ReportSender`] that emits one `warn!` event per report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReportSender;

impl ReportSender for TracingReportSender {
    fn send_report(&self, report: &ErrorReport) {
        warn!(
            target: "tooso_sdk::report",
            url = %report.url,
            method = %report.http_method,
            language = report.language.as_deref().unwrap_or(""),
            store = report.store_code.as_deref().unwrap_or(""),
            "{}",
            report.message
        );
    }
}
