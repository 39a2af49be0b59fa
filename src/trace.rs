//! Debug tracing of requests and responses.
//!
//! When `debug` is enabled in [`Config`](crate::config::Config), the client
//! writes a human-readable trace of every call to a [`DiagnosticSink`]: a
//! banner with the method title, the URL, headers and body before the call,
//! then the HTTP status (`verbose > 0`) and the pretty-printed response body
//! (`verbose > 1`) after it.
//!
//! The sink is owned by the client. The default [`TracingSink`] forwards
//! each line to `tracing` at debug level.
//!
//! The API key never reaches the sink.

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::IrFlowError;

/// Destination for debug trace lines.
pub trait DiagnosticSink: Send + Sync {
    /// Receives one trace line.
    fn emit(&self, line: &str);
}

/// Sink that forwards trace lines to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, line: &str) {
        tracing::debug!(target: "irflow_client::trace", "{}", line);
    }
}

/// Per-client trace settings plus the sink they write to.
#[derive(Clone)]
pub struct DebugTrace {
    enabled: bool,
    verbose: u8,
    /// Redacted from every line before it is emitted.
    secret: String,
    sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for DebugTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugTrace")
            .field("enabled", &self.enabled)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl DebugTrace {
    /// Creates a trace writing to `sink`.
    pub fn new(
        enabled: bool,
        verbose: u8,
        secret: impl Into<String>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            enabled,
            verbose,
            secret: secret.into(),
            sink,
        }
    }

    /// Emits raw lines, e.g. a settings dump.
    pub fn lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.enabled {
            return;
        }
        for line in lines {
            self.emit(line.as_ref());
        }
    }

    /// Traces a request before it is sent.
    pub fn request(&self, title: &str, url: &str, headers: &[(&str, &str)], body: Option<&Value>) {
        if !self.enabled {
            return;
        }
        self.emit(&format!("========== {} ==========", title));
        self.emit(&format!("URL: \"{}\"", url));
        if let Some(body) = body {
            self.emit(&format!("Body: {}", body));
        }
        self.emit(&format!("Headers: \"{:?}\"", headers));
    }

    /// Traces the HTTP status of a response.
    pub fn status(&self, title: &str, status: StatusCode) {
        if !self.enabled || self.verbose == 0 {
            return;
        }
        self.emit(&format!("========== {} Response ==========", title));
        self.emit(&format!("HTTP Status: \"{}\"", status.as_u16()));
    }

    /// Traces a decoded response body.
    pub fn response_body(&self, body: &Value) {
        if !self.enabled || self.verbose < 2 {
            return;
        }
        self.emit("Response Json:");
        let pretty = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
        for line in pretty.lines() {
            self.emit(line);
        }
    }

    fn emit(&self, line: &str) {
        self.sink.emit(&IrFlowError::sanitize_message(line, &self.secret));
    }
}
