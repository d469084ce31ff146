//! User-facing alerts emitted while a query runs.
//!
//! Alerts are separate from logs: a sink decides how to show them. The
//! executor only ever talks to an [`OutputSink`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Error => write!(f, "error"),
        }
    }
}

/// An alert shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub message: String,
}

impl Alert {
    pub fn new(severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Error, message)
    }
}

/// Destination for everything a query produces for the user
pub trait OutputSink: Send + Sync {
    fn on_alert(&self, alert: Alert);

    /// Text produced by an agent, labelled with its display name
    fn on_agent_message(&self, _agent: &str, _text: &str) {}
}

/// Mirrors alerts and agent messages into the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn on_alert(&self, alert: Alert) {
        match alert.severity {
            AlertSeverity::Info => info!("{}", alert.message),
            AlertSeverity::Warning => warn!("{}", alert.message),
            AlertSeverity::Error => error!("{}", alert.message),
        }
    }

    fn on_agent_message(&self, agent: &str, text: &str) {
        info!("[{}] {}", agent, text);
    }
}

/// Records everything it receives
#[derive(Debug, Default)]
pub struct AlertLog {
    alerts: Mutex<Vec<Alert>>,
    messages: Mutex<Vec<(String, String)>>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn count(&self, severity: AlertSeverity) -> usize {
        self.alerts()
            .iter()
            .filter(|alert| alert.severity == severity)
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.clear();
        }
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

impl OutputSink for AlertLog {
    fn on_alert(&self, alert: Alert) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(alert);
        }
    }

    fn on_agent_message(&self, agent: &str, text: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((agent.to_string(), text.to_string()));
        }
    }
}
