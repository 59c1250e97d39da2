//! Flash message → toast notification mapping.
//!
//! Mirrors the Stimulus flash controller shipped in the application
//! template: the flash key picks one of four toast severities, anything
//! unrecognised is shown as a success toast.

use std::fmt;

use serde::Serialize;

/// Toast display severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Map a flash key to a severity. Unknown keys fall back to `Success`.
    pub fn for_key(key: &str) -> Self {
        match key {
            "notice" | "success" => Self::Success,
            "info" => Self::Info,
            "warning" => Self::Warning,
            "alert" | "error" => Self::Error,
            _ => Self::Success,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(key, message)` pair taken from the Rails flash hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub key: String,
    pub message: String,
}

impl FlashMessage {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    /// The toast to display, or `None` when the key or message is empty.
    pub fn notify(&self) -> Option<Notification> {
        if self.key.is_empty() || self.message.is_empty() {
            return None;
        }
        Some(Notification {
            severity: Severity::for_key(&self.key),
            message: self.message.clone(),
        })
    }
}

/// A single toast call: show `message` at `severity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    /// The JavaScript call the controller makes, e.g. `toastr.error("Bad login")`.
    pub fn to_js(&self) -> String {
        let quoted = serde_json::to_string(&self.message).unwrap_or_else(|_| "\"\"".into());
        format!("toastr.{}({})", self.severity, quoted)
    }
}

/// Toast display options set by the controller on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastOptions {
    pub debug: bool,
    pub position_class: String,
    pub fade_in: u32,
    pub fade_out: u32,
    pub time_out: u32,
    pub extended_time_out: u32,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            debug: false,
            position_class: "toastr-top-right".into(),
            fade_in: 300,
            fade_out: 1000,
            time_out: 5000,
            extended_time_out: 1000,
        }
    }
}
