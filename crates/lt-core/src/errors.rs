//! Structured error types shared across light table crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`LtError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (detector names, points, paths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for light table generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum LtError {
    /// Invalid run configuration: unknown detector, kind or pitch.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// The baseline result needed to fix the table schema is unavailable.
    #[error("baseline error: {0}")]
    Baseline(ErrorInfo),
    /// Simulation result artifacts could not be read.
    #[error("results error: {0}")]
    Results(ErrorInfo),
    /// Light table store failures.
    #[error("store error: {0}")]
    Store(ErrorInfo),
    /// Filesystem and process failures.
    #[error("io error: {0}")]
    Io(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl LtError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            LtError::Config(info)
            | LtError::Baseline(info)
            | LtError::Results(info)
            | LtError::Store(info)
            | LtError::Io(info) => info,
        }
    }

    /// Unknown detector name.
    pub fn unknown_detector(name: &str) -> Self {
        LtError::Config(
            ErrorInfo::new("unknown-detector", "detector is not in the catalog")
                .with_context("detector", name),
        )
    }

    /// Pitch that cannot be used for the requested sampling.
    pub fn invalid_pitch(message: impl Into<String>) -> Self {
        LtError::Config(ErrorInfo::new("invalid-pitch", message))
    }

    /// Unrecognised table or signal kind.
    pub fn invalid_kind(field: &str, value: &str) -> Self {
        LtError::Config(
            ErrorInfo::new("invalid-kind", format!("invalid {field}"))
                .with_context(field, value),
        )
    }

    /// Generic I/O failure on `path`.
    pub fn io(code: &str, path: &std::path::Path, err: impl ToString) -> Self {
        LtError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
