//! User-facing notifications produced at the command boundary.

use std::fmt;

use crate::error::InspectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Turns a failed operation into a notification, falling back to
    /// `fallback` when the error carries no readable message.
    pub fn from_error(err: &InspectError, fallback: &str) -> Self {
        let message = match err {
            InspectError::Transport(_) => format!("{}: {}", fallback, err),
            _ => {
                let text = err.to_string();
                if text.trim().is_empty() {
                    fallback.to_string()
                } else {
                    text
                }
            }
        };
        Self::error(message)
    }

    /// Success or error notification for an operation result.
    pub fn from_result<T>(result: &Result<T, InspectError>, ok: &str, fallback: &str) -> Self {
        match result {
            Ok(_) => Self::success(ok),
            Err(e) => Self::from_error(e, fallback),
        }
    }

    /// Prints to the terminal; errors go to stderr.
    pub fn print(&self) {
        match self.severity {
            Severity::Error => eprintln!("{}", self),
            _ => println!("{}", self),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.severity {
            Severity::Success => "✔",
            Severity::Warning => "⚠",
            Severity::Error => "✖",
        };
        write!(f, "{} {}", mark, self.message)
    }
}
