use thiserror::Error;

/// Errors surfaced by the memory client and its transport.
///
/// Decrypt fallback is deliberately absent: an envelope that fails
/// authentication is treated as legacy plaintext, not as an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// Missing or malformed credential/key. Detected before any I/O.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Requested memory key does not exist on the service.
    #[error("no memory found for key: {key}")]
    NotFound { key: String },

    /// Network failure or non-2xx response other than 404.
    #[error("transport failure{}: {detail}", fmt_status(.status))]
    Transport { status: Option<u16>, detail: String },
}

impl MemoryError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn transport(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Transport {
            status,
            detail: detail.into(),
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}
