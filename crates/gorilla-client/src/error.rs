use std::io;
use std::path::PathBuf;
use std::time::Duration;

use gorilla_proto::{codes, ProtocolError, ServiceFault};
use thiserror::Error;

/// Error type for every client call.
///
/// Each variant is a distinct outcome so callers can match on the kind
/// instead of inspecting message text.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to connect to service at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{code}: {message}")]
    Service { code: String, message: String },

    #[error("Request timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    #[error("Operation canceled")]
    Canceled,

    #[error("IO error: {0}")]
    Transport(#[from] io::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl ClientError {
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Whether a fresh call has a reasonable chance of succeeding.
    ///
    /// Nothing in this crate retries; this only informs the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect { .. } | Self::Timeout { .. } | Self::Transport(_) => true,
            Self::Service { code, .. } => code == codes::SERVER_BUSY,
            Self::Protocol(_) | Self::Canceled | Self::Cache(_) => false,
        }
    }

    /// The service error code, for `Service` errors.
    #[must_use]
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<ServiceFault> for ClientError {
    fn from(fault: ServiceFault) -> Self {
        Self::Service {
            code: fault.code,
            message: fault.message,
        }
    }
}

/// Persisted cache failures.
///
/// `Read` and `Decode` never reach callers of `load`; they are logged and
/// the cache is treated as absent.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write cache at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode cache at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
