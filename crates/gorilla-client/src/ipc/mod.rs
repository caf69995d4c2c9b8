//! Platform transport to the service.
//!
//! - Unix: Unix domain sockets via tokio
//! - Windows: Named pipes via tokio

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{socket_path, IpcStream};

#[cfg(windows)]
pub use windows::{normalize_endpoint, IpcStream};

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

/// Opens one duplex byte stream per call.
///
/// The seam between the service client and the platform transport; tests
/// substitute an in-memory implementation.
pub trait Connector: Clone + Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static;

    /// Connect within `timeout`. Expiry surfaces as `io::ErrorKind::TimedOut`.
    fn connect(&self, timeout: Duration) -> impl Future<Output = io::Result<Self::Stream>> + Send;

    /// Endpoint description for error messages.
    fn endpoint(&self) -> &str;
}

/// Connects to the service over the platform's local IPC mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeConnector {
    endpoint: String,
}

impl PipeConnector {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Connector for PipeConnector {
    type Stream = IpcStream;

    async fn connect(&self, timeout: Duration) -> io::Result<IpcStream> {
        IpcStream::connect(&self.endpoint, timeout).await
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub(crate) fn timed_out(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("timed out connecting to {what}; is the service running?"),
    )
}
