//! Unix domain socket transport.

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::ReadBuf;
use tokio::net::UnixStream;

/// Resolve an endpoint to a socket path.
///
/// A value containing a path separator is used verbatim; a bare name maps
/// to `<temp dir>/<name>.sock`.
#[must_use]
pub fn socket_path(endpoint: &str) -> PathBuf {
    if endpoint.contains('/') {
        PathBuf::from(endpoint)
    } else {
        std::env::temp_dir().join(format!("{endpoint}.sock"))
    }
}

/// Unix domain socket stream.
pub struct IpcStream {
    inner: UnixStream,
}

impl IpcStream {
    /// Connect to the socket for `endpoint`.
    ///
    /// # Errors
    /// Returns an error if the socket refuses the connection or `timeout`
    /// elapses first.
    pub async fn connect(endpoint: &str, timeout: Duration) -> io::Result<Self> {
        let path = socket_path(endpoint);

        let inner = tokio::time::timeout(timeout, UnixStream::connect(&path))
            .await
            .map_err(|_| super::timed_out(&path.display().to_string()))??;

        Ok(Self { inner })
    }
}

impl tokio::io::AsyncRead for IpcStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl tokio::io::AsyncWrite for IpcStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
