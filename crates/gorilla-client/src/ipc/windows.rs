//! Windows named pipe transport.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::ReadBuf;
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient};

/// Prefix for Windows named pipes.
const PIPE_PREFIX: &str = r"\\.\pipe\";

/// Retry delay when every pipe instance is busy.
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// `ERROR_PIPE_BUSY`
const ERROR_PIPE_BUSY: i32 = 231;

/// Normalize a pipe endpoint name.
///
/// If the endpoint starts with `\\.\pipe\`, use it as-is.
/// Otherwise, prepend the pipe prefix.
#[must_use]
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with(PIPE_PREFIX) {
        endpoint.to_string()
    } else {
        format!("{PIPE_PREFIX}{endpoint}")
    }
}

/// Client side of a Windows named pipe.
pub struct IpcStream {
    inner: NamedPipeClient,
}

impl IpcStream {
    /// Connect to the named pipe for `endpoint`.
    ///
    /// A busy pipe is retried until `timeout` elapses.
    ///
    /// # Errors
    /// Returns an error if the pipe does not exist or `timeout` elapses.
    pub async fn connect(endpoint: &str, timeout: Duration) -> io::Result<Self> {
        let endpoint = normalize_endpoint(endpoint);

        let connect_fut = async {
            loop {
                match ClientOptions::new().open(&endpoint) {
                    Ok(inner) => return Ok(Self { inner }),
                    Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        tokio::time::timeout(timeout, connect_fut)
            .await
            .map_err(|_| super::timed_out(&endpoint))?
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name_gets_pipe_prefix() {
        assert_eq!(
            normalize_endpoint("gorilla-service"),
            r"\\.\pipe\gorilla-service"
        );
    }

    #[test]
    fn test_prefixed_name_is_kept() {
        assert_eq!(
            normalize_endpoint(r"\\.\pipe\gorilla-service"),
            r"\\.\pipe\gorilla-service"
        );
    }
}
