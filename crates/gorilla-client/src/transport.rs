//! One line-oriented connection per call.

use std::future::Future;
use std::time::Duration;

use gorilla_proto::{ProtocolError, MAX_LINE_SIZE};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientOptions;
use crate::error::ClientError;
use crate::ipc::Connector;

/// Maximum characters of a raw line written to the trace log.
pub(crate) const LOG_LINE_LIMIT: usize = 400;

/// Truncate a raw wire line for logging.
pub(crate) fn truncate_for_log(line: &str) -> &str {
    match line.char_indices().nth(LOG_LINE_LIMIT) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// A connected duplex stream with newline framing.
///
/// Dropping the connection releases the underlying stream on every exit
/// path.
pub(crate) struct Connection<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    deadline: Instant,
    request_timeout: Duration,
}

impl<S> Connection<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
{
    /// Connect through `connector`. The request deadline starts once the
    /// connection is established.
    pub(crate) async fn open<C>(
        connector: &C,
        options: &ClientOptions,
        cancel: &CancellationToken,
    ) -> Result<Self, ClientError>
    where
        C: Connector<Stream = S>,
    {
        let stream = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Canceled),
            result = connector.connect(options.connect_timeout) => {
                result.map_err(|source| {
                    debug!(endpoint = connector.endpoint(), error = %source, "Connect failed");
                    ClientError::Connect {
                        endpoint: connector.endpoint().to_string(),
                        source,
                    }
                })?
            }
        };

        let (read_half, writer) = tokio::io::split(stream);
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
            deadline: Instant::now() + options.request_timeout,
            request_timeout: options.request_timeout,
        })
    }

    /// Write one encoded line. Nothing is written once `cancel` has fired.
    pub(crate) async fn write_line(
        &mut self,
        line: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Canceled);
        }

        let writer = &mut self.writer;
        let io = async move {
            writer.write_all(line).await?;
            writer.flush().await
        };
        guard(io, Some((self.deadline, self.request_timeout)), cancel).await
    }

    /// Read one line within the request deadline.
    pub(crate) async fn read_line(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ClientError> {
        let deadline = Some((self.deadline, self.request_timeout));
        let raw = guard(read_raw(&mut self.reader), deadline, cancel).await?;
        raw.map(finish_line).transpose()
    }

    /// Read one line with no deadline, governed only by `cancel`.
    pub(crate) async fn read_line_unbounded(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ClientError> {
        let raw = guard(read_raw(&mut self.reader), None, cancel).await?;
        raw.map(finish_line).transpose()
    }
}

/// Race an I/O future against cancellation and an optional deadline.
async fn guard<T, F>(
    io: F,
    deadline: Option<(Instant, Duration)>,
    cancel: &CancellationToken,
) -> Result<T, ClientError>
where
    F: Future<Output = std::io::Result<T>>,
{
    let bounded = async {
        match deadline {
            Some((at, after)) => match tokio::time::timeout_at(at, io).await {
                Ok(result) => result.map_err(ClientError::Transport),
                Err(_) => Err(ClientError::Timeout { after }),
            },
            None => io.await.map_err(ClientError::Transport),
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ClientError::Canceled),
        result = bounded => result,
    }
}

/// Read up to and including the next `\n`, capped at the line limit.
///
/// Returns `None` at end of stream.
async fn read_raw<R>(reader: &mut BufReader<R>) -> std::io::Result<Option<Vec<u8>>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    // Room for a full-size line plus its CRLF.
    let limit = (MAX_LINE_SIZE + 2) as u64;
    let n = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut buf)
        .await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(buf))
}

fn finish_line(mut raw: Vec<u8>) -> Result<String, ClientError> {
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }

    if raw.len() > MAX_LINE_SIZE {
        return Err(ProtocolError::LineTooLong {
            limit: MAX_LINE_SIZE,
        }
        .into());
    }

    String::from_utf8(raw).map_err(|_| ProtocolError::InvalidUtf8.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tokio::io::DuplexStream;

    #[derive(Clone)]
    struct Pair(std::sync::Arc<std::sync::Mutex<Option<DuplexStream>>>);

    impl Connector for Pair {
        type Stream = DuplexStream;

        async fn connect(&self, _timeout: Duration) -> io::Result<DuplexStream> {
            self.0
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "used"))
        }

        fn endpoint(&self) -> &str {
            "pair"
        }
    }

    fn pair() -> (Pair, DuplexStream) {
        let (client, server) = tokio::io::duplex(1024);
        (
            Pair(std::sync::Arc::new(std::sync::Mutex::new(Some(client)))),
            server,
        )
    }

    fn options(request_timeout: Duration) -> ClientOptions {
        ClientOptions::default().with_request_timeout(request_timeout)
    }

    #[test]
    fn test_truncate_for_log() {
        let long = "x".repeat(1000);
        assert_eq!(truncate_for_log(&long).len(), LOG_LINE_LIMIT);
        assert_eq!(truncate_for_log("short"), "short");
    }

    #[tokio::test]
    async fn test_reads_lines_and_strips_terminators() {
        let (connector, mut server) = pair();
        let cancel = CancellationToken::new();
        let mut conn = Connection::open(&connector, &options(Duration::from_secs(5)), &cancel)
            .await
            .unwrap();

        server.write_all(b"first\r\nsecond\n").await.unwrap();
        drop(server);

        let first = conn.read_line(&cancel).await.unwrap();
        assert_eq!(first.as_deref(), Some("first"));
        let second = conn.read_line(&cancel).await.unwrap();
        assert_eq!(second.as_deref(), Some("second"));
        assert_eq!(conn.read_line(&cancel).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_crlf_line_at_size_limit_is_accepted() {
        let (connector, mut server) = pair();
        let cancel = CancellationToken::new();
        let mut conn = Connection::open(&connector, &options(Duration::from_secs(30)), &cancel)
            .await
            .unwrap();

        tokio::spawn(async move {
            let mut line = vec![b'a'; MAX_LINE_SIZE];
            line.extend_from_slice(b"\r\n");
            server.write_all(&line).await.unwrap();
        });

        let line = conn.read_line(&cancel).await.unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_SIZE);
        assert!(line.bytes().all(|b| b == b'a'));
    }

    #[tokio::test]
    async fn test_line_over_size_limit_is_rejected() {
        let (connector, mut server) = pair();
        let cancel = CancellationToken::new();
        let mut conn = Connection::open(&connector, &options(Duration::from_secs(30)), &cancel)
            .await
            .unwrap();

        tokio::spawn(async move {
            let mut line = vec![b'a'; MAX_LINE_SIZE + 1];
            line.extend_from_slice(b"\r\n");
            let _ = server.write_all(&line).await;
        });

        let err = conn.read_line(&cancel).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::LineTooLong { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_times_out_after_request_timeout() {
        let (connector, _server) = pair();
        let cancel = CancellationToken::new();
        let mut conn = Connection::open(&connector, &options(Duration::from_millis(50)), &cancel)
            .await
            .unwrap();

        let err = conn.read_line(&cancel).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unbounded_read_ignores_request_timeout() {
        let (connector, mut server) = pair();
        let cancel = CancellationToken::new();
        let mut conn = Connection::open(&connector, &options(Duration::from_millis(20)), &cancel)
            .await
            .unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            server.write_all(b"late\n").await.unwrap();
        });

        let line = conn.read_line_unbounded(&cancel).await.unwrap();
        assert_eq!(line.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_read_and_blocks_writes() {
        let (connector, _server) = pair();
        let cancel = CancellationToken::new();
        let mut conn = Connection::open(&connector, &options(Duration::from_secs(5)), &cancel)
            .await
            .unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = conn.read_line_unbounded(&cancel).await.unwrap_err();
        assert!(err.is_canceled());

        let err = conn.write_line(b"{}\n", &cancel).await.unwrap_err();
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_protocol_error() {
        let (connector, mut server) = pair();
        let cancel = CancellationToken::new();
        let mut conn = Connection::open(&connector, &options(Duration::from_secs(5)), &cancel)
            .await
            .unwrap();

        server.write_all(&[0xff, 0xfe, b'\n']).await.unwrap();
        let err = conn.read_line(&cancel).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::InvalidUtf8)
        ));
    }

    #[tokio::test]
    async fn test_connect_failure_names_endpoint() {
        let (connector, _server) = pair();
        let cancel = CancellationToken::new();
        let opts = options(Duration::from_secs(5));
        let _first = Connection::open(&connector, &opts, &cancel).await.unwrap();

        match Connection::open(&connector, &opts, &cancel).await {
            Err(ClientError::Connect { endpoint, .. }) => assert_eq!(endpoint, "pair"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("second connect should fail"),
        }
    }
}
