//! The two-phase `StreamOperationStatus` sub-protocol.

use futures::StreamExt;
use gorilla_proto::{
    encode_line, expect_envelope, validate_envelope_header, validate_status_event, EmptyPayload,
    Envelope, MessageType, Operation, OperationStatusEvent, ProtocolError, StatusEventPayload,
    StreamAck,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::client::{decode_inbound, new_request_id, StatusEvents};
use crate::config::ClientOptions;
use crate::error::ClientError;
use crate::ipc::Connector;
use crate::transport::{truncate_for_log, Connection};

enum Phase<S> {
    /// Not yet connected; opened on the first pull.
    Pending,
    Streaming(Connection<S>),
    /// A terminal event, an error, or cancellation was observed.
    Finished,
}

/// Pull-based status stream over a single connection.
///
/// Once finished it yields nothing further and never reconnects.
pub struct StatusStream<C: Connector> {
    connector: C,
    options: ClientOptions,
    operation_id: String,
    cancel: CancellationToken,
    phase: Phase<C::Stream>,
}

impl<C: Connector> StatusStream<C> {
    #[must_use]
    pub fn new(
        connector: C,
        options: ClientOptions,
        operation_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connector,
            options,
            operation_id: operation_id.into(),
            cancel,
            phase: Phase::Pending,
        }
    }

    /// Pull the next validated event.
    ///
    /// `Ok(None)` means the stream already finished.
    pub async fn next_event(&mut self) -> Result<Option<OperationStatusEvent>, ClientError> {
        let result = self.advance().await;
        match &result {
            Ok(Some(event)) if !event.state.is_terminal() => {}
            _ => self.phase = Phase::Finished,
        }
        result
    }

    /// Adapt into a boxed `Stream` that ends after the terminal event or
    /// the first error.
    pub fn into_stream(self) -> StatusEvents {
        futures::stream::unfold(self, |mut stream| async move {
            match stream.next_event().await {
                Ok(Some(event)) => Some((Ok(event), stream)),
                Ok(None) => None,
                Err(e) => Some((Err(e), stream)),
            }
        })
        .boxed()
    }

    async fn advance(&mut self) -> Result<Option<OperationStatusEvent>, ClientError> {
        if let Phase::Pending = self.phase {
            let conn = self.open().await?;
            self.phase = Phase::Streaming(conn);
        }

        let Phase::Streaming(conn) = &mut self.phase else {
            return Ok(None);
        };

        loop {
            let Some(raw) = conn.read_line_unbounded(&self.cancel).await? else {
                return Err(ProtocolError::StreamEnded.into());
            };
            if raw.trim().is_empty() {
                continue;
            }
            trace!(operation_id = %self.operation_id, line = truncate_for_log(&raw), "Received event");

            let envelope = decode_inbound::<StatusEventPayload>(&raw)?;
            validate_envelope_header(&envelope)?;
            expect_envelope(
                &envelope,
                MessageType::Event,
                Operation::StreamOperationStatus,
                None,
            )?;
            if envelope.operation_id != self.operation_id {
                return Err(ProtocolError::unexpected(
                    "operationId",
                    self.operation_id.as_str(),
                    envelope.operation_id.as_str(),
                )
                .into());
            }
            validate_status_event(&envelope.payload)?;

            let event = OperationStatusEvent::from_envelope(envelope)?;
            debug!(
                operation_id = %event.operation_id,
                state = ?event.state,
                progress = event.progress_percent,
                "Status event"
            );
            return Ok(Some(event));
        }
    }

    /// Send the stream request and check the acknowledgement.
    async fn open(&self) -> Result<Connection<C::Stream>, ClientError> {
        let request_id = new_request_id();
        let request = Envelope::request(
            Operation::StreamOperationStatus,
            request_id.as_str(),
            self.operation_id.as_str(),
            EmptyPayload {},
        );
        let line = encode_line(&request)?;

        let mut conn = Connection::open(&self.connector, &self.options, &self.cancel).await?;
        debug!(
            operation_id = %self.operation_id,
            request_id = %request_id,
            "Opening status stream"
        );
        conn.write_line(&line, &self.cancel).await?;

        let raw = match conn.read_line(&self.cancel).await? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Err(ProtocolError::NoResponse.into()),
        };
        trace!(operation_id = %self.operation_id, line = truncate_for_log(&raw), "Received ack");

        let ack = decode_inbound::<StreamAck>(&raw)?;
        validate_envelope_header(&ack)?;
        expect_envelope(
            &ack,
            MessageType::Response,
            Operation::StreamOperationStatus,
            Some(request_id.as_str()),
        )?;
        if ack.operation_id != self.operation_id {
            return Err(ProtocolError::unexpected(
                "operationId",
                self.operation_id.as_str(),
                ack.operation_id.as_str(),
            )
            .into());
        }
        if !ack.payload.stream_accepted {
            return Err(ProtocolError::StreamRejected.into());
        }

        Ok(conn)
    }
}
