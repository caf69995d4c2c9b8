//! Request/response calls against the service.

use std::future::Future;

use futures::stream::BoxStream;
use gorilla_proto::{
    decode_envelope, encode_line, expect_envelope, validate_envelope_header,
    validate_optional_install_item, EmptyPayload, Envelope, Inbound, ItemRequest,
    ListOptionalInstallsResponse, MessageType, Operation, OperationAccepted,
    OperationAcceptedResponse, OperationStatusEvent, OptionalInstallItem, ProtocolError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::ClientOptions;
use crate::error::ClientError;
use crate::ipc::{Connector, PipeConnector};
use crate::stream::StatusStream;
use crate::transport::{truncate_for_log, Connection};

/// A lazily produced, finite sequence of validated status events.
///
/// Ends after a terminal event; an error item also ends it.
pub type StatusEvents = BoxStream<'static, Result<OperationStatusEvent, ClientError>>;

/// The four operations exposed by the service.
pub trait ServiceClient: Send + Sync {
    fn list_optional_installs(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<OptionalInstallItem>, ClientError>> + Send;

    fn install_item(
        &self,
        item_name: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<OperationAccepted, ClientError>> + Send;

    fn remove_item(
        &self,
        item_name: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<OperationAccepted, ClientError>> + Send;

    /// Subscribe to a running operation. Each call opens a fresh connection
    /// when first polled; the returned stream cannot be restarted.
    fn stream_operation_status(
        &self,
        operation_id: &str,
        cancel: &CancellationToken,
    ) -> StatusEvents;
}

/// Service client that opens one connection per call through `C`.
#[derive(Debug, Clone)]
pub struct PipeServiceClient<C = PipeConnector> {
    options: ClientOptions,
    connector: C,
}

impl PipeServiceClient {
    /// Client over the platform pipe named by `options.endpoint`.
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        let connector = PipeConnector::new(options.endpoint.clone());
        Self { options, connector }
    }
}

impl<C: Connector> PipeServiceClient<C> {
    /// Client over a custom transport.
    #[must_use]
    pub fn with_connector(options: ClientOptions, connector: C) -> Self {
        Self { options, connector }
    }

    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Send one request and read its single, validated response.
    async fn send_request<Req, Resp>(
        &self,
        operation: Operation,
        payload: Req,
        cancel: &CancellationToken,
    ) -> Result<Envelope<Resp>, ClientError>
    where
        Req: Serialize + Send,
        Resp: DeserializeOwned,
    {
        let request_id = new_request_id();
        let request = Envelope::request(operation, request_id.as_str(), "", payload);
        let line = encode_line(&request)?;

        let mut conn = Connection::open(&self.connector, &self.options, cancel).await?;
        debug!(operation = %operation, request_id = %request_id, "Sending request");
        conn.write_line(&line, cancel).await?;

        let raw = match conn.read_line(cancel).await? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Err(ProtocolError::NoResponse.into()),
        };
        trace!(operation = %operation, line = truncate_for_log(&raw), "Received response");

        let envelope = decode_inbound::<Resp>(&raw)?;
        validate_envelope_header(&envelope)?;
        expect_envelope(
            &envelope,
            MessageType::Response,
            operation,
            Some(request_id.as_str()),
        )?;

        Ok(envelope)
    }

    async fn submit(
        &self,
        operation: Operation,
        item_name: &str,
        cancel: &CancellationToken,
    ) -> Result<OperationAccepted, ClientError> {
        let envelope: Envelope<OperationAcceptedResponse> = self
            .send_request(operation, ItemRequest::new(item_name), cancel)
            .await?;

        let accepted = OperationAccepted {
            operation_id: envelope.operation_id,
            accepted: envelope.payload.accepted,
            queued_at_utc: envelope.payload.queued_at_utc,
        };
        debug!(
            operation = %operation,
            item = item_name,
            operation_id = %accepted.operation_id,
            accepted = accepted.accepted,
            "Request answered"
        );
        Ok(accepted)
    }
}

impl<C: Connector> ServiceClient for PipeServiceClient<C> {
    async fn list_optional_installs(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<OptionalInstallItem>, ClientError> {
        let envelope: Envelope<ListOptionalInstallsResponse> = self
            .send_request(Operation::ListOptionalInstalls, EmptyPayload {}, cancel)
            .await?;

        let items = envelope.payload.items;
        for item in &items {
            validate_optional_install_item(item)?;
        }
        debug!(count = items.len(), "Listed optional installs");
        Ok(items)
    }

    async fn install_item(
        &self,
        item_name: &str,
        cancel: &CancellationToken,
    ) -> Result<OperationAccepted, ClientError> {
        self.submit(Operation::InstallItem, item_name, cancel).await
    }

    async fn remove_item(
        &self,
        item_name: &str,
        cancel: &CancellationToken,
    ) -> Result<OperationAccepted, ClientError> {
        self.submit(Operation::RemoveItem, item_name, cancel).await
    }

    fn stream_operation_status(
        &self,
        operation_id: &str,
        cancel: &CancellationToken,
    ) -> StatusEvents {
        StatusStream::new(
            self.connector.clone(),
            self.options.clone(),
            operation_id,
            cancel.clone(),
        )
        .into_stream()
    }
}

pub(crate) fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Decode a line, turning an `Error` envelope into a service error.
pub(crate) fn decode_inbound<P: DeserializeOwned>(raw: &str) -> Result<Envelope<P>, ClientError> {
    match decode_envelope::<P>(raw)? {
        Inbound::Message(envelope) => Ok(envelope),
        Inbound::Error(fault) => {
            debug!(
                code = %fault.code,
                request_id = %fault.request_id,
                "Service returned an error envelope"
            );
            Err(fault.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique_uuids() {
        let a = new_request_id();
        let b = new_request_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_decode_inbound_surfaces_service_error() {
        let raw = r#"{"version":"v1","messageType":"Error","operation":"InstallItem","requestId":"r","payload":{"errorCode":"server_busy","errorMessage":"server is at capacity"}}"#;
        let err = decode_inbound::<OperationAcceptedResponse>(raw).unwrap_err();
        assert_eq!(err.service_code(), Some("server_busy"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_pipe_client_uses_endpoint_from_options() {
        let client = PipeServiceClient::new(ClientOptions::default().with_endpoint("gorilla-test"));
        assert_eq!(client.connector.endpoint(), "gorilla-test");
        assert_eq!(client.options().endpoint, "gorilla-test");
    }
}
