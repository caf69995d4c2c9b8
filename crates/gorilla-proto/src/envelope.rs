//! The uniform wire envelope and its message-kind taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::types::variant_by_name;
use crate::PROTOCOL_VERSION;

/// Kind of message carried by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageType {
    Request,
    Response,
    Event,
    Error,
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        variant_by_name(deserializer, &Self::ALL, Self::as_str)
    }
}

impl MessageType {
    pub const ALL: [MessageType; 4] = [Self::Request, Self::Response, Self::Event, Self::Error];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Response => "Response",
            Self::Event => "Event",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of protocol operations.
///
/// Envelopes carry the operation as a plain string so that an unknown value
/// survives decoding and is rejected by header validation instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListOptionalInstalls,
    InstallItem,
    RemoveItem,
    StreamOperationStatus,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Self::ListOptionalInstalls,
        Self::InstallItem,
        Self::RemoveItem,
        Self::StreamOperationStatus,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListOptionalInstalls => "ListOptionalInstalls",
            Self::InstallItem => "InstallItem",
            Self::RemoveItem => "RemoveItem",
            Self::StreamOperationStatus => "StreamOperationStatus",
        }
    }

    /// Look up an operation by its exact (case-sensitive) wire name.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol envelope wrapping an operation-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<P> {
    pub version: String,
    pub message_type: MessageType,
    pub operation: String,
    /// Correlation key. Required for everything except events.
    #[serde(default)]
    pub request_id: String,
    /// Empty unless the message targets a long-running operation.
    #[serde(default)]
    pub operation_id: String,
    #[serde(
        default,
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp_utc: Option<DateTime<Utc>>,
    pub payload: P,
}

impl<P> Envelope<P> {
    /// Build an envelope stamped with the current protocol version and time.
    #[must_use]
    pub fn new(
        message_type: MessageType,
        operation: Operation,
        request_id: impl Into<String>,
        operation_id: impl Into<String>,
        payload: P,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_type,
            operation: operation.as_str().to_string(),
            request_id: request_id.into(),
            operation_id: operation_id.into(),
            timestamp_utc: Some(Utc::now()),
            payload,
        }
    }

    #[must_use]
    pub fn request(
        operation: Operation,
        request_id: impl Into<String>,
        operation_id: impl Into<String>,
        payload: P,
    ) -> Self {
        Self::new(
            MessageType::Request,
            operation,
            request_id,
            operation_id,
            payload,
        )
    }

    /// Build the response correlated with `request`.
    #[must_use]
    pub fn response_to<Q>(
        request: &Envelope<Q>,
        operation_id: impl Into<String>,
        payload: P,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_type: MessageType::Response,
            operation: request.operation.clone(),
            request_id: request.request_id.clone(),
            operation_id: operation_id.into(),
            timestamp_utc: Some(Utc::now()),
            payload,
        }
    }

    /// Build a status event for a streaming operation.
    #[must_use]
    pub fn event(operation_id: impl Into<String>, payload: P) -> Self {
        Self::new(
            MessageType::Event,
            Operation::StreamOperationStatus,
            String::new(),
            operation_id,
            payload,
        )
    }

    /// The operation, if it is one of the supported set.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        Operation::from_wire(&self.operation)
    }
}
