//! Newline-delimited JSON codec and error-envelope detection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::envelope::{Envelope, MessageType};
use crate::error::ProtocolError;
use crate::types::ErrorPayload;

/// Maximum accepted line length for sanity checking (16 MiB).
pub const MAX_LINE_SIZE: usize = 16 * 1024 * 1024;

const DEFAULT_ERROR_MESSAGE: &str = "Service returned an error response.";

/// An `Error` envelope surfaced by the peer in place of the expected reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFault {
    pub request_id: String,
    pub operation: String,
    pub code: String,
    pub message: String,
}

/// A decoded inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<P> {
    Message(Envelope<P>),
    Error(ServiceFault),
}

/// Encode a value as one newline-terminated JSON line.
pub fn encode_line<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes = serde_json::to_vec(value).map_err(ProtocolError::Encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a single line, tolerating a trailing `\r\n` or `\n`.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    serde_json::from_str(line).map_err(ProtocolError::Malformed)
}

/// Whether a raw document is an `Error` envelope (case-insensitive).
#[must_use]
pub fn is_error_document(doc: &Value) -> bool {
    let error = MessageType::Error.as_str();
    doc.get("messageType")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.eq_ignore_ascii_case(error))
}

/// Decode one line as either an `Error` envelope or an `Envelope<P>`.
///
/// Error envelopes are detected on the raw document before the
/// operation-specific payload shape is attempted. Their header is not
/// validated, since the peer may emit one before it has parsed the request.
pub fn decode_envelope<P: DeserializeOwned>(line: &str) -> Result<Inbound<P>, ProtocolError> {
    let mut doc: Value = decode_line(line)?;

    if is_error_document(&doc) {
        return decode_fault(&mut doc).map(Inbound::Error);
    }

    serde_json::from_value(doc)
        .map(Inbound::Message)
        .map_err(ProtocolError::Malformed)
}

fn decode_fault(doc: &mut Value) -> Result<ServiceFault, ProtocolError> {
    let text = |doc: &Value, key: &str| {
        doc.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let request_id = text(doc, "requestId");
    let operation = text(doc, "operation");

    let payload = match doc.get_mut("payload").map(Value::take) {
        None | Some(Value::Null) => return Err(ProtocolError::MissingErrorPayload),
        Some(payload) => payload,
    };
    let payload: ErrorPayload =
        serde_json::from_value(payload).map_err(ProtocolError::Malformed)?;

    let message = if payload.error_message.trim().is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        payload.error_message
    };

    Ok(ServiceFault {
        request_id,
        operation,
        code: payload.error_code,
        message,
    })
}
