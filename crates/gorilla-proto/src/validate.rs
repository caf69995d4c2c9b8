//! Structural checks on inbound envelopes and payloads.
//!
//! These run before any payload field is trusted by calling code.

use crate::envelope::{Envelope, MessageType, Operation};
use crate::error::ProtocolError;
use crate::timestamp;
use crate::types::{OperationState, OptionalInstallItem, StatusEventPayload};
use crate::PROTOCOL_VERSION;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_blank_opt(value: Option<&str>) -> bool {
    value.map_or(true, is_blank)
}

pub fn validate_envelope_header<P>(envelope: &Envelope<P>) -> Result<(), ProtocolError> {
    if envelope.version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(envelope.version.clone()));
    }

    if envelope.operation().is_none() {
        return Err(ProtocolError::UnsupportedOperation(
            envelope.operation.clone(),
        ));
    }

    if timestamp::is_unset(envelope.timestamp_utc.as_ref()) {
        return Err(ProtocolError::MissingTimestamp);
    }

    if envelope.message_type != MessageType::Event && is_blank(&envelope.request_id) {
        return Err(ProtocolError::MissingRequestId);
    }

    Ok(())
}

pub fn validate_optional_install_item(item: &OptionalInstallItem) -> Result<(), ProtocolError> {
    if is_blank(&item.item_name) {
        return Err(ProtocolError::MissingItemName);
    }

    if timestamp::is_unset(item.status_updated_at_utc.as_ref()) {
        return Err(ProtocolError::MissingStatusTimestamp);
    }

    Ok(())
}

pub fn validate_status_event(payload: &StatusEventPayload) -> Result<(), ProtocolError> {
    if !(0..=100).contains(&payload.progress_percent) {
        return Err(ProtocolError::ProgressOutOfRange(payload.progress_percent));
    }

    if payload.state == OperationState::Failed && is_blank_opt(payload.error_message.as_deref()) {
        return Err(ProtocolError::MissingErrorMessage);
    }

    if payload.state == OperationState::Canceled && is_blank_opt(payload.canceled_by.as_deref()) {
        return Err(ProtocolError::MissingCanceledBy);
    }

    Ok(())
}

/// Check that an envelope is the reply the caller is waiting for.
///
/// `expected_request_id` is `None` for events, which are not correlated by
/// request id.
pub fn expect_envelope<P>(
    envelope: &Envelope<P>,
    expected_type: MessageType,
    expected_operation: Operation,
    expected_request_id: Option<&str>,
) -> Result<(), ProtocolError> {
    if envelope.message_type != expected_type {
        return Err(ProtocolError::unexpected(
            "messageType",
            expected_type.as_str(),
            envelope.message_type.as_str(),
        ));
    }

    if envelope.operation != expected_operation.as_str() {
        return Err(ProtocolError::unexpected(
            "operation",
            expected_operation.as_str(),
            envelope.operation.as_str(),
        ));
    }

    if let Some(request_id) = expected_request_id {
        if envelope.request_id != request_id {
            return Err(ProtocolError::unexpected(
                "requestId",
                request_id,
                envelope.request_id.as_str(),
            ));
        }
    }

    Ok(())
}
