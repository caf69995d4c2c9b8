#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! Protocol types for the Gorilla service pipe.
//!
//! This crate defines the envelope, payload and value types exchanged between
//! the desktop client and the background service, plus the pure validation
//! rules every inbound envelope must pass before its payload is trusted.
//!
//! ## Wire format
//! One JSON document per line:
//! - UTF-8 without byte-order mark
//! - camelCase field names, absent optionals omitted rather than `null`
//! - each document terminated by a single `\n`

pub mod codec;
pub mod envelope;
pub mod error;
pub mod timestamp;
pub mod types;
pub mod validate;

pub use codec::{decode_envelope, decode_line, encode_line, Inbound, ServiceFault, MAX_LINE_SIZE};
pub use envelope::{Envelope, MessageType, Operation};
pub use error::ProtocolError;
pub use types::{
    EmptyPayload, ErrorPayload, ItemRequest, ListOptionalInstallsResponse, OperationAccepted,
    OperationAcceptedResponse, OperationState, OperationStatusEvent, OptionalInstallItem,
    OptionalInstallStatus, StatusEventPayload, StreamAck,
};
pub use validate::{
    expect_envelope, validate_envelope_header, validate_optional_install_item,
    validate_status_event,
};

/// The single protocol version this client speaks.
pub const PROTOCOL_VERSION: &str = "v1";

/// Error codes the service is known to emit in `Error` envelopes.
pub mod codes {
    pub const SERVER_BUSY: &str = "server_busy";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const UNSUPPORTED_VERSION: &str = "unsupported_version";
    pub const UNSUPPORTED_ACTION: &str = "unsupported_action";
    pub const COMMAND_FAILED: &str = "command_failed";

    // Carried on Failed status events rather than Error envelopes
    pub const MANAGED_RUN_FAILED: &str = "managed_run_failed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version_is_v1() {
        assert_eq!(PROTOCOL_VERSION, "v1");
    }

    #[test]
    fn test_codes_are_snake_case() {
        let all = [
            codes::SERVER_BUSY,
            codes::INTERNAL_ERROR,
            codes::INVALID_REQUEST,
            codes::UNSUPPORTED_VERSION,
            codes::UNSUPPORTED_ACTION,
            codes::COMMAND_FAILED,
            codes::MANAGED_RUN_FAILED,
        ];

        for code in all {
            assert!(
                code.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "Code '{code}' should be snake_case"
            );
        }
    }
}
