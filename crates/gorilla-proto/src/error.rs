use thiserror::Error;

/// A malformed or unexpected message from the peer.
///
/// Always fatal to the current call: it indicates version skew or a bug on
/// the other end, so nothing retries it.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unsupported protocol version '{0}'")]
    UnsupportedVersion(String),

    #[error("Unsupported operation '{0}'")]
    UnsupportedOperation(String),

    #[error("timestampUtc is required")]
    MissingTimestamp,

    #[error("requestId is required for non-event messages")]
    MissingRequestId,

    #[error("itemName is required")]
    MissingItemName,

    #[error("statusUpdatedAtUtc is required")]
    MissingStatusTimestamp,

    #[error("progressPercent must be between 0 and 100, got {0}")]
    ProgressOutOfRange(i32),

    #[error("errorMessage is required when state is Failed")]
    MissingErrorMessage,

    #[error("canceledBy is required when state is Canceled")]
    MissingCanceledBy,

    #[error("Unexpected {field}: expected '{expected}', got '{actual}'")]
    Unexpected {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Service rejected StreamOperationStatus request")]
    StreamRejected,

    #[error("No response received from service")]
    NoResponse,

    #[error("Stream ended before terminal status event was received")]
    StreamEnded,

    #[error("Service returned an error envelope with a missing payload")]
    MissingErrorPayload,

    #[error("Malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("Line is not valid UTF-8")]
    InvalidUtf8,
}

impl ProtocolError {
    #[must_use]
    pub fn unexpected(
        field: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Unexpected {
            field,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
