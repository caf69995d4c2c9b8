//! Domain value types and per-operation payload shapes.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::envelope::Envelope;
use crate::error::ProtocolError;

/// Decode a unit variant from its wire name, ignoring ASCII case.
pub(crate) fn variant_by_name<'de, D, T>(
    deserializer: D,
    variants: &[T],
    name: fn(&T) -> &'static str,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Copy,
{
    let value = String::deserialize(deserializer)?;
    variants
        .iter()
        .copied()
        .find(|variant| name(variant).eq_ignore_ascii_case(&value))
        .ok_or_else(|| D::Error::custom(format!("unknown variant `{value}`")))
}

/// Install status of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OptionalInstallStatus {
    Installed,
    NotInstalled,
    InstallPending,
    RemovePending,
    Unknown,
}

impl OptionalInstallStatus {
    pub const ALL: [OptionalInstallStatus; 5] = [
        Self::Installed,
        Self::NotInstalled,
        Self::InstallPending,
        Self::RemovePending,
        Self::Unknown,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "Installed",
            Self::NotInstalled => "NotInstalled",
            Self::InstallPending => "InstallPending",
            Self::RemovePending => "RemovePending",
            Self::Unknown => "Unknown",
        }
    }
}

impl<'de> Deserialize<'de> for OptionalInstallStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        variant_by_name(deserializer, &Self::ALL, Self::as_str)
    }
}

/// State of a long-running install/remove operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationState {
    Queued,
    Validating,
    Downloading,
    Installing,
    Removing,
    Succeeded,
    Failed,
    Canceled,
}

impl<'de> Deserialize<'de> for OperationState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        variant_by_name(deserializer, &Self::ALL, Self::as_str)
    }
}

impl OperationState {
    pub const ALL: [OperationState; 8] = [
        Self::Queued,
        Self::Validating,
        Self::Downloading,
        Self::Installing,
        Self::Removing,
        Self::Succeeded,
        Self::Failed,
        Self::Canceled,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Validating => "Validating",
            Self::Downloading => "Downloading",
            Self::Installing => "Installing",
            Self::Removing => "Removing",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }

    /// Terminal states end a status stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// A catalog entry as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalInstallItem {
    pub item_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub catalog: String,
    #[serde(default)]
    pub installer_type: String,
    #[serde(default)]
    pub installer_package_id: String,
    #[serde(default)]
    pub installer_location: String,
    #[serde(default)]
    pub is_managed: bool,
    #[serde(default)]
    pub is_installed: bool,
    pub status: OptionalInstallStatus,
    #[serde(
        default,
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_updated_at_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation_id: Option<String>,
}

/// Result of an install/remove request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationAccepted {
    pub operation_id: String,
    /// `false` means the service queued nothing.
    pub accepted: bool,
    #[serde(
        default,
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub queued_at_utc: Option<DateTime<Utc>>,
}

/// One point in a long-running operation's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatusEvent {
    pub operation_id: String,
    pub state: OperationState,
    pub progress_percent: i32,
    pub message: String,
    #[serde(with = "crate::timestamp::required")]
    pub timestamp_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_by: Option<String>,
}

impl OperationStatusEvent {
    /// Flatten a validated event envelope into a status value.
    pub fn from_envelope(envelope: Envelope<StatusEventPayload>) -> Result<Self, ProtocolError> {
        let timestamp_utc = envelope
            .timestamp_utc
            .ok_or(ProtocolError::MissingTimestamp)?;
        let payload = envelope.payload;
        Ok(Self {
            operation_id: envelope.operation_id,
            state: payload.state,
            progress_percent: payload.progress_percent,
            message: payload.message,
            timestamp_utc,
            error_code: payload.error_code,
            error_message: payload.error_message,
            canceled_by: payload.canceled_by,
        })
    }
}

/// Request payload for `ListOptionalInstalls` and `StreamOperationStatus`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyPayload {}

/// Request payload for `InstallItem` and `RemoveItem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub item_name: String,
}

impl ItemRequest {
    #[must_use]
    pub fn new(item_name: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptionalInstallsResponse {
    /// A `null` or absent list decodes as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<OptionalInstallItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationAcceptedResponse {
    pub accepted: bool,
    #[serde(
        default,
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub queued_at_utc: Option<DateTime<Utc>>,
}

/// Acknowledgement that opens a status stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamAck {
    pub stream_accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEventPayload {
    pub state: OperationState,
    pub progress_percent: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_by: Option<String>,
}

impl StatusEventPayload {
    #[must_use]
    pub fn new(state: OperationState, progress_percent: i32, message: impl Into<String>) -> Self {
        Self {
            state,
            progress_percent,
            message: message.into(),
            error_code: None,
            error_message: None,
            canceled_by: None,
        }
    }
}

/// Payload of an `Error` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub error_message: String,
}

/// Decode a possibly-`null` JSON array as a `Vec`.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(items.unwrap_or_default())
}
