//! Persisted optional-installs list.
//!
//! Loading the cached list and refreshing it from the service are separate
//! operations, so a caller can show stale data at once and replace it when
//! the refresh completes.

mod coordinator;
mod store;

pub use coordinator::CacheCoordinator;
pub use store::JsonFileCacheStore;

use std::future::Future;

use chrono::{DateTime, Utc};
use gorilla_proto::types::null_as_empty;
use gorilla_proto::OptionalInstallItem;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// The document written to the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    #[serde(with = "gorilla_proto::timestamp::required")]
    pub cached_at_utc: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<OptionalInstallItem>,
}

impl CacheDocument {
    #[must_use]
    pub fn new(items: Vec<OptionalInstallItem>) -> Self {
        Self {
            cached_at_utc: Utc::now(),
            items,
        }
    }
}

/// Storage for a single [`CacheDocument`].
pub trait CacheStore: Send + Sync {
    /// Load the stored document.
    ///
    /// Absent or undecodable content is `Ok(None)`; the only error is
    /// cancellation.
    fn load(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Option<CacheDocument>, ClientError>> + Send;

    /// Replace the stored document.
    fn save(
        &self,
        document: &CacheDocument,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}
