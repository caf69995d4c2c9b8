use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{CacheDocument, CacheStore};
use crate::client::ServiceClient;
use crate::error::ClientError;

/// Pairs a service client with a cache store.
#[derive(Debug, Clone)]
pub struct CacheCoordinator<C, S> {
    client: C,
    store: S,
}

impl<C: ServiceClient, S: CacheStore> CacheCoordinator<C, S> {
    #[must_use]
    pub fn new(client: C, store: S) -> Self {
        Self { client, store }
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The last persisted document, without touching the network.
    pub async fn load_cached(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<CacheDocument>, ClientError> {
        self.store.load(cancel).await
    }

    /// Fetch the current list, persist it, then return it.
    ///
    /// A failed fetch is returned as-is; the stored document is left
    /// untouched.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<CacheDocument, ClientError> {
        let items = self.client.list_optional_installs(cancel).await?;
        let document = CacheDocument::new(items);
        self.store.save(&document, cancel).await?;
        debug!(count = document.items.len(), "Refreshed cache");
        Ok(document)
    }
}
