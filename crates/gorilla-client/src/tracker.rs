use futures::StreamExt;
use gorilla_proto::OperationStatusEvent;
use tokio_util::sync::CancellationToken;

use crate::client::ServiceClient;
use crate::error::ClientError;

/// Follows one operation's status stream and reports each event.
#[derive(Debug, Clone)]
pub struct OperationTracker<C> {
    client: C,
}

impl<C: ServiceClient> OperationTracker<C> {
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Invoke `on_update` for each event in arrival order until the stream
    /// ends, either at a terminal state or with an error.
    pub async fn track<F>(
        &self,
        operation_id: &str,
        mut on_update: F,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError>
    where
        F: FnMut(OperationStatusEvent),
    {
        let mut events = self.client.stream_operation_status(operation_id, cancel);
        while let Some(event) = events.next().await {
            on_update(event?);
        }
        Ok(())
    }
}
