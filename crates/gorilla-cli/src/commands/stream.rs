use futures::StreamExt;
use gorilla_client::{ClientError, ClientOptions, PipeServiceClient, ServiceClient};
use miette::Result;

use super::{block_on, fail};

/// Print each status event of `operation_id` as a JSON line until the
/// stream ends.
pub fn run(options: ClientOptions, operation_id: &str) -> Result<()> {
    let client = PipeServiceClient::new(options);

    let outcome = block_on(|cancel| async move {
        let mut events = client.stream_operation_status(operation_id, &cancel);
        while let Some(event) = events.next().await {
            let event = event?;
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("warning: could not encode event: {e}"),
            }
        }
        Ok::<(), ClientError>(())
    })?;

    if let Err(e) = outcome {
        fail(&e);
    }
    Ok(())
}
