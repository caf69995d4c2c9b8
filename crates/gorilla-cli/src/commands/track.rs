use gorilla_client::{ClientOptions, OperationTracker, PipeServiceClient};
use gorilla_proto::{OperationState, OperationStatusEvent};
use miette::Result;

use super::items::{print_accepted, submit, Action};
use super::{block_on, fail};

/// Submit an install or remove, then follow it to a terminal state.
pub fn run(options: ClientOptions, action: Action, item_name: &str) -> Result<()> {
    let client = PipeServiceClient::new(options);

    let accepted = match submit(client.clone(), action, item_name)? {
        Ok(accepted) => accepted,
        Err(e) => fail(&e),
    };
    print_accepted(&accepted);
    if !accepted.accepted {
        eprintln!("error: {item_name} was not accepted by the service");
        std::process::exit(1);
    }

    let tracker = OperationTracker::new(client);
    let operation_id = accepted.operation_id;
    let mut last: Option<OperationStatusEvent> = None;

    let outcome = block_on(|cancel| {
        let last = &mut last;
        let tracker = &tracker;
        let operation_id = operation_id.as_str();
        async move {
            tracker
                .track(
                    operation_id,
                    |event| {
                        println!(
                            "[{:?}] {:>3}% {}",
                            event.state, event.progress_percent, event.message
                        );
                        *last = Some(event);
                    },
                    &cancel,
                )
                .await
        }
    })?;

    if let Err(e) = outcome {
        fail(&e);
    }

    match last {
        Some(event) if event.state == OperationState::Succeeded => Ok(()),
        Some(event) => {
            let detail = event
                .error_message
                .or_else(|| event.canceled_by.map(|by| format!("canceled by {by}")))
                .unwrap_or(event.message);
            eprintln!("error: {item_name} {:?}: {detail}", event.state);
            std::process::exit(1);
        }
        None => Ok(()),
    }
}
