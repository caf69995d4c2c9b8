use gorilla_client::{ClientOptions, PipeServiceClient, ServiceClient};
use gorilla_proto::{timestamp, OperationAccepted};
use miette::Result;

use super::{block_on, fail, print_json_line};

/// Which catalog action to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Action {
    Install,
    Remove,
}

/// Print every optional install, one JSON line each.
pub fn list(options: ClientOptions) -> Result<()> {
    let client = PipeServiceClient::new(options);
    let listed = block_on(|cancel| async move {
        client.list_optional_installs(&cancel).await
    })?;
    let items = match listed {
        Ok(items) => items,
        Err(e) => fail(&e),
    };

    if items.is_empty() {
        println!("none");
        return Ok(());
    }
    for item in &items {
        print_json_line(item)?;
    }
    Ok(())
}

/// Submit an install or remove and print the acceptance.
pub fn run(options: ClientOptions, action: Action, item_name: &str) -> Result<()> {
    let accepted = match submit(PipeServiceClient::new(options), action, item_name)? {
        Ok(accepted) => accepted,
        Err(e) => fail(&e),
    };
    print_accepted(&accepted);
    Ok(())
}

pub(crate) fn submit(
    client: PipeServiceClient,
    action: Action,
    item_name: &str,
) -> Result<Result<OperationAccepted, gorilla_client::ClientError>> {
    block_on(|cancel| async move {
        match action {
            Action::Install => client.install_item(item_name, &cancel).await,
            Action::Remove => client.remove_item(item_name, &cancel).await,
        }
    })
}

pub(crate) fn print_accepted(accepted: &OperationAccepted) {
    let queued = accepted
        .queued_at_utc
        .as_ref()
        .map_or_else(|| "-".to_string(), timestamp::format);
    println!("accepted: {}", accepted.accepted);
    println!("operationId: {}", accepted.operation_id);
    println!("queuedAtUtc: {queued}");
}
