pub mod cache;
pub mod items;
pub mod stream;
pub mod track;

use std::future::Future;

use gorilla_client::{CancellationToken, ClientError};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

/// Exit code for a canceled operation.
pub const EXIT_CANCELED: i32 = 130;

/// Run a client call on a fresh runtime, with Ctrl-C wired to cancellation.
pub fn block_on<T, F, Fut>(call: F) -> Result<std::result::Result<T, ClientError>>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = std::result::Result<T, ClientError>>,
{
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let cancel = CancellationToken::new();

    Ok(runtime.block_on(async move {
        let trigger = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });
        call(cancel).await
    }))
}

/// Report a failed call and exit.
pub fn fail(err: &ClientError) -> ! {
    if err.is_canceled() {
        eprintln!("Operation cancelled.");
        std::process::exit(EXIT_CANCELED);
    }
    eprintln!("error: {err}");
    std::process::exit(1);
}

/// Print a value as one compact JSON line.
pub fn print_json_line<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value).into_diagnostic()?);
    Ok(())
}
