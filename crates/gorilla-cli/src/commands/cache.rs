use std::path::PathBuf;

use gorilla_client::{
    CacheCoordinator, CacheDocument, ClientOptions, JsonFileCacheStore, PipeServiceClient,
};
use gorilla_proto::timestamp;
use miette::{IntoDiagnostic, Result};

use super::{block_on, fail};

fn coordinator(
    options: ClientOptions,
    cache_path: PathBuf,
) -> CacheCoordinator<PipeServiceClient, JsonFileCacheStore> {
    CacheCoordinator::new(
        PipeServiceClient::new(options),
        JsonFileCacheStore::new(cache_path),
    )
}

fn print_document(document: Option<&CacheDocument>) -> Result<()> {
    match document {
        Some(document) => {
            let json = serde_json::to_string_pretty(document).into_diagnostic()?;
            println!("{json}");
        }
        None => println!("none"),
    }
    Ok(())
}

/// Print the persisted document without contacting the service.
pub fn show(options: ClientOptions, cache_path: PathBuf) -> Result<()> {
    let coordinator = coordinator(options, cache_path);
    let loaded = block_on(|cancel| async move {
        coordinator.load_cached(&cancel).await
    })?;
    match loaded {
        Ok(document) => print_document(document.as_ref()),
        Err(e) => fail(&e),
    }
}

/// Refresh from the service. On failure the previous document is still
/// shown before the error is reported.
pub fn refresh(options: ClientOptions, cache_path: PathBuf) -> Result<()> {
    let coordinator = coordinator(options, cache_path);

    let (refreshed, previous) = block_on(|cancel| async move {
        match coordinator.refresh(&cancel).await {
            Ok(document) => Ok((Ok(document), None)),
            Err(e) if e.is_canceled() => Err(e),
            Err(e) => match coordinator.load_cached(&cancel).await {
                Ok(previous) => Ok((Err(e), previous)),
                Err(load_err) => Err(load_err),
            },
        }
    })?
    .unwrap_or_else(|e| fail(&e));

    match refreshed {
        Ok(document) => print_document(Some(&document)),
        Err(e) => {
            if let Some(previous) = &previous {
                print_document(Some(previous))?;
                eprintln!(
                    "warning: refresh failed; showing cached data from {}",
                    timestamp::format(&previous.cached_at_utc)
                );
            } else {
                eprintln!("warning: refresh failed and no cached data is available");
            }
            fail(&e)
        }
    }
}
