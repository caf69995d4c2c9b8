#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! Client core for the Gorilla optional-installs service.
//!
//! Every call opens its own connection to the service; nothing is pooled or
//! multiplexed, and nothing is retried inside this crate.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod ipc;
pub mod paths;
pub mod stream;
pub mod tracker;

mod transport;

pub use cache::{CacheCoordinator, CacheDocument, CacheStore, JsonFileCacheStore};
pub use client::{PipeServiceClient, ServiceClient, StatusEvents};
pub use config::ClientOptions;
pub use error::{CacheError, ClientError};
pub use ipc::{Connector, PipeConnector};
pub use stream::StatusStream;
pub use tokio_util::sync::CancellationToken;
pub use tracker::OperationTracker;
