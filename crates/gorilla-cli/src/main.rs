#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod commands;
mod logging;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use commands::items::Action;
use gorilla_client::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use gorilla_client::paths::{self, PIPE_NAME_ENV};
use gorilla_client::ClientOptions;
use logging::DiagnosticsConfig;
use miette::Result;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "gorilla-pipe")]
#[command(author, version, long_about = None)]
#[command(about = "Talk to the Gorilla service over its local pipe")]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted logs
    #[arg(long, global = true)]
    json: bool,

    /// Pipe name or socket path of the service
    #[arg(short, long, global = true, env = PIPE_NAME_ENV)]
    #[arg(default_value = paths::DEFAULT_PIPE_NAME)]
    pipe: String,

    /// Connect timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    connect_timeout_ms: Option<u64>,

    /// Request timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    request_timeout_ms: Option<u64>,

    /// Override the cache file location
    #[arg(long, global = true, value_name = "PATH")]
    cache_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List optional installs
    List,

    /// Request installation of an item
    Install {
        /// Item name as listed by the service
        item: String,
    },

    /// Request removal of an item
    Remove {
        /// Item name as listed by the service
        item: String,
    },

    /// Print the status events of a running operation
    Stream {
        /// Operation id returned by install or remove
        operation_id: String,
    },

    /// Submit an install or remove and follow it to completion
    Track {
        #[arg(value_enum)]
        action: Action,

        /// Item name as listed by the service
        item: String,
    },

    /// Inspect or refresh the local optional-installs cache
    Cache {
        #[command(subcommand)]
        cache_cmd: CacheCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
enum CacheCommands {
    /// Print the cached list without contacting the service
    Show,

    /// Fetch the list from the service and persist it
    Refresh,
}

impl Cli {
    fn client_options(&self) -> ClientOptions {
        ClientOptions::default()
            .with_endpoint(self.pipe.trim())
            .with_connect_timeout(
                self.connect_timeout_ms
                    .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis),
            )
            .with_request_timeout(
                self.request_timeout_ms
                    .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_millis),
            )
    }

    fn cache_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(paths::cache_file_path)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json, &DiagnosticsConfig::from_env());

    let options = cli.client_options();
    debug!(
        command = ?cli.command,
        endpoint = %options.endpoint,
        connect_timeout_ms = options.connect_timeout.as_millis(),
        request_timeout_ms = options.request_timeout.as_millis(),
        "Starting"
    );

    match &cli.command {
        Commands::List => commands::items::list(options),
        Commands::Install { item } => commands::items::run(options, Action::Install, item),
        Commands::Remove { item } => commands::items::run(options, Action::Remove, item),
        Commands::Stream { operation_id } => commands::stream::run(options, operation_id),
        Commands::Track { action, item } => commands::track::run(options, *action, item),
        Commands::Cache { cache_cmd } => match cache_cmd {
            CacheCommands::Show => commands::cache::show(options, cli.cache_path()),
            CacheCommands::Refresh => commands::cache::refresh(options, cli.cache_path()),
        },
    }
}
