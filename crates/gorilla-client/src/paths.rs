use std::path::PathBuf;

/// Environment variable overriding the service endpoint.
pub const PIPE_NAME_ENV: &str = "GORILLA_PIPE_NAME";

/// Well-known name the service listens on.
pub const DEFAULT_PIPE_NAME: &str = "gorilla-service";

/// Get the service endpoint name.
///
/// Respects `GORILLA_PIPE_NAME`. Platform normalization (the `\\.\pipe\`
/// prefix on Windows, a socket path on Unix) happens at connect time.
#[must_use]
pub fn ipc_endpoint() -> String {
    match std::env::var(PIPE_NAME_ENV) {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => DEFAULT_PIPE_NAME.to_string(),
    }
}

/// Base directory for per-user local data.
///
/// - Linux: `$XDG_DATA_HOME` or `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `%LOCALAPPDATA%`
fn local_data_dir() -> PathBuf {
    dirs_next::data_local_dir().map_or_else(
        || {
            dirs_next::home_dir().map_or_else(
                || PathBuf::from("."),
                |p| p.join(".local").join("share"),
            )
        },
        |p| p,
    )
}

/// Default location of the persisted optional-installs list.
#[must_use]
pub fn cache_file_path() -> PathBuf {
    local_data_dir()
        .join("Gorilla")
        .join("ui")
        .join("optional-installs-cache.json")
}

/// Default location of the diagnostic log file.
#[must_use]
pub fn log_file_path() -> PathBuf {
    local_data_dir().join("gorilla").join("ui-client.log")
}
