use std::time::Duration;

use crate::paths;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout, measured from connection open.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the service client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Pipe name or socket path.
    pub endpoint: String,

    /// Upper bound on establishing the connection.
    pub connect_timeout: Duration,

    /// Upper bound on a request once connected. Does not cover the
    /// event loop of a status stream.
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: paths::DEFAULT_PIPE_NAME.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientOptions {
    /// Defaults, with the endpoint taken from `GORILLA_PIPE_NAME` if set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_endpoint(paths::ipc_endpoint())
    }

    /// Set the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.endpoint, "gorilla-service");
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert_eq!(options.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let options = ClientOptions::default()
            .with_endpoint("gorilla-test")
            .with_connect_timeout(Duration::from_millis(250))
            .with_request_timeout(Duration::from_secs(2));

        assert_eq!(options.endpoint, "gorilla-test");
        assert_eq!(options.connect_timeout, Duration::from_millis(250));
        assert_eq!(options.request_timeout, Duration::from_secs(2));
    }
}
