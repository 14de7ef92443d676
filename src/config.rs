//! Configuration options for the campus activity client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Base address used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Environment variable overriding the base address
pub const BASE_URL_ENV: &str = "CAMPUS_API_BASE_URL";

/// Client-wide transport timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration options for the campus activity client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base address every endpoint path is appended to
    pub base_url: String,

    /// The request timeout
    pub request_timeout: Duration,

    /// Value of the `X-Client-Info` header
    pub client_info: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            client_info: format!("campus-activity-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Build options from the environment.
    ///
    /// `CAMPUS_API_BASE_URL` overrides the base address; when unset the default
    /// local development address is used.
    pub fn from_env() -> Result<Self> {
        match std::env::var(BASE_URL_ENV) {
            Ok(value) => Self::default().with_base_url(&value).validated(),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(Error::config(format!("{}: {}", BASE_URL_ENV, e))),
        }
    }

    /// Set the base address
    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.trim().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Duration) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the client info header value
    pub fn with_client_info(mut self, value: &str) -> Self {
        self.client_info = value.to_string();
        self
    }

    /// Check that the base address is an absolute URL
    pub fn validated(self) -> Result<Self> {
        if self.base_url.is_empty() {
            return Err(Error::config("base URL cannot be empty"));
        }
        Url::parse(&self.base_url)?;
        Ok(self)
    }

    /// Join an endpoint path onto the base address
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.base_url, "http://localhost:5000/api");
        assert_eq!(options.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let options = ClientOptions::default().with_base_url("https://campus.example.edu/api/");
        assert_eq!(
            options.endpoint("/activities/3"),
            "https://campus.example.edu/api/activities/3"
        );
        assert_eq!(
            options.endpoint("auth/me"),
            "https://campus.example.edu/api/auth/me"
        );
    }

    #[test]
    fn test_validated_rejects_relative_base() {
        assert!(ClientOptions::default().with_base_url("").validated().is_err());
        assert!(ClientOptions::default()
            .with_base_url("/api")
            .validated()
            .is_err());
        assert!(ClientOptions::default()
            .with_base_url("http://10.0.0.2:8080/api")
            .validated()
            .is_ok());
    }
}
