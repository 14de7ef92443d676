//! Error handling for the campus activity client

use std::fmt;
use thiserror::Error;

/// Unified error type for the campus activity client
#[derive(Error, Debug)]
pub enum Error {
    /// Network, timeout or connection errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The envelope carried an application code other than 200.
    ///
    /// `message` is the body's `message`, else its `msg`; `msg` keeps the raw
    /// `msg` field for callers that rank it first.
    #[error("API error {code}: {}", .message.as_deref().unwrap_or("Error"))]
    Api {
        code: i64,
        message: Option<String>,
        msg: Option<String>,
    },

    /// The transport answered with a 4xx/5xx status
    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
        msg: Option<String>,
    },

    /// Application code or HTTP status 401
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("session expired"))]
    Unauthorized {
        message: Option<String>,
        msg: Option<String>,
    },

    /// The envelope reported success but carried no `data`
    #[error("Response envelope has no data")]
    MissingData,

    /// Persistent storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected before the request was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new invalid input error
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// The message supplied by the backend, if the failure carried one.
    ///
    /// Stores fall back to their own localized text when this is `None`.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Error::Api { message, .. }
            | Error::Status { message, .. }
            | Error::Unauthorized { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Like `backend_message`, but the body's `msg` ranks before `message`
    pub fn backend_msg(&self) -> Option<&str> {
        match self {
            Error::Api { message, msg, .. }
            | Error::Status { message, msg, .. }
            | Error::Unauthorized { message, msg } => msg.as_deref().or(message.as_deref()),
            _ => None,
        }
    }

    /// Whether the failure was an authentication failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_only_for_remote_failures() {
        let api = Error::Api {
            code: 400,
            message: Some("活动已满".to_string()),
            msg: None,
        };
        assert_eq!(api.backend_message(), Some("活动已满"));

        let status = Error::Status {
            status: 500,
            message: None,
            msg: None,
        };
        assert_eq!(status.backend_message(), None);

        assert_eq!(Error::general("boom").backend_message(), None);
        assert_eq!(Error::MissingData.backend_message(), None);
    }

    #[test]
    fn test_display_falls_back_when_message_missing() {
        let err = Error::Api {
            code: 409,
            message: None,
            msg: None,
        };
        assert_eq!(err.to_string(), "API error 409: Error");

        let err = Error::Unauthorized {
            message: None,
            msg: None,
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Unauthorized: session expired");
    }

    #[test]
    fn test_backend_msg_ranks_msg_first() {
        let err = Error::Unauthorized {
            message: Some("Unauthorized".into()),
            msg: Some("账号或密码错误".into()),
        };
        assert_eq!(err.backend_message(), Some("Unauthorized"));
        assert_eq!(err.backend_msg(), Some("账号或密码错误"));

        let err = Error::Status {
            status: 403,
            message: Some("账号已被禁用".into()),
            msg: None,
        };
        assert_eq!(err.backend_msg(), Some("账号已被禁用"));
        assert_eq!(Error::MissingData.backend_msg(), None);
    }
}
