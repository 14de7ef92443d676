//! Client-side state containers
//!
//! Stores hold disposable copies of backend state, call the API modules and
//! report every action as an `ActionResult`. No action returns an `Err`; all
//! failures are converted at the store boundary.

mod activity;
mod auth;
mod checkin;

pub use activity::{ActivityStore, Pagination};
pub use auth::{AuthStore, Session};
pub use checkin::CheckinStore;

use log::debug;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Error;

/// Uniform outcome of a store action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ActionResult<T> {
    /// Success with a payload
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Failure with a message
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Failure carrying the backend's message, or `fallback` when it sent none
    pub fn from_error(err: &Error, fallback: &str) -> Self {
        debug!("Store action failed: {}", err);
        Self::fail(err.backend_message().unwrap_or(fallback))
    }

    /// Whether the action succeeded
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl ActionResult<()> {
    /// Success without a payload
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
        }
    }
}

/// Sets a loading flag for as long as it lives
pub(crate) struct Loading<'a>(&'a AtomicBool);

impl<'a> Loading<'a> {
    pub(crate) fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
