//! What happens after the backend rejects the session

use async_trait::async_trait;
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::router::{Location, Navigator, LOGIN_PATH};

/// Message shown when a session expires
pub const SESSION_EXPIRED_MESSAGE: &str = "登录已过期，请重新登录";

/// Strategy run once per rejected session, after the persisted session keys
/// have been cleared.
#[async_trait]
pub trait UnauthorizedHandler: Send + Sync {
    async fn on_unauthorized(&self, message: Option<&str>);
}

/// Receives user-visible transient notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Only records the teardown in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnly;

#[async_trait]
impl UnauthorizedHandler for LogOnly {
    async fn on_unauthorized(&self, message: Option<&str>) {
        warn!(
            "Session ended: {}",
            message.unwrap_or(SESSION_EXPIRED_MESSAGE)
        );
    }
}

/// Send the user to the login view, remembering where they were
pub struct RedirectToLogin {
    navigator: Arc<dyn Navigator>,
}

impl RedirectToLogin {
    /// Redirect through `navigator`
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

#[async_trait]
impl UnauthorizedHandler for RedirectToLogin {
    async fn on_unauthorized(&self, _message: Option<&str>) {
        let current = self.navigator.current();
        if current.path == LOGIN_PATH {
            return;
        }
        let target = Location::login_with_redirect(&current.full_path());
        info!("Redirecting to {}", target.full_path());
        self.navigator.replace(target);
    }
}

/// Raise a notification, then redirect like `RedirectToLogin`
pub struct NotifyAndRedirect {
    notifier: Arc<dyn Notifier>,
    redirect: RedirectToLogin,
}

impl NotifyAndRedirect {
    /// Notify through `notifier`, then redirect through `navigator`
    pub fn new(notifier: Arc<dyn Notifier>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            notifier,
            redirect: RedirectToLogin::new(navigator),
        }
    }
}

#[async_trait]
impl UnauthorizedHandler for NotifyAndRedirect {
    async fn on_unauthorized(&self, message: Option<&str>) {
        self.notifier
            .notify(message.unwrap_or(SESSION_EXPIRED_MESSAGE));
        self.redirect.on_unauthorized(message).await;
    }
}

/// Single-flight guard for session teardown.
///
/// Each request records the epoch it was sent in. Only the first 401 for a
/// given epoch closes it; the teardown runs while `teardown` is held, so
/// concurrent 401s wait for it to finish and then find the epoch closed.
#[derive(Debug, Default)]
pub(crate) struct SessionGate {
    epoch: AtomicU64,
    teardown: Mutex<()>,
}

impl SessionGate {
    pub(crate) fn current(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub(crate) fn advance(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) async fn enter(&self) -> MutexGuard<'_, ()> {
        self.teardown.lock().await
    }

    /// Close `epoch` if it is still current
    pub(crate) fn try_close(&self, epoch: u64) -> bool {
        self.epoch
            .compare_exchange(epoch, epoch + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
