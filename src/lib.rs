//! Campus Activity Client Library
//!
//! A Rust client for the campus activity platform: typed endpoint wrappers,
//! session-aware stores and the route guard of the web client, sharing one
//! configured HTTP client.

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod persist;
pub mod router;
pub mod store;
pub mod types;

use std::sync::Arc;

use crate::api::{ActivityApi, AuthApi, CheckinApi, RegistrationApi, StatisticsApi, UploadApi};
use crate::config::ClientOptions;
use crate::error::Result;
use crate::http::{HttpClient, Notifier, NotifyAndRedirect, RedirectToLogin, UnauthorizedHandler};
use crate::persist::{MemoryStorage, SessionStorage};
use crate::router::{History, Location, Navigator, Router};
use crate::store::{ActivityStore, AuthStore, CheckinStore};

/// The main entry point for the campus activity client
pub struct CampusClient {
    http: HttpClient,
    history: Arc<History>,
    router: Router,
    auth: AuthStore,
    activities: ActivityStore,
    checkin: CheckinStore,
}

impl CampusClient {
    /// Create a new client that redirects to the login view when the
    /// backend rejects the session
    ///
    /// # Example
    ///
    /// ```no_run
    /// use campus_activity::{CampusClient, config::ClientOptions, persist::FileStorage};
    /// use std::sync::Arc;
    ///
    /// # async fn run() -> campus_activity::error::Result<()> {
    /// let storage = Arc::new(FileStorage::open("session.json")?);
    /// let client = CampusClient::new(ClientOptions::from_env()?, storage)?;
    /// client.auth().init_auth();
    /// client.checkin().restore_check_in_code();
    /// client.navigate("/activities");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(options: ClientOptions, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let history = Arc::new(History::default());
        let handler = Arc::new(RedirectToLogin::new(history.clone()));
        Self::assemble(options, storage, history, handler)
    }

    /// Like `new`, but a notification is raised before redirecting
    pub fn with_notifier(
        options: ClientOptions,
        storage: Arc<dyn SessionStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let history = Arc::new(History::default());
        let handler = Arc::new(NotifyAndRedirect::new(notifier, history.clone()));
        Self::assemble(options, storage, history, handler)
    }

    /// Client configured from the environment with in-memory storage
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?, Arc::new(MemoryStorage::new()))
    }

    fn assemble(
        options: ClientOptions,
        storage: Arc<dyn SessionStorage>,
        history: Arc<History>,
        handler: Arc<dyn UnauthorizedHandler>,
    ) -> Result<Self> {
        let http = HttpClient::new(options, storage.clone(), handler)?;
        Ok(Self {
            auth: AuthStore::new(http.clone()),
            activities: ActivityStore::new(http.clone()),
            checkin: CheckinStore::new(storage),
            router: Router::new(),
            history,
            http,
        })
    }

    /// Get the shared HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Get the auth store
    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    /// Get the activity store
    pub fn activities(&self) -> &ActivityStore {
        &self.activities
    }

    /// Get the check-in store
    pub fn checkin(&self) -> &CheckinStore {
        &self.checkin
    }

    /// Get the router
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Get the navigation history
    pub fn history(&self) -> &Arc<History> {
        &self.history
    }

    /// Create an activity API client
    pub fn activity_api(&self) -> ActivityApi {
        ActivityApi::new(self.http.clone())
    }

    /// Create an auth API client
    pub fn auth_api(&self) -> AuthApi {
        AuthApi::new(self.http.clone())
    }

    /// Create a check-in API client
    pub fn checkin_api(&self) -> CheckinApi {
        CheckinApi::new(self.http.clone())
    }

    /// Create a registration API client
    pub fn registration_api(&self) -> RegistrationApi {
        RegistrationApi::new(self.http.clone())
    }

    /// Create a statistics API client
    pub fn statistics_api(&self) -> StatisticsApi {
        StatisticsApi::new(self.http.clone())
    }

    /// Create an upload API client
    pub fn upload_api(&self) -> UploadApi {
        UploadApi::new(self.http.clone())
    }

    /// Navigate through the route guard; returns where navigation ended
    pub fn navigate(&self, full_path: &str) -> Location {
        self.router
            .navigate(&*self.history, Location::parse(full_path), &self.auth)
    }

    /// Where navigation currently is
    pub fn current_location(&self) -> Location {
        self.history.current()
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, Result};
    pub use crate::persist::{FileStorage, MemoryStorage, SessionStorage};
    pub use crate::store::ActionResult;
    pub use crate::CampusClient;
}
