//! Session state: who is logged in and with which role

use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use super::{ActionResult, Loading};
use crate::api::AuthApi;
use crate::http::HttpClient;
use crate::persist::{
    clear_session, read_json, write_json, SessionStorage, ACCOUNT_USER_KEY, TOKEN_KEY, USER_KEY,
};
use crate::types::{
    AccountUser, LoginForm, PasswordChange, ProfileUpdate, RegisterForm, Role, User, SUCCESS_CODE,
};

const LOGIN_FAILED: &str = "登录失败";
const REGISTER_FAILED: &str = "注册失败";
const UPDATE_FAILED: &str = "更新失败";
const PASSWORD_FAILED: &str = "修改密码失败";
const FETCH_USER_FAILED: &str = "获取用户信息失败";

/// The logged-in principal.
///
/// `account_user` is the external account identity and `user` the internal
/// profile. Their roles are reconciled once per mutation into
/// `effective_role`, with the account's role taking precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    account_user: Option<AccountUser>,
    user: Option<User>,
    token: Option<String>,
    effective_role: Option<Role>,
}

impl Session {
    /// Session from its parts
    pub fn new(account_user: Option<AccountUser>, user: Option<User>, token: Option<String>) -> Self {
        let mut session = Self {
            account_user,
            user,
            token,
            effective_role: None,
        };
        session.resolve();
        session
    }

    /// The account returned by login
    pub fn account_user(&self) -> Option<&AccountUser> {
        self.account_user.as_ref()
    }

    /// The user profile
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The bearer token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Account role, else profile role
    pub fn effective_role(&self) -> Option<Role> {
        self.effective_role
    }

    /// An account identity, or a profile backed by a token
    pub fn is_logged_in(&self) -> bool {
        self.account_user.is_some() || (self.user.is_some() && self.token.is_some())
    }

    /// Whether nothing is held
    pub fn is_empty(&self) -> bool {
        self.account_user.is_none() && self.user.is_none() && self.token.is_none()
    }

    fn set_account_user(&mut self, account_user: Option<AccountUser>) {
        self.account_user = account_user;
        self.resolve();
    }

    fn set_user(&mut self, user: Option<User>) {
        self.user = user;
        self.resolve();
    }

    fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn resolve(&mut self) {
        self.effective_role = self
            .account_user
            .as_ref()
            .and_then(|account| account.role)
            .or_else(|| self.user.as_ref().map(|user| user.role));
    }
}

#[derive(Debug, Default)]
struct AuthState {
    session: Session,
    /// HTTP session epoch this state belongs to
    epoch: u64,
}

/// Holds the session and drives login, registration and logout
pub struct AuthStore {
    api: AuthApi,
    http: HttpClient,
    state: RwLock<AuthState>,
    loading: AtomicBool,
}

impl AuthStore {
    /// Create a new auth store
    pub fn new(http: HttpClient) -> Self {
        let epoch = http.session_epoch();
        Self {
            api: AuthApi::new(http.clone()),
            http,
            state: RwLock::new(AuthState {
                session: Session::default(),
                epoch,
            }),
            loading: AtomicBool::new(false),
        }
    }

    fn storage(&self) -> &dyn SessionStorage {
        self.http.storage().as_ref()
    }

    /// State lock. A session torn down by a 401 since the state was written
    /// is dropped here.
    fn state(&self) -> RwLockWriteGuard<'_, AuthState> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let epoch = self.http.session_epoch();
        if state.epoch != epoch {
            if !state.session.is_empty() {
                info!("Session ended by the backend; dropping in-memory session");
                state.session = Session::default();
            }
            state.epoch = epoch;
        }
        state
    }

    /// Snapshot of the session
    pub fn session(&self) -> Session {
        self.state().session.clone()
    }

    /// The user profile
    pub fn user(&self) -> Option<User> {
        self.state().session.user.clone()
    }

    /// The account returned by login
    pub fn account_user(&self) -> Option<AccountUser> {
        self.state().session.account_user.clone()
    }

    /// The bearer token
    pub fn token(&self) -> Option<String> {
        self.state().session.token.clone()
    }

    /// Whether an action is in flight
    pub fn loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Account role, else profile role
    pub fn effective_role(&self) -> Option<Role> {
        self.state().session.effective_role()
    }

    /// Whether the session counts as logged in
    pub fn is_logged_in(&self) -> bool {
        self.state().session.is_logged_in()
    }

    /// Whether the effective role is admin
    pub fn is_admin(&self) -> bool {
        self.effective_role() == Some(Role::Admin)
    }

    /// Whether the effective role is student
    pub fn is_student(&self) -> bool {
        self.effective_role() == Some(Role::Student)
    }

    /// Whether the effective role is organizer
    pub fn is_organizer(&self) -> bool {
        self.effective_role() == Some(Role::Organizer)
    }

    /// Restore the session from persistent storage.
    ///
    /// Malformed blobs are removed and treated as absent.
    pub fn init_auth(&self) {
        let storage = self.storage();
        let account_user: Option<AccountUser> = read_json(storage, ACCOUNT_USER_KEY);
        let user: Option<User> = read_json(storage, USER_KEY);
        let token = storage.get(TOKEN_KEY);

        let mut state = self.state();
        state.session = Session::new(account_user, user, token);
        debug!(
            "Restored session (logged in: {}, role: {:?})",
            state.session.is_logged_in(),
            state.session.effective_role()
        );
    }

    /// Restore from storage unless a session is already loaded
    pub fn hydrate_if_needed(&self) {
        if !self.state().session.is_empty() {
            return;
        }
        let storage = self.storage();
        if storage.contains(ACCOUNT_USER_KEY) || storage.contains(USER_KEY) {
            self.init_auth();
        }
    }

    /// Log in. State is committed only when the envelope reports both
    /// `success == true` and `code == 200`; the result carries the account name.
    pub async fn login(&self, form: &LoginForm) -> ActionResult<String> {
        let _loading = Loading::start(&self.loading);

        let envelope = match self.api.login(form).await {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Login request failed: {}", e);
                return ActionResult::fail(e.backend_msg().unwrap_or(LOGIN_FAILED));
            }
        };

        if envelope.success != Some(true) || envelope.code != SUCCESS_CODE {
            return ActionResult::fail(envelope.msg_text().unwrap_or(LOGIN_FAILED));
        }
        let message = envelope.msg_text().map(str::to_string);
        let Some(account) = envelope.data else {
            return ActionResult::fail(message.unwrap_or_else(|| LOGIN_FAILED.to_string()));
        };

        let name = account.name.clone();
        self.commit_login(account);
        info!("Logged in as {}", name);
        ActionResult::ok(name)
    }

    fn commit_login(&self, account: AccountUser) {
        let epoch = self.http.begin_session();
        let storage = self.storage();

        write_json(storage, ACCOUNT_USER_KEY, &account);
        if let Some(token) = &account.token {
            storage.set(TOKEN_KEY, token);
        }
        if let Some(user) = &account.user {
            write_json(storage, USER_KEY, user);
        }

        let mut state = self.state();
        state.epoch = epoch;
        if let Some(token) = &account.token {
            state.session.set_token(Some(token.clone()));
        }
        if let Some(user) = &account.user {
            state.session.set_user(Some(user.clone()));
        }
        state.session.set_account_user(Some(account));
    }

    /// Register a new account and start a session
    pub async fn register(&self, form: &RegisterForm) -> ActionResult {
        let _loading = Loading::start(&self.loading);

        let result = match self.api.register(form).await.and_then(|e| e.into_data()) {
            Ok(result) => result,
            Err(e) => return ActionResult::from_error(&e, REGISTER_FAILED),
        };

        let epoch = self.http.begin_session();
        let storage = self.storage();
        storage.set(TOKEN_KEY, &result.token);
        write_json(storage, USER_KEY, &result.user);

        let mut state = self.state();
        state.epoch = epoch;
        state.session.set_token(Some(result.token));
        state.session.set_user(Some(result.user));
        ActionResult::done()
    }

    /// Log out. Local state and storage are cleared even when the remote call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            error!("Logout error: {}", e);
        }
        self.clear();
    }

    fn clear(&self) {
        self.state().session = Session::default();
        clear_session(self.storage());
    }

    /// Refresh the profile record; logs out when that fails
    pub async fn fetch_current_user(&self) -> ActionResult<User> {
        match self.api.get_current_user().await.and_then(|e| e.into_data()) {
            Ok(user) => {
                self.store_user(&user);
                ActionResult::ok(user)
            }
            Err(e) => {
                error!("Get current user error: {}", e);
                self.logout().await;
                ActionResult::from_error(&e, FETCH_USER_FAILED)
            }
        }
    }

    /// Update the profile and store the result
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ActionResult<User> {
        match self.api.update_profile(update).await.and_then(|e| e.into_data()) {
            Ok(user) => {
                self.store_user(&user);
                ActionResult::ok(user)
            }
            Err(e) => ActionResult::from_error(&e, UPDATE_FAILED),
        }
    }

    /// Change the password
    pub async fn change_password(&self, change: &PasswordChange) -> ActionResult {
        match self.api.change_password(change).await {
            Ok(_) => ActionResult::done(),
            Err(e) => ActionResult::from_error(&e, PASSWORD_FAILED),
        }
    }

    fn store_user(&self, user: &User) {
        write_json(self.storage(), USER_KEY, user);
        self.state().session.set_user(Some(user.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: 1,
            username: "u".into(),
            email: None,
            role,
            name: None,
            avatar: None,
            is_active: None,
            created_at: None,
        }
    }

    fn account(role: Option<Role>) -> AccountUser {
        AccountUser {
            name: "王五".into(),
            account_id: "2023001".into(),
            avatar_url: None,
            bio: None,
            role,
            token: None,
            user: None,
            first_login_time: None,
        }
    }

    #[test]
    fn test_account_role_takes_precedence() {
        let session = Session::new(
            Some(account(Some(Role::Admin))),
            Some(user(Role::Organizer)),
            None,
        );
        assert_eq!(session.effective_role(), Some(Role::Admin));
    }

    #[test]
    fn test_profile_role_is_fallback() {
        let session = Session::new(Some(account(None)), Some(user(Role::Organizer)), None);
        assert_eq!(session.effective_role(), Some(Role::Organizer));

        let mut session = Session::default();
        assert_eq!(session.effective_role(), None);
        session.set_user(Some(user(Role::Student)));
        assert_eq!(session.effective_role(), Some(Role::Student));
    }

    #[test]
    fn test_profile_without_token_is_not_logged_in() {
        let session = Session::new(None, Some(user(Role::Student)), None);
        assert!(!session.is_logged_in());

        let session = Session::new(None, Some(user(Role::Student)), Some("t".into()));
        assert!(session.is_logged_in());

        assert!(Session::new(Some(account(None)), None, None).is_logged_in());
    }
}
