//! Authentication, profile and organizer-management endpoints

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::fetch::Fetch;
use crate::http::HttpClient;
use crate::types::{
    AccountUser, AdminCredentials, CreateOrganizerForm, Envelope, LoginForm, PasswordChange,
    ProfileUpdate, RegisterForm, RegisterResult, User,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrganizerAction<'a> {
    #[serde(flatten)]
    admin: &'a AdminCredentials,
    organizer_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_password: Option<&'a str>,
}

/// Client for `/auth`
#[derive(Debug, Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    /// Create a new auth API
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Log in with an account id and password
    pub async fn login(&self, form: &LoginForm) -> Result<Envelope<AccountUser>> {
        self.http.send(Fetch::post("/auth/login").json(form)?).await
    }

    /// Create an account
    pub async fn register(&self, form: &RegisterForm) -> Result<Envelope<RegisterResult>> {
        self.http.send(Fetch::post("/auth/register").json(form)?).await
    }

    /// Profile of the logged-in user
    pub async fn get_current_user(&self) -> Result<Envelope<User>> {
        self.http.send(Fetch::get("/auth/me")).await
    }

    /// End the session on the backend
    pub async fn logout(&self) -> Result<Envelope<Value>> {
        self.http.send(Fetch::post("/auth/logout")).await
    }

    /// Update the logged-in user's profile
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Envelope<User>> {
        self.http.send(Fetch::put("/auth/profile").json(update)?).await
    }

    /// Change the logged-in user's password
    pub async fn change_password(&self, change: &PasswordChange) -> Result<Envelope<Value>> {
        self.http.send(Fetch::put("/auth/password").json(change)?).await
    }

    /// Admin only
    pub async fn create_organizer(&self, form: &CreateOrganizerForm) -> Result<Envelope<Value>> {
        self.http
            .send(Fetch::post("/auth/admin/create-organizer").json(form)?)
            .await
    }

    /// Admin only; credentials travel as query parameters
    pub async fn list_organizers(&self, admin: &AdminCredentials) -> Result<Envelope<Vec<User>>> {
        self.http
            .send(Fetch::get("/auth/admin/organizers").query(admin)?)
            .await
    }

    /// Admin only; enable or disable an organizer account
    pub async fn toggle_organizer_status(
        &self,
        admin: &AdminCredentials,
        organizer_id: i64,
    ) -> Result<Envelope<User>> {
        let body = OrganizerAction {
            admin,
            organizer_id,
            new_password: None,
        };
        self.http
            .send(Fetch::post("/auth/admin/toggle-organizer-status").json(&body)?)
            .await
    }

    /// Admin only
    pub async fn change_organizer_password(
        &self,
        admin: &AdminCredentials,
        organizer_id: i64,
        new_password: &str,
    ) -> Result<Envelope<User>> {
        let body = OrganizerAction {
            admin,
            organizer_id,
            new_password: Some(new_password),
        };
        self.http
            .send(Fetch::post("/auth/admin/change-organizer-password").json(&body)?)
            .await
    }

    /// Admin only; soft delete
    pub async fn delete_organizer(
        &self,
        admin: &AdminCredentials,
        organizer_id: i64,
    ) -> Result<Envelope<Value>> {
        let body = OrganizerAction {
            admin,
            organizer_id,
            new_password: None,
        };
        self.http
            .send(Fetch::post("/auth/admin/delete-organizer").json(&body)?)
            .await
    }
}
