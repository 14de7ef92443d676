//! Registration endpoints

use serde_json::Value;

use crate::error::Result;
use crate::fetch::Fetch;
use crate::http::HttpClient;
use crate::types::{Envelope, PageParams, Paginated, RegisterRequest, Registration, RegistrationState};

/// Client for `/registrations`
#[derive(Debug, Clone)]
pub struct RegistrationApi {
    http: HttpClient,
}

impl RegistrationApi {
    /// Create a new registration API
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Register for an activity, optionally choosing one of its sub-items
    pub async fn register(&self, activity_id: i64, sub_item: Option<&str>) -> Result<Envelope<Registration>> {
        let body = RegisterRequest {
            sub_item: sub_item.map(str::to_string),
        };
        self.http
            .send(Fetch::post(format!("/registrations/{}", activity_id)).json(&body)?)
            .await
    }

    /// Withdraw the current user's registration
    pub async fn cancel_registration(&self, activity_id: i64) -> Result<Envelope<Value>> {
        self.http
            .send(Fetch::delete(format!("/registrations/{}", activity_id)))
            .await
    }

    /// Registrations of the current user
    pub async fn get_my_registrations(&self, page: Option<PageParams>) -> Result<Envelope<Paginated<Registration>>> {
        self.http
            .send(Fetch::get("/registrations/my").query(&page)?)
            .await
    }

    /// Organizer only
    pub async fn get_activity_registrations(
        &self,
        activity_id: i64,
        page: Option<PageParams>,
    ) -> Result<Envelope<Paginated<Registration>>> {
        self.http
            .send(Fetch::get(format!("/registrations/activity/{}", activity_id)).query(&page)?)
            .await
    }

    /// Whether the current user is registered for an activity
    pub async fn check_registration_status(&self, activity_id: i64) -> Result<Envelope<RegistrationState>> {
        self.http
            .send(Fetch::get(format!("/registrations/status/{}", activity_id)))
            .await
    }
}
