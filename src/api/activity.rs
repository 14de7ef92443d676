//! Activity endpoints

use serde_json::Value;

use crate::error::Result;
use crate::fetch::Fetch;
use crate::http::{Download, HttpClient};
use crate::types::{
    Activity, ActivityForm, ActivityQuery, ActivityUpdate, Envelope, PageParams, Paginated,
};

/// Client for `/activities`
#[derive(Debug, Clone)]
pub struct ActivityApi {
    http: HttpClient,
}

impl ActivityApi {
    /// Create a new activity API
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Paginated list filtered by category, status, organizer, date range and keyword
    pub async fn get_activities(&self, params: &ActivityQuery) -> Result<Envelope<Paginated<Activity>>> {
        self.http.send(Fetch::get("/activities").query(params)?).await
    }

    /// A single activity by id
    pub async fn get_activity_by_id(&self, id: i64) -> Result<Envelope<Activity>> {
        self.http.send(Fetch::get(format!("/activities/{}", id))).await
    }

    /// Organizer only
    pub async fn create_activity(&self, form: &ActivityForm) -> Result<Envelope<Activity>> {
        self.http.send(Fetch::post("/activities").json(form)?).await
    }

    /// Organizer only; only the populated fields of `update` are sent
    pub async fn update_activity(&self, id: i64, update: &ActivityUpdate) -> Result<Envelope<Activity>> {
        self.http
            .send(Fetch::put(format!("/activities/{}", id)).json(update)?)
            .await
    }

    /// Organizer only
    pub async fn delete_activity(&self, id: i64) -> Result<Envelope<Value>> {
        self.http.send(Fetch::delete(format!("/activities/{}", id))).await
    }

    /// Activities created by the logged-in organizer
    pub async fn get_my_activities(&self, page: Option<PageParams>) -> Result<Envelope<Paginated<Activity>>> {
        self.http
            .send(Fetch::get("/activities/my").query(&page)?)
            .await
    }

    /// Category names known to the backend
    pub async fn get_categories(&self) -> Result<Envelope<Vec<String>>> {
        self.http.send(Fetch::get("/activities/categories")).await
    }

    /// Admin only; the backend refuses ongoing activities
    pub async fn admin_delete_activity(&self, id: i64) -> Result<Envelope<Value>> {
        self.http
            .send(Fetch::delete(format!("/activities/admin/{}", id)))
            .await
    }

    /// Admin only; spreadsheet of every activity
    pub async fn admin_export_activities(&self) -> Result<Download> {
        self.http
            .download(Fetch::get("/activities/admin/export"))
            .await
    }
}
