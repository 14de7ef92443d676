//! Statistics endpoints

use crate::error::Result;
use crate::fetch::Fetch;
use crate::http::{Download, HttpClient};
use crate::types::{ActivityStatistics, Envelope, OrganizerStatistics, TrendPoint, TrendQuery};

/// Client for `/statistics`
#[derive(Debug, Clone)]
pub struct StatisticsApi {
    http: HttpClient,
}

impl StatisticsApi {
    /// Create a new statistics API
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Organizer of the activity only
    pub async fn get_activity_statistics(&self, activity_id: i64) -> Result<Envelope<ActivityStatistics>> {
        self.http
            .send(Fetch::get(format!("/statistics/activity/{}", activity_id)))
            .await
    }

    /// Totals across the organizer's activities
    pub async fn get_organizer_statistics(&self) -> Result<Envelope<OrganizerStatistics>> {
        self.http.send(Fetch::get("/statistics/organizer")).await
    }

    /// Spreadsheet export of one activity
    pub async fn export_statistics(&self, activity_id: i64) -> Result<Download> {
        self.http
            .download(Fetch::get(format!("/statistics/export/{}", activity_id)))
            .await
    }

    /// Daily registration counts
    pub async fn get_registration_trend(&self, query: &TrendQuery) -> Result<Envelope<Vec<TrendPoint>>> {
        self.http
            .send(Fetch::get("/statistics/trend").query(query)?)
            .await
    }
}
