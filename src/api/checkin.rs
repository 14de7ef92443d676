//! Check-in endpoints

use crate::error::Result;
use crate::fetch::Fetch;
use crate::http::HttpClient;
use crate::types::{
    CheckIn, CheckInCode, CheckInStats, CodeCheckInRequest, EndCheckInResult, Envelope,
    QrCheckInRequest, QrCodeData, DEFAULT_CODE_DURATION,
};

/// Client for `/checkin`
#[derive(Debug, Clone)]
pub struct CheckinApi {
    http: HttpClient,
}

impl CheckinApi {
    /// Create a new check-in API
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Check in with a scanned QR payload
    pub async fn check_in_with_qr_code(&self, request: &QrCheckInRequest) -> Result<Envelope<CheckIn>> {
        self.http.send(Fetch::post("/checkin/qrcode").json(request)?).await
    }

    /// Check in with a numeric code
    pub async fn check_in_with_code(&self, request: &CodeCheckInRequest) -> Result<Envelope<CheckIn>> {
        self.http.send(Fetch::post("/checkin/code").json(request)?).await
    }

    /// Organizer only
    pub async fn generate_qr_code(&self, activity_id: i64) -> Result<Envelope<QrCodeData>> {
        self.http
            .send(Fetch::post(format!("/checkin/generate-qr/{}", activity_id)))
            .await
    }

    /// Organizer only; `duration` is in minutes and defaults to 15
    pub async fn generate_code(
        &self,
        activity_id: i64,
        duration: Option<u32>,
    ) -> Result<Envelope<CheckInCode>> {
        let body = serde_json::json!({ "duration": duration.unwrap_or(DEFAULT_CODE_DURATION) });
        self.http
            .send(Fetch::post(format!("/checkin/generate-code/{}", activity_id)).json(&body)?)
            .await
    }

    /// Organizer only
    pub async fn get_activity_check_ins(&self, activity_id: i64) -> Result<Envelope<Vec<CheckIn>>> {
        self.http
            .send(Fetch::get(format!("/checkin/activity/{}", activity_id)))
            .await
    }

    /// Check-in counts for an activity
    pub async fn get_check_in_stats(&self, activity_id: i64) -> Result<Envelope<CheckInStats>> {
        self.http
            .send(Fetch::get(format!("/checkin/stats/{}", activity_id)))
            .await
    }

    /// Student only
    pub async fn get_my_recent_check_ins(&self) -> Result<Envelope<Vec<CheckIn>>> {
        self.http.send(Fetch::get("/checkin/my-recent")).await
    }

    /// Organizer only; expires every live code of the activity
    pub async fn end_check_in(&self, activity_id: i64) -> Result<Envelope<EndCheckInResult>> {
        self.http
            .send(Fetch::post(format!("/checkin/end-checkin/{}", activity_id)))
            .await
    }
}
