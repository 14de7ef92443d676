//! Check-in types and expiry handling

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default lifetime of a generated check-in code, in minutes
pub const DEFAULT_CODE_DURATION: u32 = 15;

/// Lifetimes the backend accepts, in minutes
pub const MIN_CODE_DURATION: u32 = 5;
pub const MAX_CODE_DURATION: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInMethod {
    Qrcode,
    Code,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: i64,
    pub activity_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_title: Option<String>,
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub checked_in_at: String,
    pub method: CheckInMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInCode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub activity_id: i64,
    pub code: String,
    pub expires_at: String,
    pub created_at: String,
}

impl CheckInCode {
    /// Expiry as UTC
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_utc(&self.expires_at)
    }
}

/// POST /checkin/qrcode body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCheckInRequest {
    pub activity_id: i64,
    pub qr_data: String,
}

/// POST /checkin/code body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeCheckInRequest {
    pub activity_id: i64,
    pub code: String,
}

/// POST /checkin/generate-qr/{activityId} payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeData {
    pub qr_data: String,
}

/// GET /checkin/stats/{activityId} payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStats {
    pub total: u64,
    pub checked_in: u64,
    pub rate: f64,
}

/// POST /checkin/end-checkin/{activityId} payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndCheckInResult {
    pub updated_count: u64,
}

/// The code an organizer is currently displaying, kept across restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCheckInCode {
    pub activity_id: i64,
    pub activity_title: String,
    pub code: String,
    pub expires_at: String,
    pub started_at: String,
}

impl ActiveCheckInCode {
    /// Build from a freshly generated code
    pub fn from_code(code: &CheckInCode, activity_title: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            activity_id: code.activity_id,
            activity_title: activity_title.to_string(),
            code: code.code.clone(),
            expires_at: code.expires_at.clone(),
            started_at: started_at.to_rfc3339(),
        }
    }

    /// Expiry as UTC
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_utc(&self.expires_at)
    }

    /// Expired when `expires_at <= now`. An unparsable expiry counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_utc().map_or(true, |expires| expires <= now)
    }
}

/// Parse a backend timestamp as UTC.
///
/// Timestamps without a zone designator are taken to be UTC, as if a `Z`
/// had been appended.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
