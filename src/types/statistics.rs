//! Statistics types

use serde::{Deserialize, Serialize};

use super::{Activity, ActivityCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: ActivityCategory,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStatistics {
    pub activity_id: i64,
    pub activity_title: String,
    pub total_registrations: u64,
    pub total_check_ins: u64,
    pub check_in_rate: f64,
    #[serde(default)]
    pub registration_trend: Vec<TrendPoint>,
    #[serde(default)]
    pub category_distribution: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerStatistics {
    pub total_activities: u64,
    pub total_registrations: u64,
    pub total_check_ins: u64,
    pub average_check_in_rate: f64,
    #[serde(default)]
    pub recent_activities: Vec<Activity>,
}

/// GET /statistics/trend query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendQuery {
    pub start_date: String,
    pub end_date: String,
}
