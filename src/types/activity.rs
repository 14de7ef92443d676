//! Activity types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Academic,
    Cultural,
    Sports,
    Volunteer,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

/// Selectable sub-item of an activity (e.g. a doubles category)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySubItem {
    pub name: String,
    pub max_participants: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_participants: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub status: ActivityStatus,
    pub organizer_id: i64,
    #[serde(default)]
    pub organizer_name: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub max_participants: u32,
    #[serde(default)]
    pub current_participants: u32,
    pub registration_deadline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_items: Option<Vec<ActivitySubItem>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Activity {
    /// Places left; the backend keeps `current <= max`, this only mirrors it
    pub fn remaining_slots(&self) -> u32 {
        self.max_participants
            .saturating_sub(self.current_participants)
    }

    /// Whether every seat is taken
    pub fn is_full(&self) -> bool {
        self.remaining_slots() == 0
    }
}

/// POST /activities body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityForm {
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub max_participants: u32,
    pub registration_deadline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_items: Option<Vec<ActivitySubItem>>,
}

/// PUT /activities/{id} body; a partial `ActivityForm`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ActivityCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_items: Option<Vec<ActivitySubItem>>,
}

/// Persisted list filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ActivityCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ActivityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl ActivityFilter {
    /// Overlay the populated fields of `other` onto `self`
    pub fn merge(&mut self, other: ActivityFilter) {
        if other.category.is_some() {
            self.category = other.category;
        }
        if other.status.is_some() {
            self.status = other.status;
        }
        if other.organizer_id.is_some() {
            self.organizer_id = other.organizer_id;
        }
        if other.start_date.is_some() {
            self.start_date = other.start_date;
        }
        if other.end_date.is_some() {
            self.end_date = other.end_date;
        }
        if other.keyword.is_some() {
            self.keyword = other.keyword;
        }
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// GET /activities query: filter fields plus page selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    #[serde(flatten)]
    pub filter: ActivityFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl ActivityQuery {
    /// Query for one page
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Set the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set the filter
    pub fn with_filter(mut self, filter: ActivityFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(max: u32, current: u32) -> Activity {
        serde_json::from_value(json!({
            "id": 1,
            "title": "校园马拉松",
            "description": "5公里",
            "category": "sports",
            "status": "upcoming",
            "organizerId": 3,
            "organizerName": "体育部",
            "startTime": "2025-05-01T08:00:00Z",
            "endTime": "2025-05-01T11:00:00Z",
            "location": "东操场",
            "maxParticipants": max,
            "currentParticipants": current,
            "registrationDeadline": "2025-04-28T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_capacity_helpers() {
        assert_eq!(activity(50, 12).remaining_slots(), 38);
        assert!(!activity(50, 12).is_full());
        assert!(activity(50, 50).is_full());
        // Stale copies may overshoot; never underflow
        assert_eq!(activity(10, 11).remaining_slots(), 0);
    }

    #[test]
    fn test_filter_merge_keeps_unset_fields() {
        let mut filter = ActivityFilter {
            category: Some(ActivityCategory::Sports),
            keyword: Some("篮球".into()),
            ..Default::default()
        };
        filter.merge(ActivityFilter {
            status: Some(ActivityStatus::Ongoing),
            keyword: Some("足球".into()),
            ..Default::default()
        });

        assert_eq!(filter.category, Some(ActivityCategory::Sports));
        assert_eq!(filter.status, Some(ActivityStatus::Ongoing));
        assert_eq!(filter.keyword.as_deref(), Some("足球"));
    }

    #[test]
    fn test_query_serializes_flat() {
        let query = ActivityQuery::page(2)
            .with_page_size(10)
            .with_filter(ActivityFilter {
                category: Some(ActivityCategory::Volunteer),
                ..Default::default()
            });
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({ "category": "volunteer", "page": 2, "pageSize": 10 })
        );
    }
}
