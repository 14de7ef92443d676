//! Activity list, detail and filter state

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ActionResult, Loading};
use crate::api::ActivityApi;
use crate::http::HttpClient;
use crate::types::{Activity, ActivityFilter, ActivityForm, ActivityQuery, ActivityUpdate};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Page selection reported by the last list fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total: 0,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            total_pages: 0,
        }
    }
}

#[derive(Debug, Default)]
struct ActivityState {
    activities: Vec<Activity>,
    current: Option<Activity>,
    pagination: Pagination,
    filter: ActivityFilter,
}

/// Caches the activity list and the activity being viewed
pub struct ActivityStore {
    api: ActivityApi,
    state: RwLock<ActivityState>,
    loading: AtomicBool,
}

impl ActivityStore {
    /// Create a new activity store
    pub fn new(http: HttpClient) -> Self {
        Self {
            api: ActivityApi::new(http),
            state: RwLock::new(ActivityState::default()),
            loading: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ActivityState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ActivityState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Activities of the last fetched page
    pub fn activities(&self) -> Vec<Activity> {
        self.read().activities.clone()
    }

    /// Activity loaded by `fetch_activity_by_id`
    pub fn current_activity(&self) -> Option<Activity> {
        self.read().current.clone()
    }

    /// Pagination of the last fetched page
    pub fn pagination(&self) -> Pagination {
        self.read().pagination
    }

    /// The stored filter
    pub fn filter(&self) -> ActivityFilter {
        self.read().filter.clone()
    }

    /// Whether an action is in flight
    pub fn loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Query sent by `fetch_activities`.
    ///
    /// Call-site fields win over the stored page selection, which wins over
    /// the stored filter. A zero page or page size counts as unset.
    pub fn effective_query(&self, params: Option<&ActivityQuery>) -> ActivityQuery {
        let state = self.read();
        let mut filter = state.filter.clone();
        let (mut page, mut page_size) = (state.pagination.page, state.pagination.page_size);

        if let Some(params) = params {
            filter.merge(params.filter.clone());
            if let Some(p) = params.page.filter(|p| *p > 0) {
                page = p;
            }
            if let Some(size) = params.page_size.filter(|s| *s > 0) {
                page_size = size;
            }
        }

        ActivityQuery {
            filter,
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Load a page of activities into the store
    pub async fn fetch_activities(&self, params: Option<ActivityQuery>) -> ActionResult {
        let _loading = Loading::start(&self.loading);
        let query = self.effective_query(params.as_ref());
        debug!("Fetching activities with {:?}", query);

        match self.api.get_activities(&query).await.and_then(|e| e.into_data()) {
            Ok(page) => {
                let mut state = self.write();
                state.pagination = Pagination {
                    total: page.total,
                    page: page.page,
                    page_size: page.page_size,
                    total_pages: page.total_pages,
                };
                state.activities = page.items;
                ActionResult::done()
            }
            Err(e) => ActionResult::from_error(&e, "获取活动列表失败"),
        }
    }

    /// Load one activity as the current one
    pub async fn fetch_activity_by_id(&self, id: i64) -> ActionResult<Activity> {
        let _loading = Loading::start(&self.loading);
        match self.api.get_activity_by_id(id).await.and_then(|e| e.into_data()) {
            Ok(activity) => {
                self.write().current = Some(activity.clone());
                ActionResult::ok(activity)
            }
            Err(e) => ActionResult::from_error(&e, "获取活动详情失败"),
        }
    }

    /// Create an activity
    pub async fn create_activity(&self, form: &ActivityForm) -> ActionResult<Activity> {
        let _loading = Loading::start(&self.loading);
        match self.api.create_activity(form).await.and_then(|e| e.into_data()) {
            Ok(activity) => ActionResult::ok(activity),
            Err(e) => ActionResult::from_error(&e, "创建活动失败"),
        }
    }

    /// Update an activity
    pub async fn update_activity(&self, id: i64, update: &ActivityUpdate) -> ActionResult<Activity> {
        let _loading = Loading::start(&self.loading);
        match self.api.update_activity(id, update).await.and_then(|e| e.into_data()) {
            Ok(activity) => ActionResult::ok(activity),
            Err(e) => ActionResult::from_error(&e, "更新活动失败"),
        }
    }

    /// Delete remotely, then drop the item from the cached list.
    ///
    /// Pagination totals are left as they are until the next fetch.
    pub async fn delete_activity(&self, id: i64) -> ActionResult {
        let _loading = Loading::start(&self.loading);
        match self.api.delete_activity(id).await {
            Ok(_) => {
                self.write().activities.retain(|activity| activity.id != id);
                ActionResult::done()
            }
            Err(e) => ActionResult::from_error(&e, "删除活动失败"),
        }
    }

    /// Overlay the populated fields of `filter` onto the stored filter
    pub fn set_filter(&self, filter: ActivityFilter) {
        self.write().filter.merge(filter);
    }

    /// Drop every filter field
    pub fn clear_filter(&self) {
        self.write().filter = ActivityFilter::default();
    }

    /// Back to the initial state
    pub fn reset(&self) {
        *self.write() = ActivityState::default();
    }
}
