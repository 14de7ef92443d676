//! The organizer's live check-in code and its floating countdown

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::persist::{read_json, write_json, SessionStorage, ACTIVE_CHECK_IN_CODE_KEY};
use crate::types::{ActiveCheckInCode, CheckInCode};

#[derive(Debug, Default)]
struct CheckinState {
    active: Option<ActiveCheckInCode>,
    show_floating_window: bool,
}

/// Keeps the active check-in code in memory and in persistent storage
pub struct CheckinStore {
    storage: Arc<dyn SessionStorage>,
    state: Mutex<CheckinState>,
}

impl CheckinStore {
    /// Create a new check-in store
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            state: Mutex::new(CheckinState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CheckinState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The active code, if any
    pub fn active_check_in_code(&self) -> Option<ActiveCheckInCode> {
        self.state().active.clone()
    }

    /// Whether the countdown window is shown
    pub fn show_floating_window(&self) -> bool {
        self.state().show_floating_window
    }

    /// Replace the active code. Setting a code shows the floating window and
    /// persists it; clearing removes the persisted copy.
    pub fn set_active_check_in_code(&self, code: Option<ActiveCheckInCode>) {
        let mut state = self.state();
        match &code {
            Some(active) => {
                state.show_floating_window = true;
                write_json(self.storage.as_ref(), ACTIVE_CHECK_IN_CODE_KEY, active);
            }
            None => self.storage.remove(ACTIVE_CHECK_IN_CODE_KEY),
        }
        state.active = code;
    }

    /// Make a freshly generated code the active one
    pub fn activate(&self, code: &CheckInCode, activity_title: &str) -> ActiveCheckInCode {
        let active = ActiveCheckInCode::from_code(code, activity_title, Utc::now());
        info!(
            "Check-in code active for activity {} until {}",
            active.activity_id, active.expires_at
        );
        self.set_active_check_in_code(Some(active.clone()));
        active
    }

    /// Reload the persisted code. Expired or malformed codes are dropped silently.
    pub fn restore_check_in_code(&self) {
        self.restore_check_in_code_at(Utc::now());
    }

    /// `restore_check_in_code` against a given clock
    pub fn restore_check_in_code_at(&self, now: DateTime<Utc>) {
        let Some(active) =
            read_json::<ActiveCheckInCode>(self.storage.as_ref(), ACTIVE_CHECK_IN_CODE_KEY)
        else {
            return;
        };

        let mut state = self.state();
        if active.is_expired_at(now) {
            debug!("Discarding expired check-in code for activity {}", active.activity_id);
            self.storage.remove(ACTIVE_CHECK_IN_CODE_KEY);
            state.active = None;
            state.show_floating_window = false;
            return;
        }

        state.active = Some(active);
        state.show_floating_window = true;
    }

    /// Drop the active code everywhere
    pub fn clear_check_in_code(&self) {
        let mut state = self.state();
        state.active = None;
        state.show_floating_window = false;
        self.storage.remove(ACTIVE_CHECK_IN_CODE_KEY);
    }

    /// Show or hide the countdown window
    pub fn toggle_floating_window(&self) {
        let mut state = self.state();
        state.show_floating_window = !state.show_floating_window;
    }

    /// True when there is no active code or it has run out
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// `is_expired` against a given clock
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.state()
            .active
            .as_ref()
            .map_or(true, |active| active.is_expired_at(now))
    }

    /// Time left on the active code; zero once expired
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Utc::now())
    }

    /// `remaining` against a given clock
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.state()
            .active
            .as_ref()
            .and_then(ActiveCheckInCode::expires_at_utc)
            .map_or(Duration::zero(), |expires| {
                (expires - now).max(Duration::zero())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStorage;
    use chrono::TimeZone;

    fn code(expires_at: &str) -> ActiveCheckInCode {
        ActiveCheckInCode {
            activity_id: 12,
            activity_title: "志愿者培训".into(),
            code: "305118".into(),
            expires_at: expires_at.into(),
            started_at: "2025-06-01T09:00:00Z".into(),
        }
    }

    #[test]
    fn test_is_expired_without_code() {
        let store = CheckinStore::new(Arc::new(MemoryStorage::new()));
        assert!(store.is_expired());
        assert_eq!(store.remaining(), Duration::zero());
    }

    #[test]
    fn test_remaining_counts_down() {
        let store = CheckinStore::new(Arc::new(MemoryStorage::new()));
        store.set_active_check_in_code(Some(code("2025-06-01T09:15:00")));

        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 10, 0).unwrap();
        assert!(!store.is_expired_at(now));
        assert_eq!(store.remaining_at(now), Duration::minutes(5));

        let later = Utc.with_ymd_and_hms(2025, 6, 1, 9, 20, 0).unwrap();
        assert!(store.is_expired_at(later));
        assert_eq!(store.remaining_at(later), Duration::zero());
    }

    #[test]
    fn test_set_and_clear_mirror_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CheckinStore::new(storage.clone());

        store.set_active_check_in_code(Some(code("2099-01-01T00:00:00Z")));
        assert!(store.show_floating_window());
        assert!(storage.contains(ACTIVE_CHECK_IN_CODE_KEY));

        store.toggle_floating_window();
        assert!(!store.show_floating_window());

        store.clear_check_in_code();
        assert!(store.active_check_in_code().is_none());
        assert!(!storage.contains(ACTIVE_CHECK_IN_CODE_KEY));
    }

    #[test]
    fn test_restore_keeps_live_code() {
        let storage = Arc::new(MemoryStorage::new());
        write_json(&*storage, ACTIVE_CHECK_IN_CODE_KEY, &code("2025-06-01T09:15:00"));

        let store = CheckinStore::new(storage.clone());
        store.restore_check_in_code_at(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        assert_eq!(store.active_check_in_code(), Some(code("2025-06-01T09:15:00")));
        assert!(store.show_floating_window());
    }

    #[test]
    fn test_restore_of_expired_code_clears_memory() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CheckinStore::new(storage.clone());
        store.set_active_check_in_code(Some(code("2025-06-01T09:15:00")));
        assert!(store.show_floating_window());

        store.restore_check_in_code_at(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap());
        assert!(store.active_check_in_code().is_none());
        assert!(!store.show_floating_window());
        assert!(!storage.contains(ACTIVE_CHECK_IN_CODE_KEY));
    }

    #[test]
    fn test_restore_drops_corrupt_blob() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ACTIVE_CHECK_IN_CODE_KEY, "{\"code\":");

        let store = CheckinStore::new(storage.clone());
        store.restore_check_in_code();
        assert!(store.active_check_in_code().is_none());
        assert!(!store.show_floating_window());
        assert!(!storage.contains(ACTIVE_CHECK_IN_CODE_KEY));
    }
}
