//! Route table and navigation guard
//!
//! The table maps URL paths to views with per-route access metadata. Every
//! navigation runs `Router::before_each`, which can redirect before the target
//! view is shown. Guards keep no state between navigations.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use url::form_urlencoded;

use crate::store::AuthStore;
use crate::types::Role;

pub const LOGIN_PATH: &str = "/login";

/// Where authenticated users land by default
pub const DEFAULT_PATH: &str = "/activities";

/// Route redirects and guard redirects followed before giving up
const MAX_REDIRECTS: usize = 8;

/// Path plus ordered query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    /// A location without query
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            query: Vec::new(),
        }
    }

    /// Parse `/path?key=value` (query values are form-decoded)
    pub fn parse(full_path: &str) -> Self {
        match full_path.split_once('?') {
            Some((path, query)) => Self {
                path: path.to_string(),
                query: form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
            },
            None => Self::new(full_path),
        }
    }

    /// The login view with `redirect` set to `original`
    pub fn login_with_redirect(original: &str) -> Self {
        Self::new(LOGIN_PATH).with_query("redirect", original)
    }

    /// Append a query pair
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// First value of a query key
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path with the encoded query string appended
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

/// Access requirements attached to a route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_guest: bool,
    pub role: Option<Role>,
}

impl RouteMeta {
    const PUBLIC: RouteMeta = RouteMeta {
        requires_auth: false,
        requires_guest: false,
        role: None,
    };
    const GUEST: RouteMeta = RouteMeta {
        requires_auth: false,
        requires_guest: true,
        role: None,
    };
    const AUTHENTICATED: RouteMeta = RouteMeta {
        requires_auth: true,
        requires_guest: false,
        role: None,
    };

    const fn role(role: Role) -> RouteMeta {
        RouteMeta {
            requires_auth: true,
            requires_guest: false,
            role: Some(role),
        }
    }
}

/// One entry of the route table. `:name` segments capture parameters and a
/// pattern of `*` matches anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub pattern: &'static str,
    pub name: Option<&'static str>,
    pub redirect: Option<&'static str>,
    pub meta: RouteMeta,
}

const fn view(pattern: &'static str, name: &'static str, meta: RouteMeta) -> RouteRecord {
    RouteRecord {
        pattern,
        name: Some(name),
        redirect: None,
        meta,
    }
}

const fn redirect(pattern: &'static str, to: &'static str) -> RouteRecord {
    RouteRecord {
        pattern,
        name: None,
        redirect: Some(to),
        meta: RouteMeta::PUBLIC,
    }
}

/// The application's route table, matched in order
pub const ROUTES: &[RouteRecord] = &[
    redirect("/", DEFAULT_PATH),
    view(LOGIN_PATH, "Login", RouteMeta::GUEST),
    view(
        "/admin/manage-organizers",
        "ManageOrganizers",
        RouteMeta::role(Role::Admin),
    ),
    view(DEFAULT_PATH, "Activities", RouteMeta::PUBLIC),
    view("/activities/:id", "ActivityDetail", RouteMeta::PUBLIC),
    view("/my-activities", "MyActivities", RouteMeta::role(Role::Student)),
    view("/checkin", "CheckIn", RouteMeta::role(Role::Student)),
    view("/checkin-code", "CheckInCode", RouteMeta::role(Role::Student)),
    redirect("/organizer", "/organizer/dashboard"),
    view(
        "/organizer/dashboard",
        "OrganizerDashboard",
        RouteMeta::role(Role::Organizer),
    ),
    view(
        "/organizer/activities",
        "OrganizerActivities",
        RouteMeta::role(Role::Organizer),
    ),
    view(
        "/organizer/activities/create",
        "CreateActivity",
        RouteMeta::role(Role::Organizer),
    ),
    view(
        "/organizer/activities/:id/edit",
        "EditActivity",
        RouteMeta::role(Role::Organizer),
    ),
    view(
        "/organizer/activities/:id/checkin",
        "CheckInManagement",
        RouteMeta::role(Role::Organizer),
    ),
    view(
        "/organizer/activities/:id/statistics",
        "ActivityStatistics",
        RouteMeta::role(Role::Organizer),
    ),
    view("/profile", "Profile", RouteMeta::AUTHENTICATED),
    view("*", "NotFound", RouteMeta::PUBLIC),
];

/// A route record matched against a concrete path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub record: RouteRecord,
    pub params: BTreeMap<String, String>,
}

/// Outcome of the pre-navigation guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Allow,
    Redirect(Location),
}

/// Keeps track of the current location
pub trait Navigator: Send + Sync {
    fn current(&self) -> Location;

    /// Add an entry on top of the history
    fn push(&self, to: Location);

    /// Overwrite the current entry
    fn replace(&self, to: Location);
}

/// In-memory navigation history
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<Location>>,
}

impl History {
    /// History starting at `initial`
    pub fn new(initial: Location) -> Self {
        Self {
            entries: Mutex::new(vec![initial]),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Location>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop the current entry; the first entry is never removed
    pub fn back(&self) -> Location {
        let mut entries = self.entries();
        if entries.len() > 1 {
            entries.pop();
        }
        entries.last().cloned().unwrap_or_else(|| Location::new("/"))
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Location::new("/"))
    }
}

impl Navigator for History {
    fn current(&self) -> Location {
        self.entries()
            .last()
            .cloned()
            .unwrap_or_else(|| Location::new("/"))
    }

    fn push(&self, to: Location) {
        self.entries().push(to);
    }

    fn replace(&self, to: Location) {
        let mut entries = self.entries();
        match entries.last_mut() {
            Some(last) => *last = to,
            None => entries.push(to),
        }
    }
}

/// Static path table plus the global guard
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<RouteRecord>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Router over the application route table
    pub fn new() -> Self {
        Self::with_routes(ROUTES.to_vec())
    }

    /// Router over a custom table
    pub fn with_routes(routes: Vec<RouteRecord>) -> Self {
        Self { routes }
    }

    /// The route table
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// First record whose pattern matches `path`
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        self.routes.iter().find_map(|record| {
            match_pattern(record.pattern, path).map(|params| ResolvedRoute {
                record: record.clone(),
                params,
            })
        })
    }

    /// Path of the route called `name`
    pub fn path_of(&self, name: &str) -> Option<&'static str> {
        self.routes
            .iter()
            .find(|record| record.name == Some(name))
            .map(|record| record.pattern)
    }

    /// The global pre-navigation guard
    pub fn before_each(&self, to: &Location, meta: &RouteMeta, auth: &AuthStore) -> Guard {
        auth.hydrate_if_needed();
        let logged_in = auth.is_logged_in();

        if meta.requires_auth && !logged_in {
            return Guard::Redirect(Location::login_with_redirect(&to.full_path()));
        }

        if meta.requires_guest && logged_in {
            return Guard::Redirect(Location::new(DEFAULT_PATH));
        }

        if let Some(required) = meta.role {
            if auth.effective_role() != Some(required) {
                return Guard::Redirect(Location::new(DEFAULT_PATH));
            }
        }

        Guard::Allow
    }

    /// Resolve `to`, follow route and guard redirects, and push the final
    /// location onto `navigator`. Returns where navigation ended.
    pub fn navigate(&self, navigator: &dyn Navigator, to: Location, auth: &AuthStore) -> Location {
        let mut target = to;

        for _ in 0..MAX_REDIRECTS {
            let Some(resolved) = self.resolve(&target.path) else {
                warn!("No route matches {}", target.path);
                navigator.push(target.clone());
                return target;
            };

            if let Some(redirect) = resolved.record.redirect {
                debug!("Route {} redirects to {}", target.path, redirect);
                target = Location {
                    path: redirect.to_string(),
                    query: target.query,
                };
                continue;
            }

            match self.before_each(&target, &resolved.record.meta, auth) {
                Guard::Allow => {
                    navigator.push(target.clone());
                    return target;
                }
                Guard::Redirect(next) => {
                    debug!("Guard redirected {} to {}", target.full_path(), next.full_path());
                    target = next;
                }
            }
        }

        warn!(
            "Navigation to {} exceeded {} redirects; staying put",
            target.full_path(),
            MAX_REDIRECTS
        );
        navigator.current()
    }
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    if pattern == "*" {
        return Some(BTreeMap::new());
    }

    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    let expected: Vec<&str> = pattern.split('/').collect();
    let actual: Vec<&str> = path.split('/').collect();
    if expected.len() != actual.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (want, got) in expected.iter().zip(actual.iter()) {
        match want.strip_prefix(':') {
            Some(name) if !got.is_empty() => {
                params.insert(name.to_string(), got.to_string());
            }
            Some(_) => return None,
            None if want == got => {}
            None => return None,
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_static_and_param_routes() {
        let router = Router::new();

        let resolved = router.resolve("/organizer/activities/42/edit").unwrap();
        assert_eq!(resolved.record.name, Some("EditActivity"));
        assert_eq!(resolved.params.get("id").map(String::as_str), Some("42"));
        assert_eq!(resolved.record.meta.role, Some(Role::Organizer));

        // Static segment wins because it is listed before the catch-all
        let create = router.resolve("/organizer/activities/create").unwrap();
        assert_eq!(create.record.name, Some("CreateActivity"));

        let detail = router.resolve("/activities/7/").unwrap();
        assert_eq!(detail.record.name, Some("ActivityDetail"));
    }

    #[test]
    fn test_unknown_path_hits_not_found() {
        let router = Router::new();
        let resolved = router.resolve("/nope/at/all").unwrap();
        assert_eq!(resolved.record.name, Some("NotFound"));
        assert!(!resolved.record.meta.requires_auth);
    }

    #[test]
    fn test_redirect_records() {
        let router = Router::new();
        assert_eq!(router.resolve("/").unwrap().record.redirect, Some("/activities"));
        assert_eq!(
            router.resolve("/organizer").unwrap().record.redirect,
            Some("/organizer/dashboard")
        );
        assert_eq!(router.path_of("Profile"), Some("/profile"));
    }

    #[test]
    fn test_location_round_trips_query() {
        let login = Location::login_with_redirect("/organizer/activities/3/statistics?tab=trend");
        let full = login.full_path();
        assert_eq!(
            full,
            "/login?redirect=%2Forganizer%2Factivities%2F3%2Fstatistics%3Ftab%3Dtrend"
        );
        assert_eq!(Location::parse(&full), login);
    }

    #[test]
    fn test_history_back_keeps_first_entry() {
        let history = History::default();
        history.push(Location::new("/activities"));
        history.replace(Location::new("/profile"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.back().path, "/");
        assert_eq!(history.back().path, "/");
        assert_eq!(history.len(), 1);
    }
}
