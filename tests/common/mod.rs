#![allow(dead_code)]

use campus_activity::config::ClientOptions;
use campus_activity::persist::{MemoryStorage, SessionStorage, TOKEN_KEY};
use campus_activity::CampusClient;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::{MockServer, ResponseTemplate};

/// Mounted under the mock server like the real deployment
pub const API_PREFIX: &str = "/api";

pub fn api(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub fn options_for(server: &MockServer) -> ClientOptions {
    let _ = pretty_env_logger::try_init();
    ClientOptions::default().with_base_url(&format!("{}{}", server.uri(), API_PREFIX))
}

pub async fn setup() -> (MockServer, CampusClient, Arc<MemoryStorage>) {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let client = CampusClient::new(options_for(&server), storage.clone()).unwrap();
    (server, client, storage)
}

/// `{ code: 200, data }`
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 200,
        "message": "success",
        "data": data
    }))
}

pub fn envelope(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": code,
        "message": message,
        "data": null
    }))
}

pub fn user_json(id: i64, role: &str) -> Value {
    json!({
        "id": id,
        "username": format!("user{}", id),
        "email": format!("user{}@campus.edu", id),
        "role": role,
        "isActive": true,
        "createdAt": "2024-09-01T08:00:00"
    })
}

pub fn account_json(name: &str, role: &str, token: &str) -> Value {
    json!({
        "name": name,
        "accountId": "2023001",
        "role": role,
        "token": token,
        "user": user_json(1, role),
        "firstLoginTime": "2024-09-01T08:00:00"
    })
}

pub fn activity_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "校园活动",
        "category": "sports",
        "status": "upcoming",
        "organizerId": 3,
        "organizerName": "体育部",
        "startTime": "2025-05-01T08:00:00",
        "endTime": "2025-05-01T11:00:00",
        "location": "东操场",
        "maxParticipants": 50,
        "currentParticipants": 12,
        "registrationDeadline": "2025-04-28T00:00:00",
        "tags": ["跑步"]
    })
}

pub fn page_json(items: Vec<Value>, page: u32, page_size: u32) -> Value {
    let total = items.len();
    json!({
        "items": items,
        "total": total,
        "page": page,
        "pageSize": page_size,
        "totalPages": 1
    })
}

/// Memory storage that counts how often the token key is removed
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    token_removals: AtomicUsize,
}

impl CountingStorage {
    pub fn token_removals(&self) -> usize {
        self.token_removals.load(Ordering::SeqCst)
    }
}

impl SessionStorage for CountingStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) {
        if key == TOKEN_KEY {
            self.token_removals.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.remove(key)
    }
}
