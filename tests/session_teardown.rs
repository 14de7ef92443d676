mod common;

use campus_activity::error::Error;
use campus_activity::http::{Notifier, SESSION_EXPIRED_MESSAGE};
use campus_activity::persist::{write_json, SessionStorage, ACCOUNT_USER_KEY, TOKEN_KEY};
use campus_activity::router::{Location, Navigator};
use campus_activity::types::LoginForm;
use campus_activity::CampusClient;
use common::*;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Toasts(Mutex<Vec<String>>);

impl Notifier for Toasts {
    fn notify(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

fn logged_in(storage: &dyn SessionStorage) {
    storage.set(TOKEN_KEY, "jwt-old");
    write_json(storage, ACCOUNT_USER_KEY, &account_json("王五", "student", "jwt-old"));
}

#[tokio::test]
async fn test_concurrent_401s_clear_storage_once() {
    let server = MockServer::start().await;
    let storage = Arc::new(CountingStorage::default());
    logged_in(&*storage);
    let toasts = Arc::new(Toasts::default());
    let client =
        CampusClient::with_notifier(options_for(&server), storage.clone(), toasts.clone()).unwrap();
    client.auth().init_auth();
    client.history().push(Location::new("/my-activities"));

    let expired = ResponseTemplate::new(200)
        .set_body_json(json!({ "code": 401, "message": "token expired", "data": null }))
        .set_delay(Duration::from_millis(100));
    Mock::given(method("GET"))
        .and(path(api("/registrations/my")))
        .respond_with(expired.clone())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/checkin/my-recent")))
        .respond_with(expired)
        .expect(1)
        .mount(&server)
        .await;

    let registrations = client.registration_api();
    let checkins = client.checkin_api();
    let (a, b) = tokio::join!(
        registrations.get_my_registrations(None),
        checkins.get_my_recent_check_ins()
    );

    assert!(matches!(a, Err(Error::Unauthorized { .. })));
    assert!(matches!(b, Err(Error::Unauthorized { .. })));
    assert_eq!(storage.token_removals(), 1);
    assert!(!storage.contains(ACCOUNT_USER_KEY));
    assert_eq!(*toasts.0.lock().unwrap(), vec!["token expired".to_string()]);

    let current = client.current_location();
    assert_eq!(current.path, "/login");
    assert_eq!(current.query_value("redirect"), Some("/my-activities"));
    assert!(!client.auth().is_logged_in());
}

#[tokio::test]
async fn test_http_401_tears_down_with_default_message() {
    let server = MockServer::start().await;
    let storage = Arc::new(CountingStorage::default());
    logged_in(&*storage);
    let toasts = Arc::new(Toasts::default());
    let client =
        CampusClient::with_notifier(options_for(&server), storage.clone(), toasts.clone()).unwrap();

    Mock::given(method("GET"))
        .and(path(api("/auth/me")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.auth_api().get_current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(storage.token_removals(), 1);
    assert_eq!(
        *toasts.0.lock().unwrap(),
        vec![SESSION_EXPIRED_MESSAGE.to_string()]
    );
    assert_eq!(client.current_location().full_path(), "/login?redirect=%2F");
}

#[tokio::test]
async fn test_stale_401_after_fresh_login_is_ignored() {
    let (server, client, storage) = setup().await;
    logged_in(&*storage);

    // Sent with the old token; answers after the new login completed
    Mock::given(method("GET"))
        .and(path(api("/statistics/organizer")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 401, "message": "token expired", "data": null }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("/auth/login")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "code": 200,
            "data": account_json("李老师", "organizer", "jwt-new")
        })))
        .mount(&server)
        .await;

    let statistics = client.statistics_api();
    let stale = tokio::spawn(async move { statistics.get_organizer_statistics().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let login = client.auth().login(&LoginForm::new("T2024001", "pw")).await;
    assert!(login.success);

    let stale = stale.await.unwrap();
    assert!(matches!(stale, Err(Error::Unauthorized { .. })));

    // The new session is untouched
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("jwt-new"));
    assert!(client.auth().is_organizer());
    assert_eq!(client.current_location().path, "/");
}

#[tokio::test]
async fn test_next_session_can_be_torn_down_again() {
    let (server, client, storage) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("/auth/login")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "code": 200,
            "data": account_json("王五", "student", "jwt-1")
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/checkin/my-recent")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    for _ in 0..2 {
        client.history().replace(Location::new("/checkin"));
        assert!(client.auth().login(&LoginForm::new("2023001", "pw")).await.success);
        assert!(storage.contains(TOKEN_KEY));

        assert!(client.checkin_api().get_my_recent_check_ins().await.is_err());
        assert!(!storage.contains(TOKEN_KEY));
        assert!(!client.auth().is_logged_in());
        assert_eq!(client.current_location().query_value("redirect"), Some("/checkin"));
    }
}
