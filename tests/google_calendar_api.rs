use chrono::{TimeZone, Utc};
use mockito::Matcher;
use nittei::components::google_calendar::{CalendarProvider, GoogleCalendarHandle, SignInState};
use nittei::config::Config;
use std::sync::Arc;

const TOKEN_RESPONSE: &str =
    r#"{"access_token": "access-1", "expires_in": 3600, "refresh_token": "refresh-1"}"#;

fn config_for(server: &mockito::ServerGuard) -> Arc<Config> {
    Arc::new(Config {
        google_client_id: "client-id".to_string(),
        google_client_secret: "client-secret".to_string(),
        google_token_url: format!("{}/token", server.url()),
        google_api_base: server.url(),
        ..Config::default()
    })
}

async fn mock_sign_in(server: &mut mockito::ServerGuard) {
    server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "auth-code".into()),
            Matcher::UrlEncoded("client_id".into(), "client-id".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_RESPONSE)
        .create_async()
        .await;

    server
        .mock("GET", "/oauth2/v3/userinfo")
        .match_header("authorization", "Bearer access-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "山田太郎"}"#)
        .create_async()
        .await;
}

#[tokio::test]
async fn test_sign_in_publishes_user_name() {
    let mut server = mockito::Server::new_async().await;
    mock_sign_in(&mut server).await;

    let provider = GoogleCalendarHandle::new(config_for(&server), reqwest::Client::new());
    let mut changes = provider.on_sign_in_change();
    assert_eq!(*changes.borrow(), SignInState::SignedOut);

    provider.complete_sign_in("auth-code").await.unwrap();

    changes.changed().await.unwrap();
    assert_eq!(
        *changes.borrow_and_update(),
        SignInState::SignedIn {
            user_name: Some("山田太郎".to_string())
        }
    );

    provider.sign_out().await.unwrap();
    changes.changed().await.unwrap();
    assert_eq!(*changes.borrow_and_update(), SignInState::SignedOut);

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_list_upcoming_events_sends_documented_query() {
    let mut server = mockito::Server::new_async().await;
    mock_sign_in(&mut server).await;

    let now = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    let events_mock = server
        .mock("GET", "/calendar/v3/calendars/primary/events")
        .match_header("authorization", "Bearer access-1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("timeMin".into(), now.to_rfc3339()),
            Matcher::UrlEncoded("showDeleted".into(), "false".into()),
            Matcher::UrlEncoded("singleEvents".into(), "true".into()),
            Matcher::UrlEncoded("maxResults".into(), "10".into()),
            Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "items": [
                    {
                        "id": "evt1",
                        "summary": "Design review",
                        "start": { "dateTime": "2023-06-01T10:00:00+09:00" },
                        "end": { "dateTime": "2023-06-01T11:00:00+09:00" }
                    },
                    {
                        "id": "holiday",
                        "summary": "Holiday",
                        "start": { "date": "2023-06-02" },
                        "end": { "date": "2023-06-03" }
                    }
                ]
            }"#,
        )
        .create_async()
        .await;

    let provider = GoogleCalendarHandle::new(config_for(&server), reqwest::Client::new());
    provider.complete_sign_in("auth-code").await.unwrap();

    let events = provider.list_upcoming_events(now).await.unwrap();
    events_mock.assert_async().await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "evt1");
    assert_eq!(events[0].title, "Design review");
    assert_eq!(events[0].start, Utc.with_ymd_and_hms(2023, 6, 1, 1, 0, 0).unwrap());
    assert_eq!(events[0].end, Utc.with_ymd_and_hms(2023, 6, 1, 2, 0, 0).unwrap());
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    mock_sign_in(&mut server).await;

    server
        .mock("GET", "/calendar/v3/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("unauthorized")
        .create_async()
        .await;

    let provider = GoogleCalendarHandle::new(config_for(&server), reqwest::Client::new());
    provider.complete_sign_in("auth-code").await.unwrap();

    let err = provider.list_upcoming_events(Utc::now()).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_events_require_sign_in() {
    let server = mockito::Server::new_async().await;
    let provider = GoogleCalendarHandle::new(config_for(&server), reqwest::Client::new());

    assert!(provider.list_upcoming_events(Utc::now()).await.is_err());
}

#[tokio::test]
async fn test_rejected_code_keeps_session_signed_out() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant"}"#)
        .create_async()
        .await;

    let provider = GoogleCalendarHandle::new(config_for(&server), reqwest::Client::new());
    assert!(provider.complete_sign_in("expired").await.is_err());
    assert_eq!(*provider.on_sign_in_change().borrow(), SignInState::SignedOut);
}

#[test]
fn test_sign_in_url_carries_state() {
    let config = Config {
        google_client_id: "client-id".to_string(),
        ..Config::default()
    };
    let url = nittei::components::google_calendar::token::TokenManager::authorization_url(
        &config, "abc-123",
    )
    .unwrap();
    assert!(url.contains("state=abc-123"));
    assert!(url.contains("client_id=client-id"));
}
