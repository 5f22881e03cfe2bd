use std::sync::Arc;

use diary_client::{DiaryClient, Error};
use diary_roster::{RosterCache, RosterConfig, RosterError, RosterSources};
use diary_types::{CharacterId, FollowToggleSource, RosterSource, UserId};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn roster_json() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "a",
            "name": "Aki",
            "description": "Dry wit",
            "promptDescription": "You are Aki.",
            "avatarUrl": null,
            "isFollowing": false,
            "affinity": 0,
            "userCharacterRelationId": null
        },
        {
            "id": "b",
            "name": "Bo",
            "description": "Optimist",
            "prompt_description": "You are Bo.",
            "owner_id": "user-1",
            "is_following": true,
            "affinity": 4,
            "user_character_relation_id": "rel-b"
        }
    ])
}

fn client_for(server: &MockServer) -> DiaryClient {
    DiaryClient::builder()
        .base_url(server.uri())
        .api_key("test-key")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_fetch_roster_sends_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/user-1/characters"))
        .and(header("apikey", "test-key"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(roster_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let roster = client
        .characters()
        .roster(&UserId::new("user-1"))
        .await
        .unwrap();

    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].prompt_description, "You are Aki.");
    assert!(roster[0].is_system());
    assert!(roster[1].is_following);
    assert_eq!(roster[1].affinity, 4);
    assert_eq!(roster[1].owner_id, Some(UserId::new("user-1")));
}

#[tokio::test]
async fn test_toggle_follow_returns_outcome() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/users/user-1/characters/a/follow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "relationId": "r1",
            "isFollowing": true
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = client
        .toggle_follow(&UserId::new("user-1"), &CharacterId::new("a"))
        .await
        .unwrap();

    assert!(outcome.is_following);
    assert_eq!(outcome.relation_id.as_str(), "r1");
}

#[tokio::test]
async fn test_ids_are_escaped_in_paths() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/team%2Fone%3Fx=1/characters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/users/u1/characters/a%2F..%2F..%2Fadmin/follow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "relation_id": "r1",
            "is_following": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let roster = client
        .characters()
        .roster(&UserId::new("team/one?x=1"))
        .await
        .unwrap();
    assert!(roster.is_empty());

    let outcome = client
        .characters()
        .toggle_follow(&UserId::new("u1"), &CharacterId::new("a/../../admin"))
        .await
        .unwrap();
    assert_eq!(outcome.relation_id.as_str(), "r1");

    let err = client
        .characters()
        .toggle_follow(&UserId::new("u1"), &CharacterId::new(".."))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
}

#[tokio::test]
async fn test_update_affinity_sends_delta() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/users/user-1/characters/b/affinity"))
        .and(body_json(serde_json::json!({ "delta": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "affinity": 6 })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let affinity = client
        .characters()
        .update_affinity(&UserId::new("user-1"), &CharacterId::new("b"), 2)
        .await
        .unwrap();

    assert_eq!(affinity, 6);
}

#[tokio::test]
async fn test_error_responses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/missing/characters"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "code": "not_found",
            "message": "user missing"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/locked/characters"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "unauthorized",
            "message": "bad key"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/broken/characters"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.characters().roster(&"missing".into()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::NotFound(ref m) if m == "user missing"));

    let err = client.characters().roster(&"locked".into()).await.unwrap_err();
    assert!(err.is_auth_error());

    let err = client.characters().roster(&"broken".into()).await.unwrap_err();
    assert!(err.is_server_error());
    assert!(matches!(err, Error::Api { status: 500, ref code, .. } if code == "unknown"));

    // Through the collaborator trait the message survives as text.
    let err = client.fetch_roster(&"locked".into()).await.unwrap_err();
    assert_eq!(err.message(), "Authentication failed: bad key");
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "version": "1.2.3"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let health = client.health().check().await.unwrap();
    assert!(health.is_ok());
    assert_eq!(health.version.as_deref(), Some("1.2.3"));
    assert!(client.health().is_healthy().await);
}

#[tokio::test]
async fn test_cache_over_http_rolls_back_rejected_toggle() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/user-1/characters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(roster_json()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/users/user-1/characters/b/follow"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "code": "unavailable",
            "message": "try later"
        })))
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server));
    let cache = RosterCache::for_user(
        RosterConfig::default(),
        RosterSources::from_backend(client),
        UserId::new("user-1"),
    );

    cache.load(false).await.unwrap();
    assert!(cache.is_followed(&"b".into()));

    let err = cache.toggle_follow(&"b".into()).await.unwrap_err();
    assert!(matches!(err, RosterError::Toggle(ref e) if e.message() == "API error (503): try later"));
    assert!(cache.is_followed(&"b".into()));
}
