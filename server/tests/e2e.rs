//! End-to-end flow: accounts, team bootstrap, the invitation workflow and
//! the realtime hub behind it, driven through the public router.

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use huddle_auth::Identity;
use huddle_config::AppConfig;
use huddle_gateway::{create_router, GatewayState};
use huddle_realtime::ServerEvent;
use huddle_runtime::BackendServices;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: GatewayState,
    _db_dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    body: Value,
}

impl TestApp {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("huddle-test.db");

        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", db_path.to_string_lossy());
        config.database.max_connections = 5;

        let services = BackendServices::initialise(&config)
            .await
            .expect("initialise backend services");

        let state = GatewayState::new(
            services.db_pool.clone(),
            services.authenticator.clone(),
            &config,
        );
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let app = self.router.clone();
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = if let Some(json_body) = body {
            let bytes = serde_json::to_vec(&json_body).expect("serialize request body");
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        let response = app
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    async fn register_and_login(&self, email: &str) -> (String, String) {
        let registered = self
            .request(
                Method::POST,
                "/api/auth/register",
                Some(json!({ "email": email, "password": "correct-horse-battery" })),
                None,
            )
            .await;
        assert_eq!(registered.status, StatusCode::OK);
        let user_id = registered.body["id"].as_str().unwrap().to_owned();

        let logged_in = self
            .request(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "email": email, "password": "correct-horse-battery" })),
                None,
            )
            .await;
        assert_eq!(logged_in.status, StatusCode::OK);
        let token = logged_in.body["token"].as_str().unwrap().to_owned();

        (user_id, token)
    }

    /// Simulate a live websocket connection for a user: bind + register,
    /// the same path the upgrade handler takes.
    async fn connect(&self, token: &str) -> (String, tokio::sync::mpsc::Receiver<ServerEvent>) {
        let identity: Identity = self
            .state
            .authenticator
            .bind_identity(token)
            .await
            .expect("bind identity");
        self.state.registry.register(identity).await
    }
}

#[tokio::test]
async fn requests_without_token_are_refused() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/teams", Some(json!({"name": "x"})), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/invitations", None, Some("bogus-token"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_wrong_password_is_refused() {
    let app = TestApp::new().await;
    app.register_and_login("o@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "o@example.com", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invitation_workflow_end_to_end() {
    let app = TestApp::new().await;
    let (_o_id, o_token) = app.register_and_login("organizer@example.com").await;
    let (a_id, a_token) = app.register_and_login("invitee@example.com").await;

    // Organizer creates the team.
    let created = app
        .request(
            Method::POST,
            "/api/teams",
            Some(json!({ "name": "platform" })),
            Some(&o_token),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    let team_id = created.body["id"].as_str().unwrap().to_owned();

    // Invitee cannot invite anyone: not an organizer, not even a member.
    let forbidden = app
        .request(
            Method::POST,
            &format!("/api/teams/{team_id}/invitations"),
            Some(json!({ "user_id": a_id })),
            Some(&a_token),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    // Organizer invites A; a pending invitation appears for A.
    let invited = app
        .request(
            Method::POST,
            &format!("/api/teams/{team_id}/invitations"),
            Some(json!({ "user_id": a_id })),
            Some(&o_token),
        )
        .await;
    assert_eq!(invited.status, StatusCode::OK);
    assert_eq!(invited.body["success"], json!(true));
    let invitation_id = invited.body["invitation"]["id"].as_str().unwrap().to_owned();

    let pending = app
        .request(Method::GET, "/api/invitations", None, Some(&a_token))
        .await;
    assert_eq!(pending.status, StatusCode::OK);
    assert_eq!(pending.body.as_array().unwrap().len(), 1);
    assert_eq!(pending.body[0]["team_name"], json!("platform"));

    // A second invitation for the same pair is a soft outcome.
    let duplicate = app
        .request(
            Method::POST,
            &format!("/api/teams/{team_id}/invitations"),
            Some(json!({ "user_id": a_id })),
            Some(&o_token),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::OK);
    assert_eq!(duplicate.body["success"], json!(false));
    assert_eq!(duplicate.body["reason"], json!("already_invited"));

    // Only the invitee may respond.
    let wrong_responder = app
        .request(
            Method::POST,
            &format!("/api/invitations/{invitation_id}/respond"),
            Some(json!({ "accept": true })),
            Some(&o_token),
        )
        .await;
    assert_eq!(wrong_responder.status, StatusCode::FORBIDDEN);

    // A accepts; membership is visible in the same observable state.
    let accepted = app
        .request(
            Method::POST,
            &format!("/api/invitations/{invitation_id}/respond"),
            Some(json!({ "accept": true })),
            Some(&a_token),
        )
        .await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["success"], json!(true));
    assert_eq!(accepted.body["invitation"]["status"], json!("accepted"));
    assert!(accepted.body["invitation"]["responded_at"].is_string());

    let history = app
        .request(
            Method::GET,
            &format!("/api/teams/{team_id}/messages"),
            None,
            Some(&a_token),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK, "accepted invitee is a member");

    // Responding again, with either value, is not_pending.
    for accept in [true, false] {
        let again = app
            .request(
                Method::POST,
                &format!("/api/invitations/{invitation_id}/respond"),
                Some(json!({ "accept": accept })),
                Some(&a_token),
            )
            .await;
        assert_eq!(again.status, StatusCode::OK);
        assert_eq!(again.body["success"], json!(false));
        assert_eq!(again.body["reason"], json!("not_pending"));
    }
}

#[tokio::test]
async fn live_messaging_and_forced_eviction() {
    let app = TestApp::new().await;
    let (_o_id, o_token) = app.register_and_login("organizer@example.com").await;
    let (a_id, a_token) = app.register_and_login("invitee@example.com").await;

    let created = app
        .request(
            Method::POST,
            "/api/teams",
            Some(json!({ "name": "platform" })),
            Some(&o_token),
        )
        .await;
    let team_id = created.body["id"].as_str().unwrap().to_owned();

    let invited = app
        .request(
            Method::POST,
            &format!("/api/teams/{team_id}/invitations"),
            Some(json!({ "user_id": a_id })),
            Some(&o_token),
        )
        .await;
    let invitation_id = invited.body["invitation"]["id"].as_str().unwrap().to_owned();
    app.request(
        Method::POST,
        &format!("/api/invitations/{invitation_id}/respond"),
        Some(json!({ "accept": true })),
        Some(&a_token),
    )
    .await;

    // Both connect and join the team group.
    let (o_session, mut o_rx) = app.connect(&o_token).await;
    let (a_session, mut a_rx) = app.connect(&a_token).await;
    app.state.groups.join(&o_session, &team_id).await.unwrap();
    app.state.groups.join(&a_session, &team_id).await.unwrap();

    // A publishes; both live sessions observe the message.
    let record = app
        .state
        .fanout
        .publish(&a_session, &team_id, "hello")
        .await
        .expect("publish");

    for rx in [&mut o_rx, &mut a_rx] {
        match rx.try_recv().expect("delivery") {
            ServerEvent::Message { message } => {
                assert_eq!(message.content, "hello");
                assert_eq!(message.id, record.public_id);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    // The message is durable and retrievable through history.
    let history = app
        .request(
            Method::GET,
            &format!("/api/teams/{team_id}/messages?page=0&page_size=10"),
            None,
            Some(&o_token),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body.as_array().unwrap().len(), 1);
    assert_eq!(history.body[0]["content"], json!("hello"));

    // Organizer removes A: membership revoked and live sessions evicted.
    let removed = app
        .request(
            Method::DELETE,
            &format!("/api/teams/{team_id}/members/{a_id}"),
            None,
            Some(&o_token),
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);

    match a_rx.try_recv().expect("forced leave notification") {
        ServerEvent::ForcedLeave { team_id: evicted } => assert_eq!(evicted, team_id),
        other => panic!("expected forced_leave, got {other:?}"),
    }

    // The evicted user can neither publish nor rejoin nor read history.
    let publish = app.state.fanout.publish(&a_session, &team_id, "again").await;
    assert!(publish.is_err(), "evicted session must not publish");
    let rejoin = app.state.groups.join(&a_session, &team_id).await;
    assert!(rejoin.is_err(), "revoked member must not rejoin");
    let history = app
        .request(
            Method::GET,
            &format!("/api/teams/{team_id}/messages"),
            None,
            Some(&a_token),
        )
        .await;
    assert_eq!(history.status, StatusCode::FORBIDDEN);

    // Deleting the team disbands the group and cascades storage.
    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/teams/{team_id}"),
            None,
            Some(&o_token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    match o_rx.try_recv().expect("deletion notification") {
        ServerEvent::TeamDeleted { team_id: gone } => assert_eq!(gone, team_id),
        other => panic!("expected team_deleted, got {other:?}"),
    }

    let history = app
        .request(
            Method::GET,
            &format!("/api/teams/{team_id}/messages"),
            None,
            Some(&o_token),
        )
        .await;
    assert_eq!(history.status, StatusCode::FORBIDDEN, "membership went with the team");
}
