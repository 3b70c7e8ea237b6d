//! End-to-end tests against the HTTP router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use deskchat_server::auth::StaticTokenAuth;
use deskchat_server::auto_reply::AutoReplyConfig;
use deskchat_server::http::create_router;
use deskchat_server::state::AppState;

const ADMIN_TOKEN: &str = "admin-secret";
const VISITOR_TOKEN: &str = "visitor-secret";

fn router_with(auto_reply: AutoReplyConfig) -> Router {
    let auth = StaticTokenAuth::new()
        .with_admin(ADMIN_TOKEN, "staff-1")
        .with_visitor(VISITOR_TOKEN, "user-1");
    create_router(AppState::new(Arc::new(auth), auto_reply))
}

fn router() -> Router {
    router_with(AutoReplyConfig {
        enabled: false,
        ..AutoReplyConfig::default()
    })
}

async fn send(
    router: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_guest_session(router: &Router, message: &str) -> String {
    let (status, body) = send(
        router,
        "POST",
        "/chat/public",
        None,
        Some(json!({
            "name": "A",
            "email": "a@x.com",
            "subject": "Help",
            "message": message,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_guest_create_then_poll() {
    let router = router();
    let id = create_guest_session(&router, "Hi").await;

    // the widget polls the public surface with just the session id
    let (status, body) = send(&router, "GET", &format!("/chat/public/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["sender_role"], json!("visitor"));
    assert_eq!(messages[0]["content"], json!("Hi"));

    // the admin console sees the same session
    let (status, body) = send(
        &router,
        "GET",
        &format!("/chat/{}", id),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("pending"));
    assert_eq!(body["data"]["unread_for_admin"], json!(1));
}

#[tokio::test]
async fn test_closed_is_terminal_over_http() {
    let router = router();
    let id = create_guest_session(&router, "Hi").await;

    let (status, _) = send(
        &router,
        "PUT",
        &format!("/chat/{}/status", id),
        Some(ADMIN_TOKEN),
        Some(json!({"status": "closed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        "PUT",
        &format!("/chat/{}/status", id),
        Some(ADMIN_TOKEN),
        Some(json!({"status": "active"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));

    // closing an already-closed session is idempotent
    let (status, _) = send(
        &router,
        "PUT",
        &format!("/chat/{}/status", id),
        Some(ADMIN_TOKEN),
        Some(json!({"status": "closed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_validation_and_auth_mapping() {
    let router = router();

    // guest create without a usable email -> 400
    let (status, body) = send(
        &router,
        "POST",
        "/chat/public",
        None,
        Some(json!({"name": "A", "email": "nope", "message": "Hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("email"));

    // empty message -> 400
    let (status, _) = send(
        &router,
        "POST",
        "/chat/public",
        None,
        Some(json!({"name": "A", "email": "a@x.com", "message": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // no credentials on the admin list -> 401
    let (status, _) = send(&router, "GET", "/chat", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // visitor credentials on the admin list -> 403
    let (status, _) = send(&router, "GET", "/chat", Some(VISITOR_TOKEN), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // unknown session -> 404
    let (status, _) = send(&router, "GET", "/chat/missing", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_authenticated_chat_appends_to_open_session() {
    let router = router();

    let (status, body) = send(
        &router,
        "POST",
        "/chat",
        Some(VISITOR_TOKEN),
        Some(json!({"message": "first", "subject": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        "POST",
        "/chat",
        Some(VISITOR_TOKEN),
        Some(json!({"message": "second"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"].as_str().unwrap(), first_id);
    assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 2);

    // close it; the next start creates a new session
    let (status, _) = send(
        &router,
        "PUT",
        &format!("/chat/{}/status", first_id),
        Some(ADMIN_TOKEN),
        Some(json!({"status": "closed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &router,
        "POST",
        "/chat",
        Some(VISITOR_TOKEN),
        Some(json!({"message": "third"})),
    )
    .await;
    assert_ne!(body["data"]["id"].as_str().unwrap(), first_id);
}

#[tokio::test]
async fn test_guest_surface_ownership() {
    let router = router();

    // guest cannot use the public surface against an authenticated session
    let (_, body) = send(
        &router,
        "POST",
        "/chat",
        Some(VISITOR_TOKEN),
        Some(json!({"message": "mine"})),
    )
    .await;
    let authed_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &router,
        "POST",
        &format!("/chat/public/{}/message", authed_id),
        None,
        Some(json!({"content": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // but may append to its own guest session
    let guest_id = create_guest_session(&router, "Hi").await;
    let (status, body) = send(
        &router,
        "POST",
        &format!("/chat/public/{}/message", guest_id),
        None,
        Some(json!({"content": "more"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sender_role"], json!("visitor"));
}

#[tokio::test]
async fn test_mark_read_and_unread_summary() {
    let router = router();
    let id = create_guest_session(&router, "Hi").await;

    let (status, body) = send(&router, "GET", "/chat/unread", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(1));

    let (status, _) = send(
        &router,
        "POST",
        &format!("/chat/{}/read", id),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, "GET", "/chat/unread", Some(ADMIN_TOKEN), None).await;
    assert_eq!(body["data"]["total"], json!(0));
}

#[tokio::test]
async fn test_list_sessions_with_filter() {
    let router = router();
    let id = create_guest_session(&router, "billing question").await;
    create_guest_session(&router, "something else").await;

    let (status, body) = send(
        &router,
        "GET",
        "/chat?status=pending&q=billing",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"].as_str().unwrap(), id);
}

#[tokio::test(start_paused = true)]
async fn test_urgent_auto_reply_after_delay() {
    let router = router_with(AutoReplyConfig::default());
    let id = create_guest_session(&router, "urgent: need help now").await;

    // nothing yet at t=29s
    tokio::time::sleep(Duration::from_secs(29)).await;
    let (_, body) = send(&router, "GET", &format!("/chat/public/{}", id), None, None).await;
    assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 1);

    // exactly one system message shortly after the 30s delay
    tokio::time::sleep(Duration::from_secs(2)).await;
    let (_, body) = send(&router, "GET", &format!("/chat/public/{}", id), None, None).await;
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["sender_role"], json!("system"));
    assert_eq!(messages[1]["is_auto_reply"], json!(true));
    assert_eq!(
        messages[1]["content"].as_str().unwrap(),
        AutoReplyConfig::default().expedited_message
    );
}

#[tokio::test(start_paused = true)]
async fn test_admin_reply_prevents_auto_reply() {
    let router = router_with(AutoReplyConfig::default());
    let id = create_guest_session(&router, "urgent: need help now").await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    let (status, _) = send(
        &router,
        "POST",
        &format!("/chat/{}/message", id),
        Some(ADMIN_TOKEN),
        Some(json!({"content": "on it"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_secs(120)).await;
    let (_, body) = send(&router, "GET", &format!("/chat/public/{}", id), None, None).await;
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m["is_auto_reply"] == json!(false)));
}
