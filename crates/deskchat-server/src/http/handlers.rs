//! HTTP handlers for the chat endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use deskchat_core::{GuestIdentity, SessionFilter, SessionId};

use crate::auth::Caller;
use crate::http::responses::{
    error_response, unauthorized, ApiResponse, GuestChatRequest, ListQuery, PostMessageRequest,
    StartChatRequest, UpdatePriorityRequest, UpdateStatusRequest,
};
use crate::state::AppState;

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Caller {
    state.auth.resolve(bearer_token(headers)).await
}

/// List sessions. Admin only.
///
/// GET /chat?status=&q=
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let caller = resolve_caller(&state, &headers).await;
    if caller == Caller::Guest {
        return unauthorized();
    }

    let mut filter = SessionFilter::any();
    filter.status = query.status;
    filter.query = query.q;

    match state.service.list_sessions(&filter, &caller).await {
        Ok(sessions) => Json(ApiResponse::ok(sessions)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Aggregate unread counts for the caller.
///
/// GET /chat/unread
pub async fn unread_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let caller = resolve_caller(&state, &headers).await;
    if caller == Caller::Guest {
        return unauthorized();
    }
    match state.service.unread_summary(&caller).await {
        Ok(summary) => Json(ApiResponse::ok(summary)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Fetch one session. Admin or owning visitor.
///
/// GET /chat/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let caller = resolve_caller(&state, &headers).await;
    if caller == Caller::Guest {
        return unauthorized();
    }
    let session_id = SessionId::new(id);
    match state.service.get_session(&session_id, &caller).await {
        Ok(session) => Json(ApiResponse::ok(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Start (or continue) an authenticated visitor's chat.
///
/// POST /chat
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<StartChatRequest>,
) -> Response {
    let caller = resolve_caller(&state, &headers).await;
    let user_id = match caller {
        Caller::Visitor { id } => id,
        Caller::Guest => return unauthorized(),
        Caller::Admin { .. } => {
            return error_response(deskchat_core::ChatError::Forbidden(
                "admins do not open visitor chats".into(),
            ))
        }
    };

    match state
        .service
        .start_authenticated_chat(&user_id, req.subject, &req.message, req.attachments)
        .await
    {
        Ok(session) => Json(ApiResponse::ok(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Start a guest chat with self-declared contact info.
///
/// POST /chat/public
pub async fn create_guest_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GuestChatRequest>,
) -> Response {
    let identity = GuestIdentity {
        name: req.name,
        email: req.email,
        subject: req.subject,
    };
    match state
        .service
        .start_guest_chat(identity, &req.message, req.attachments)
        .await
    {
        Ok(session) => Json(ApiResponse::ok(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Poll a guest session snapshot. No auth; the id itself is the
/// capability the widget persisted at creation.
///
/// GET /chat/public/:id
pub async fn get_guest_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let session_id = SessionId::new(id);
    match state
        .service
        .get_session(&session_id, &Caller::Guest)
        .await
    {
        Ok(session) => Json(ApiResponse::ok(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Append a message. Admin or owning visitor.
///
/// POST /chat/:id/message
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Response {
    let caller = resolve_caller(&state, &headers).await;
    if caller == Caller::Guest {
        return unauthorized();
    }
    let session_id = SessionId::new(id);
    match state
        .service
        .post_message(&session_id, &caller, &req.content, req.attachments)
        .await
    {
        Ok(message) => Json(ApiResponse::ok(message)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Append a message to a guest session. No cookie/token auth; the id
/// must belong to a guest session.
///
/// POST /chat/public/:id/message
pub async fn post_guest_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Response {
    let session_id = SessionId::new(id);
    match state
        .service
        .post_message(&session_id, &Caller::Guest, &req.content, req.attachments)
        .await
    {
        Ok(message) => Json(ApiResponse::ok(message)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Change session status. Admin only.
///
/// PUT /chat/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Response {
    let caller = resolve_caller(&state, &headers).await;
    if caller == Caller::Guest {
        return unauthorized();
    }
    let session_id = SessionId::new(id);
    match state
        .service
        .set_status(&session_id, &caller, req.status)
        .await
    {
        Ok(session) => Json(ApiResponse::ok(session)).into_response(),
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Status change rejected");
            error_response(e)
        }
    }
}

/// Change session priority. Admin only.
///
/// PUT /chat/:id/priority
pub async fn update_priority(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdatePriorityRequest>,
) -> Response {
    let caller = resolve_caller(&state, &headers).await;
    if caller == Caller::Guest {
        return unauthorized();
    }
    let session_id = SessionId::new(id);
    match state
        .service
        .set_priority(&session_id, &caller, req.priority)
        .await
    {
        Ok(session) => Json(ApiResponse::ok(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Mark the session read for the caller's side.
///
/// POST /chat/:id/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let caller = resolve_caller(&state, &headers).await;
    if caller == Caller::Guest {
        return unauthorized();
    }
    let session_id = SessionId::new(id);
    match state.service.mark_read(&session_id, &caller).await {
        Ok(()) => Json(ApiResponse::ok(serde_json::json!({}))).into_response(),
        Err(e) => error_response(e),
    }
}
