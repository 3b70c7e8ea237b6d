//! HTTP surface for the chat subsystem.
//!
//! Provides endpoints for:
//! - Session list and unread summary (`/chat`, `/chat/unread`)
//! - Session creation, authenticated and guest (`/chat`, `/chat/public`)
//! - Message append on both surfaces
//! - Status/priority updates and mark-read
//! - Health check (`/health`)

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer: the widget is embedded on arbitrary pages
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // admin/visitor routes
        .route("/chat", get(handlers::list_sessions).post(handlers::create_chat))
        .route("/chat/unread", get(handlers::unread_summary))
        .route("/chat/:id", get(handlers::get_session))
        .route("/chat/:id/message", post(handlers::post_message))
        .route("/chat/:id/status", put(handlers::update_status))
        .route("/chat/:id/priority", put(handlers::update_priority))
        .route("/chat/:id/read", post(handlers::mark_read))
        // public guest routes (no cookie/token auth)
        .route("/chat/public", post(handlers::create_guest_chat))
        .route("/chat/public/:id", get(handlers::get_guest_session))
        .route("/chat/public/:id/message", post(handlers::post_guest_message))
        // observability
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
