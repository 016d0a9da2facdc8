// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{live, live_ws},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges the live session REST routes and the session socket.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (live engine, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let live_routes = Router::new()
        .route("/join", post(live::join_session))
        .route("/sessions/{pin}", get(live::session_snapshot))
        // Only a signed-in quiz owner may open a session
        .merge(
            Router::new()
                .route("/quizzes/{quiz_id}/sessions", post(live::create_session))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    Router::new()
        .nest("/api/live", live_routes)
        .route("/ws/live/{pin}", get(live_ws::live_socket))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
