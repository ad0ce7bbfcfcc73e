use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::accounts;
use crate::app_state::AppState;
use crate::ws;

/// Build the full router: signaling socket, account API and the browser client.
pub fn build_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/accounts", post(accounts::create_account))
        .route("/api/login", post(accounts::login))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
