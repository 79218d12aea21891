//! HTTP API module - status endpoints and the WebSocket room

mod websocket;

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::arena::Arena;
pub use websocket::{
    ClientMessage, ConnectionManager, PlayerSession, ServerMessage, SessionError,
};

/// The room every reply is posted to
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    /// Name the arena speaks as
    pub bot_name: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The single lock every command runs under
    pub arena: Arc<Mutex<Arena>>,
    pub connections: Arc<ConnectionManager>,
    pub room: Arc<Room>,
    pub shutdown: watch::Receiver<bool>,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/ws", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(RootResponse {
        name: "arenad",
        version: env!("CARGO_PKG_VERSION"),
        room: state.room.name.clone(),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
    room: String,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let players = state.arena.lock().player_count();
    let connections = state.connections.count().await;
    Json(HealthResponse {
        status: "healthy",
        players,
        connections,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    players: usize,
    connections: usize,
}
