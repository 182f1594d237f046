use axum::routing::{delete, get, post, put};
use axum::Router;
use skirmish_core::core_match::MatchEngine;
use skirmish_core::core_roster::RosterBroadcaster;
use std::sync::Arc;

use crate::auth::AuthManager;
use crate::handlers;
use crate::session::SessionManager;
use crate::sockets;

/// Shared state for every request handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
    pub broadcaster: Arc<RosterBroadcaster>,
    pub auth: Arc<AuthManager>,
    pub sessions: Arc<SessionManager>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/edit", put(handlers::edit_account))
        .route("/auth/account", delete(handlers::delete_account))
        .route("/matches", get(handlers::list_matches))
        .route("/matches/create", post(handlers::create_match))
        .route("/matches/:id/join", post(handlers::join_match))
        .route("/matches/:id/leave", post(handlers::leave_match))
        .route("/matches/kick/:player_id", post(handlers::kick_player))
        .route("/matches/score/increment", post(handlers::increment_score))
        .route("/ws", get(sockets::ws_handler))
        .with_state(state)
}
