//! WebSocket roster gateway
//!
//! Clients authenticate with their session token (`/ws?token=...`), then
//! speak tagged JSON events. `join-room` subscribes the connection to a
//! match session; `update-score` publishes a new score to teammates. The
//! server pushes `players-update` and `scoreboard` events from the roster
//! broadcaster.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use skirmish_core::core_match::{MatchId, PlayerId};
use skirmish_core::core_roster::{ConnectionId, PlayerDescriptor, RosterUpdate};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::routes::AppState;
use crate::session::Session;

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum ClientEvent {
    JoinRoom { match_id: String },
    UpdateScore { player_id: String, score: i64 },
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let token = params.get("token").ok_or(ApiError::InvalidSession)?;
    let session = state.sessions.get_session(token).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, session)))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, session: Session) {
    let connection_id = ConnectionId::generate();
    debug!(connection = %connection_id, player = %session.player_id, "websocket connected");

    let mut joined: Option<MatchId> = None;
    let mut roster_rx: Option<UnboundedReceiver<RosterUpdate>> = None;

    loop {
        tokio::select! {
            update = recv_update(&mut roster_rx) => {
                match update {
                    Some(update) => {
                        let Ok(text) = serde_json::to_string(&update) else { continue };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    // Session evicted server-side; stop streaming but keep
                    // the connection for a later join-room.
                    None => roster_rx = None,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event = match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                warn!(connection = %connection_id, error = %e, "ignoring malformed client event");
                                continue;
                            }
                        };
                        handle_event(&state, &session, &connection_id, event, &mut joined, &mut roster_rx).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(connection = %connection_id, error = %e, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    state.broadcaster.disconnect(&connection_id).await;
    debug!(connection = %connection_id, "websocket disconnected");
}

async fn recv_update(rx: &mut Option<UnboundedReceiver<RosterUpdate>>) -> Option<RosterUpdate> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn handle_event(
    state: &AppState,
    session: &Session,
    connection_id: &ConnectionId,
    event: ClientEvent,
    joined: &mut Option<MatchId>,
    roster_rx: &mut Option<UnboundedReceiver<RosterUpdate>>,
) {
    match event {
        ClientEvent::JoinRoom { match_id } => {
            let match_id = MatchId::new(match_id);

            // The live roster tracks what the participant record says; a
            // deleted or never-registered participant cannot join a room.
            let score = match state.engine.store().get_player(&session.player_id) {
                Ok(player) => player.score,
                Err(e) => {
                    warn!(connection = %connection_id, error = %e, "join-room for unknown participant");
                    return;
                }
            };

            let descriptor = PlayerDescriptor {
                id: session.player_id.clone(),
                nickname: session.nickname.clone(),
            };
            let rx = state
                .broadcaster
                .join_room(connection_id.clone(), &match_id, descriptor, score)
                .await;
            *joined = Some(match_id);
            *roster_rx = Some(rx);
        }
        ClientEvent::UpdateScore { player_id, score } => {
            let Some(match_id) = joined else {
                debug!(connection = %connection_id, "update-score before join-room ignored");
                return;
            };
            state
                .broadcaster
                .update_score(match_id, &PlayerId::new(player_id), score)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_wire_format() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"join-room","match_id":"m1"}"#).unwrap();
        assert!(matches!(event, ClientEvent::JoinRoom { ref match_id } if match_id == "m1"));

        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"update-score","player_id":"p1","score":12}"#)
                .unwrap();
        assert!(
            matches!(event, ClientEvent::UpdateScore { ref player_id, score: 12 } if player_id == "p1")
        );
    }

    #[test]
    fn test_server_event_wire_format() {
        let update = RosterUpdate::Players(vec![]);
        let text = serde_json::to_string(&update).unwrap();
        assert!(text.contains(r#""event":"players-update""#));

        let update = RosterUpdate::Scoreboard(vec![]);
        let text = serde_json::to_string(&update).unwrap();
        assert!(text.contains(r#""event":"scoreboard""#));
    }
}
