use skirmish_core::core_match::PlayerId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::PlayerProfile;
use crate::error::{ApiError, ApiResult};

/// Session token -> participant session data
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub player_id: PlayerId,
    pub nickname: String,
}

/// Manages active participant sessions
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn create_session(&self, profile: &PlayerProfile) -> String {
        let token = Uuid::new_v4().to_string();

        let session = Session {
            token: token.clone(),
            player_id: PlayerId::new(profile.id.clone()),
            nickname: profile.nickname.clone(),
        };
        self.sessions.write().await.insert(token.clone(), session);
        token
    }

    pub async fn get_session(&self, token: &str) -> ApiResult<Session> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(ApiError::InvalidSession)
    }

    pub async fn remove_session(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// Drop every session belonging to a participant. Used when the account
    /// is deleted so stale tokens cannot keep acting for it.
    pub async fn remove_player_sessions(&self, player_id: &PlayerId) {
        self.sessions
            .write()
            .await
            .retain(|_, s| &s.player_id != player_id);
    }

    /// Refresh the cached nickname on every session of a participant
    pub async fn rename_player(&self, player_id: &PlayerId, nickname: &str) {
        let mut sessions = self.sessions.write().await;
        for session in sessions.values_mut() {
            if &session.player_id == player_id {
                session.nickname = nickname.to_string();
            }
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
