use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use skirmish_core::core_match::{LeaveOutcome, Match, MatchId, Player, PlayerId};

use crate::error::{ApiError, ApiResult};
use crate::routes::AppState;
use crate::session::Session;

// ===== Wire types =====

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: String,
    pub nickname: String,
    pub match_id: Option<String>,
    pub role: String,
    pub score: i64,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.to_string(),
            nickname: p.nickname.clone(),
            match_id: p.match_id.as_ref().map(|m| m.to_string()),
            role: p.role.as_str().to_string(),
            score: p.score,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchView {
    pub id: String,
    pub title: String,
    pub creator_id: String,
    pub max_players: usize,
    pub players: Vec<PlayerView>,
}

impl From<&Match> for MatchView {
    fn from(m: &Match) -> Self {
        Self {
            id: m.id.to_string(),
            title: m.title.clone(),
            creator_id: m.creator_id.to_string(),
            max_players: m.max_players,
            players: m.players.iter().map(PlayerView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub player: PlayerView,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub nickname: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub nickname: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub points: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub score: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveResponse {
    pub outcome: String,
}

// ===== Authentication plumbing =====

fn bearer(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::InvalidSession)
}

pub(crate) async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Session> {
    let token = bearer(headers)?;
    state.sessions.get_session(token).await
}

// ===== Account handlers =====

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("password must not be empty".into()));
    }

    // The store's unique nickname constraint is the authority on duplicates.
    let player = state.engine.register_player(&req.nickname)?;

    let profile = match state
        .auth
        .create_profile(player.id.as_str(), &player.nickname, &req.password)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            // Credential write failed; do not leave an orphaned participant.
            let _ = state.engine.delete_participant(&player.id).await;
            return Err(e);
        }
    };
    let token = state.sessions.create_session(&profile).await;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            player: PlayerView::from(&player),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let profile = state.auth.unlock(&req.nickname, &req.password).await?;
    let player = state
        .engine
        .store()
        .get_player(&PlayerId::new(profile.id.clone()))?;
    let token = state.sessions.create_session(&profile).await;

    Ok(Json(AuthResponse {
        token,
        player: PlayerView::from(&player),
    }))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let token = bearer(&headers)?;
    state.sessions.remove_session(token).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn edit_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EditRequest>,
) -> ApiResult<Json<PlayerView>> {
    let session = authenticate(&state, &headers).await?;
    if req.nickname.is_none() && req.password.is_none() {
        return Err(ApiError::BadRequest(
            "nickname or password required".into(),
        ));
    }

    let current = state.engine.store().get_player(&session.player_id)?;
    let player = match req.nickname.as_deref() {
        Some(nickname) => {
            state
                .engine
                .update_nickname(&session.player_id, nickname)
                .await?
        }
        None => current.clone(),
    };

    if let Err(e) = state
        .auth
        .update_profile(
            session.player_id.as_str(),
            req.nickname.as_deref(),
            req.password.as_deref(),
        )
        .await
    {
        // Keep the membership store and the credential profile in step:
        // undo the durable rename when the profile write fails.
        if req.nickname.is_some() {
            let _ = state
                .engine
                .update_nickname(&session.player_id, &current.nickname)
                .await;
        }
        return Err(e);
    }

    if let Some(nickname) = req.nickname.as_deref() {
        state.sessions.rename_player(&session.player_id, nickname).await;
    }

    Ok(Json(PlayerView::from(&player)))
}

pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let session = authenticate(&state, &headers).await?;

    state.engine.delete_participant(&session.player_id).await?;
    state.auth.delete_profile(session.player_id.as_str()).await?;
    state.sessions.remove_player_sessions(&session.player_id).await;

    Ok(StatusCode::NO_CONTENT)
}

// ===== Match handlers =====

pub async fn list_matches(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<MatchView>>> {
    authenticate(&state, &headers).await?;
    let matches = state.engine.list()?;
    Ok(Json(matches.iter().map(MatchView::from).collect()))
}

pub async fn create_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateMatchRequest>,
) -> ApiResult<(StatusCode, Json<MatchView>)> {
    let session = authenticate(&state, &headers).await?;
    let m = state.engine.create(&session.player_id, &req.title).await?;
    Ok((StatusCode::CREATED, Json(MatchView::from(&m))))
}

pub async fn join_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<MatchView>> {
    let session = authenticate(&state, &headers).await?;
    let m = state
        .engine
        .join(&session.player_id, &MatchId::new(id))
        .await?;
    Ok(Json(MatchView::from(&m)))
}

pub async fn leave_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<LeaveResponse>> {
    let session = authenticate(&state, &headers).await?;
    let outcome = state
        .engine
        .leave(&session.player_id, &MatchId::new(id))
        .await?;

    let outcome = match outcome {
        LeaveOutcome::Left => "left",
        LeaveOutcome::Dissolved => "dissolved",
    };
    Ok(Json(LeaveResponse {
        outcome: outcome.to_string(),
    }))
}

pub async fn kick_player(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(player_id): Path<String>,
) -> ApiResult<Json<PlayerView>> {
    let session = authenticate(&state, &headers).await?;
    let kicked = state
        .engine
        .kick(&session.player_id, &PlayerId::new(player_id))
        .await?;
    Ok(Json(PlayerView::from(&kicked)))
}

pub async fn increment_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ScoreRequest>,
) -> ApiResult<Json<ScoreResponse>> {
    let session = authenticate(&state, &headers).await?;
    let score = state
        .engine
        .increment_score(&session.player_id, req.points)
        .await?;
    Ok(Json(ScoreResponse { score }))
}
