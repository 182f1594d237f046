use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult};

/// Credential profile for a registered participant. The participant id
/// doubles as the profile id so the membership store stays the single
/// source of truth for identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: String,
    pub nickname: String,
    pub password_hash: String,
}

/// Manages participant profiles and password-based authentication
pub struct AuthManager {
    profiles: Arc<RwLock<HashMap<String, PlayerProfile>>>,
    profiles_dir: PathBuf,
}

impl AuthManager {
    pub fn new() -> Self {
        let profiles_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skirmish")
            .join("profiles");

        Self::with_profiles_dir(profiles_dir)
    }

    pub fn with_profiles_dir(profiles_dir: PathBuf) -> Self {
        std::fs::create_dir_all(&profiles_dir).ok();

        let loaded = Self::load_profiles(&profiles_dir);
        Self {
            profiles: Arc::new(RwLock::new(loaded)),
            profiles_dir,
        }
    }

    fn load_profiles(profiles_dir: &Path) -> HashMap<String, PlayerProfile> {
        let mut loaded = HashMap::new();
        if let Ok(entries) = std::fs::read_dir(profiles_dir) {
            for entry in entries.flatten() {
                if let Ok(data) = std::fs::read_to_string(entry.path()) {
                    if let Ok(profile) = serde_json::from_str::<PlayerProfile>(&data) {
                        loaded.insert(profile.id.clone(), profile);
                    }
                }
            }
        }
        loaded
    }

    pub async fn create_profile(
        &self,
        id: &str,
        nickname: &str,
        password: &str,
    ) -> ApiResult<PlayerProfile> {
        if password.is_empty() {
            return Err(ApiError::BadRequest("password must not be empty".into()));
        }

        let profile = PlayerProfile {
            id: id.to_string(),
            nickname: nickname.to_string(),
            password_hash: hash_password(password)?,
        };

        self.save_profile(&profile).await?;
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile.clone());

        Ok(profile)
    }

    /// Verify a nickname/password pair, returning the matching profile
    pub async fn unlock(&self, nickname: &str, password: &str) -> ApiResult<PlayerProfile> {
        let profiles = self.profiles.read().await;
        let profile = profiles
            .values()
            .find(|p| p.nickname == nickname)
            .ok_or_else(|| ApiError::AuthenticationFailed("Unknown nickname".to_string()))?;

        let parsed_hash = PasswordHash::new(&profile.password_hash)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::AuthenticationFailed("Invalid password".to_string()))?;

        Ok(profile.clone())
    }

    /// Update nickname and/or password for an existing profile.
    ///
    /// The in-memory map only changes once the file write succeeded, so a
    /// failed save leaves the old credentials fully intact.
    pub async fn update_profile(
        &self,
        id: &str,
        nickname: Option<&str>,
        password: Option<&str>,
    ) -> ApiResult<PlayerProfile> {
        let mut profiles = self.profiles.write().await;
        let mut updated = profiles.get(id).cloned().ok_or(ApiError::InvalidSession)?;

        if let Some(nickname) = nickname {
            updated.nickname = nickname.to_string();
        }
        if let Some(password) = password {
            if password.is_empty() {
                return Err(ApiError::BadRequest("password must not be empty".into()));
            }
            updated.password_hash = hash_password(password)?;
        }

        self.save_profile(&updated).await?;
        profiles.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    pub async fn delete_profile(&self, id: &str) -> ApiResult<()> {
        self.profiles.write().await.remove(id);
        let path = self.profiles_dir.join(format!("{}.json", id));
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn nickname_taken(&self, nickname: &str) -> bool {
        self.profiles
            .read()
            .await
            .values()
            .any(|p| p.nickname == nickname)
    }

    async fn save_profile(&self, profile: &PlayerProfile) -> ApiResult<()> {
        let path = self.profiles_dir.join(format!("{}.json", profile.id));
        let data = serde_json::to_string_pretty(profile)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string())
}
