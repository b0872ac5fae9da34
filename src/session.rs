//! Session (authentication) handling.
//!
//! Authentication itself is delegated; the core only asks "who is the
//! current user?". Locally the user is resolved in this order:
//! 1) CLI --user (explicit, also read from BCSTART_USER by clap)
//! 2) BCSTART_USER environment variable
//! 3) Persisted session in `<data-dir>/session.json`
//! 4) Config default (`session.default_user`)
//!
//! No match means no session, and every service call fails with
//! `AuthenticationRequired`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

const SESSION_FILENAME: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_user(&self) -> Option<User>;
}

/// A session fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    user: Option<User>,
}

impl StaticSession {
    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_user(&self) -> Option<User> {
        self.user.clone()
    }
}

/// Fail fast with `AuthenticationRequired` when nobody is signed in.
pub async fn require_user(session: &dyn SessionProvider) -> Result<User> {
    let user = session
        .current_user()
        .await
        .ok_or(Error::AuthenticationRequired)?;
    if user.id.trim().is_empty() {
        return Err(Error::AuthenticationRequired);
    }
    Ok(user)
}

/// Resolve the local user from CLI, environment, persisted session and config.
pub fn resolve_user(
    storage: &Storage,
    cli_user: Option<&str>,
    config: &Config,
) -> Result<Option<User>> {
    if let Some(id) = non_empty(cli_user) {
        return Ok(Some(User::new(id)));
    }

    if let Ok(env_user) = std::env::var("BCSTART_USER") {
        if let Some(id) = non_empty(Some(env_user.as_str())) {
            return Ok(Some(User::new(id)));
        }
    }

    if let Some(user) = load_persisted_session(storage.root())? {
        return Ok(Some(user));
    }

    Ok(non_empty(config.session.default_user.as_deref()).map(User::new))
}

/// Persist the signed-in user in `<data-dir>/session.json`.
pub fn persist_session(storage: &Storage, user: &User) -> Result<()> {
    if non_empty(Some(&user.id)).is_none() {
        return Err(Error::InvalidArgument("user id cannot be empty".to_string()));
    }
    storage.write_json(&session_path(storage.root()), user)
}

/// Remove the persisted session. Returns whether one existed.
pub fn clear_session(storage: &Storage) -> Result<bool> {
    let path = session_path(storage.root());
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)?;
    Ok(true)
}

pub fn load_persisted_session(data_dir: &Path) -> Result<Option<User>> {
    let path = session_path(data_dir);
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let user: User = serde_json::from_str(&raw)?;
    if user.id.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(user))
}

fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILENAME)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn anonymous_session_requires_authentication() {
        let err = require_user(&StaticSession::anonymous())
            .await
            .expect_err("no session");
        assert!(matches!(err, Error::AuthenticationRequired));
    }

    #[tokio::test]
    async fn blank_user_id_is_not_a_session() {
        let session = StaticSession::signed_in(User::new("  "));
        assert!(require_user(&session).await.is_err());
    }

    #[test]
    fn persisted_session_round_trips_and_clears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        let user = User {
            id: "founder".to_string(),
            email: Some("founder@example.com".to_string()),
        };
        persist_session(&storage, &user).expect("persist");
        assert_eq!(
            load_persisted_session(storage.root()).expect("load"),
            Some(user)
        );
        assert!(clear_session(&storage).expect("clear"));
        assert!(!clear_session(&storage).expect("clear again"));
    }

    #[test]
    fn cli_user_wins_over_config_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        let mut config = Config::default();
        config.session.default_user = Some("from-config".to_string());

        let user = resolve_user(&storage, Some("from-cli"), &config).expect("resolve");
        assert_eq!(user.map(|u| u.id).as_deref(), Some("from-cli"));
    }
}
