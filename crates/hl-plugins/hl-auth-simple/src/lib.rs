//! # hl-auth-simple
//!
//! In-process implementations of the `Authing` and `Sessioning`
//! collaborators. Passwords are hashed with Argon2 and never leave
//! this crate; sessions are opaque UUID tokens in a concurrent map.
//! Both registries are process-local — restarting the server logs
//! everyone out, which is acceptable for this deployment.

use async_trait::async_trait;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use dashmap::DashMap;
use hl_core::error::{AppError, Result};
use hl_core::models::User;
use hl_core::traits::{Authing, Sessioning};
use uuid::Uuid;

struct UserRecord {
    user: User,
    password_hash: String,
}

/// Argon2-backed user registry.
#[derive(Default)]
pub struct SimpleAuth {
    users: DashMap<Uuid, UserRecord>,
    // Username -> id index; usernames are unique.
    by_name: DashMap<String, Uuid>,
}

impl SimpleAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    fn verify(password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[async_trait]
impl Authing for SimpleAuth {
    async fn create(&self, username: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "username and password must not be empty".into(),
            ));
        }
        if self.by_name.contains_key(username) {
            return Err(AppError::Conflict(format!("username '{}' is taken", username)));
        }

        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
        };
        let record = UserRecord {
            user: user.clone(),
            password_hash: Self::hash_password(password)?,
        };
        self.by_name.insert(username.to_string(), user.id);
        self.users.insert(user.id, record);
        log::info!("registered user {}", user.username);
        Ok(user)
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let id = self
            .by_name
            .get(username)
            .map(|e| *e.value())
            .ok_or_else(|| AppError::Unauthorized("invalid username or password".into()))?;
        let record = self
            .users
            .get(&id)
            .ok_or_else(|| AppError::Unauthorized("invalid username or password".into()))?;

        if !Self::verify(password, &record.password_hash) {
            return Err(AppError::Unauthorized("invalid username or password".into()));
        }
        Ok(record.user.clone())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<User> {
        self.users
            .get(&id)
            .map(|r| r.user.clone())
            .ok_or_else(|| AppError::not_found("User", id))
    }

    async fn user_by_username(&self, username: &str) -> Result<User> {
        let id = self
            .by_name
            .get(username)
            .map(|e| *e.value())
            .ok_or_else(|| AppError::not_found("User", username))?;
        self.user_by_id(id).await
    }
}

/// Opaque-token session registry.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Uuid>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Sessioning for SessionRegistry {
    async fn start(&self, user: Uuid) -> Result<Uuid> {
        let token = Uuid::now_v7();
        self.sessions.insert(token, user);
        Ok(token)
    }

    async fn end(&self, token: Uuid) -> Result<()> {
        // Ending twice is a no-op.
        self.sessions.remove(&token);
        Ok(())
    }

    async fn user_for(&self, token: Uuid) -> Result<Uuid> {
        self.sessions
            .get(&token)
            .map(|e| *e.value())
            .ok_or_else(|| AppError::Unauthorized("no active session".into()))
    }

    async fn is_logged_out(&self, token: Uuid) -> bool {
        !self.sessions.contains_key(&token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let auth = SimpleAuth::new();
        let user = auth.create("alice", "hunter2").await.unwrap();

        let again = auth.authenticate("alice", "hunter2").await.unwrap();
        assert_eq!(again.id, user.id);

        let err = auth.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = auth.authenticate("nobody", "hunter2").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_password_hashes_are_salted() {
        // Same password, different users: the OS-random salt must make
        // the stored hashes differ.
        let h1 = SimpleAuth::hash_password("hunter2").unwrap();
        let h2 = SimpleAuth::hash_password("hunter2").unwrap();
        assert_ne!(h1, h2);
        assert!(SimpleAuth::verify("hunter2", &h1));
        assert!(SimpleAuth::verify("hunter2", &h2));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let auth = SimpleAuth::new();
        auth.create("bob", "pw").await.unwrap();
        let err = auth.create("bob", "pw2").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_lookup_by_username() {
        let auth = SimpleAuth::new();
        let user = auth.create("carol", "pw").await.unwrap();
        assert_eq!(auth.user_by_username("carol").await.unwrap().id, user.id);
        assert!(matches!(
            auth.user_by_username("dave").await.unwrap_err(),
            AppError::NotFound(_, _)
        ));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let sessions = SessionRegistry::new();
        let user = Uuid::now_v7();

        let token = sessions.start(user).await.unwrap();
        assert!(!sessions.is_logged_out(token).await);
        assert_eq!(sessions.user_for(token).await.unwrap(), user);

        sessions.end(token).await.unwrap();
        sessions.end(token).await.unwrap(); // idempotent
        assert!(sessions.is_logged_out(token).await);
        assert!(matches!(
            sessions.user_for(token).await.unwrap_err(),
            AppError::Unauthorized(_)
        ));
    }
}
