//! Session/auth manager.
//!
//! [`SessionManager`] is the explicit session context handed to whatever needs
//! to know who is signed in. Its lifecycle is
//! `Loading -> {Anonymous, Authenticated}`, and `Authenticated -> Anonymous` on
//! logout or when the backend pushes a sign-out.

mod visitor;

pub use visitor::*;

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;

use crate::backend::{AuthClient, AuthEvent, BackendError};
use crate::lifecycle::Scope;
use crate::models::User;

/// Resolved authentication state of one client context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Anonymous,
    Authenticated(User),
}

/// A login attempt was refused.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LoginError {
    /// Text shown to the operator
    pub message: String,
    /// Raw backend message, for logs
    pub detail: Option<String>,
}

impl LoginError {
    fn missing_fields() -> Self {
        Self {
            message: "Email and password are required.".to_string(),
            detail: None,
        }
    }

    fn interrupted() -> Self {
        Self {
            message: "Login was interrupted. Please try again.".to_string(),
            detail: None,
        }
    }

    pub fn from_backend(err: &BackendError) -> Self {
        let detail = match err {
            BackendError::Api {
                code: Some(code),
                message,
                ..
            } => format!("{} ({})", message, code),
            other => other.to_string(),
        };
        Self {
            message: friendly_login_message(&detail).to_string(),
            detail: Some(detail),
        }
    }
}

/// Map a backend auth failure onto the small set of messages operators see.
pub fn friendly_login_message(backend_message: &str) -> &'static str {
    let lower = backend_message.to_lowercase();
    if lower.contains("invalid login credentials")
        || lower.contains("invalid_credentials")
        || lower.contains("invalid_grant")
    {
        "Invalid email or password. Please try again."
    } else if lower.contains("email not confirmed") || lower.contains("email_not_confirmed") {
        "Please confirm your email address before signing in."
    } else if lower.contains("rate limit")
        || lower.contains("too many requests")
        || lower.contains("security purposes")
    {
        "Too many login attempts. Please wait a moment and try again."
    } else {
        "Login failed. Please try again."
    }
}

#[derive(Debug)]
struct SessionState {
    auth: AuthState,
    login_in_flight: bool,
}

/// Session context for one client.
#[derive(Clone)]
pub struct SessionManager {
    auth: AuthClient,
    state: Arc<RwLock<SessionState>>,
    scope: Scope,
}

impl SessionManager {
    pub fn new(auth: AuthClient, scope: Scope) -> Self {
        Self {
            auth,
            state: Arc::new(RwLock::new(SessionState {
                auth: AuthState::Loading,
                login_in_flight: false,
            })),
            scope,
        }
    }

    /// Resolve the existing session (if any) and start following session
    /// changes. Loading ends whatever the outcome.
    pub async fn init(&self) {
        self.watch();

        match self.scope.run(self.auth.get_session()).await {
            None => {}
            Some(Ok(Some(session))) => {
                self.set_auth(AuthState::Authenticated(session.user));
            }
            Some(Ok(None)) => self.set_auth(AuthState::Anonymous),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "Could not resolve current session");
                self.set_auth(AuthState::Anonymous);
            }
        }
    }

    /// Follow pushed session changes until the scope is torn down.
    fn watch(&self) {
        let mut events = self.auth.on_auth_state_change();
        let manager = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = manager.scope.torn_down() => break,
                    event = events.recv() => match event {
                        Ok(AuthEvent::SignedIn(user)) => {
                            tracing::debug!(user_id = %user.id, "Session signed in");
                            manager.sync_from_auth();
                        }
                        Ok(AuthEvent::SignedOut) => {
                            tracing::debug!("Session signed out");
                            manager.sync_from_auth();
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Session events lagged");
                            manager.sync_from_auth();
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    /// Re-derive the state from the auth client's session. Events only say
    /// "something changed", so a stale event can never resurrect a session.
    fn sync_from_auth(&self) {
        let next = match self.auth.current_user() {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Anonymous,
        };
        self.set_auth(next);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_auth(&self, auth: AuthState) {
        self.write().auth = auth;
    }

    pub fn state(&self) -> AuthState {
        self.read().auth.clone()
    }

    pub fn user(&self) -> Option<User> {
        match &self.read().auth {
            AuthState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.read().auth, AuthState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        let state = self.read();
        state.auth == AuthState::Loading || state.login_in_flight
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, LoginError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(LoginError::missing_fields());
        }

        self.write().login_in_flight = true;
        let result = self
            .scope
            .run(self.auth.sign_in_with_password(email, password))
            .await;
        self.write().login_in_flight = false;

        match result {
            Some(Ok(session)) => {
                tracing::info!(user_id = %session.user.id, "Admin signed in");
                self.sync_from_auth();
                Ok(session.user)
            }
            Some(Err(err)) => {
                let err = LoginError::from_backend(&err);
                tracing::warn!(detail = ?err.detail, "Admin sign-in refused");
                Err(err)
            }
            None => Err(LoginError::interrupted()),
        }
    }

    /// Re-check the held session, refreshing an expired token. A session that
    /// cannot be kept ends anonymous; a transient failure keeps it.
    pub async fn revalidate(&self) -> AuthState {
        if let Some(Err(err)) = self.scope.run(self.auth.get_session()).await {
            tracing::warn!(error = %err, "Could not revalidate session");
        }
        self.sync_from_auth();
        self.state()
    }

    /// Sign out. Local state is cleared even when the backend call fails.
    pub async fn logout(&self) {
        if let Err(err) = self.auth.sign_out().await {
            tracing::warn!(error = %err, "Backend sign-out failed; clearing local session anyway");
        }
        self.set_auth(AuthState::Anonymous);
    }

    /// Stop following session changes.
    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Client;
    use crate::testing::FakeBackend;

    async fn manager(fake: &FakeBackend) -> SessionManager {
        let client = Client::new(fake.backend());
        let manager = SessionManager::new(client.auth().clone(), Scope::new());
        manager.init().await;
        manager
    }

    #[test]
    fn test_friendly_login_messages() {
        assert_eq!(
            friendly_login_message("Invalid login credentials"),
            "Invalid email or password. Please try again."
        );
        assert_eq!(
            friendly_login_message("Email not confirmed"),
            "Please confirm your email address before signing in."
        );
        assert_eq!(
            friendly_login_message("Request rate limit reached"),
            "Too many login attempts. Please wait a moment and try again."
        );
        assert_eq!(
            friendly_login_message("For security purposes, you can only request this after 30 seconds."),
            "Too many login attempts. Please wait a moment and try again."
        );
        assert_eq!(
            friendly_login_message("Database error granting user"),
            "Login failed. Please try again."
        );
    }

    #[tokio::test]
    async fn test_init_without_session_is_anonymous() {
        let fake = FakeBackend::start().await;
        let manager = manager(&fake).await;
        assert_eq!(manager.state(), AuthState::Anonymous);
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn test_fresh_manager_is_loading() {
        let fake = FakeBackend::start().await;
        let client = Client::new(fake.backend());
        let manager = SessionManager::new(client.auth().clone(), Scope::new());
        assert!(manager.is_loading());
        assert!(!manager.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_success() {
        let fake = FakeBackend::start().await;
        fake.add_user("admin@ivoke.in", "s3cret");
        let manager = manager(&fake).await;

        let user = manager.login("  admin@ivoke.in ", "s3cret").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("admin@ivoke.in"));
        assert!(manager.is_logged_in());
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let fake = FakeBackend::start().await;
        fake.add_user("admin@ivoke.in", "s3cret");
        let manager = manager(&fake).await;

        let err = manager.login("admin@ivoke.in", "wrong").await.unwrap_err();
        assert_eq!(err.message, "Invalid email or password. Please try again.");
        assert!(!manager.is_logged_in());
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn test_login_unconfirmed_and_rate_limited() {
        let fake = FakeBackend::start().await;
        fake.add_unconfirmed_user("new@ivoke.in", "pw");
        let manager = manager(&fake).await;

        let err = manager.login("new@ivoke.in", "pw").await.unwrap_err();
        assert_eq!(
            err.message,
            "Please confirm your email address before signing in."
        );

        fake.set_rate_limited(true);
        let err = manager.login("new@ivoke.in", "pw").await.unwrap_err();
        assert_eq!(
            err.message,
            "Too many login attempts. Please wait a moment and try again."
        );
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let fake = FakeBackend::start().await;
        let manager = manager(&fake).await;

        let err = manager.login("   ", "pw").await.unwrap_err();
        assert_eq!(err.message, "Email and password are required.");
        assert_eq!(fake.count("POST", "/auth/v1/token"), 0);
    }

    #[tokio::test]
    async fn test_logout_clears_state_even_when_backend_fails() {
        let fake = FakeBackend::start().await;
        fake.add_user("admin@ivoke.in", "s3cret");
        let manager = manager(&fake).await;
        manager.login("admin@ivoke.in", "s3cret").await.unwrap();

        fake.fail_logout(true);
        manager.logout().await;

        assert!(!manager.is_logged_in());
        assert_eq!(manager.state(), AuthState::Anonymous);
        assert_eq!(fake.count("POST", "/auth/v1/logout"), 1);
    }

    #[tokio::test]
    async fn test_pushed_sign_out_reaches_manager() {
        let fake = FakeBackend::start().await;
        fake.add_user("admin@ivoke.in", "s3cret");
        fake.set_token_ttl(0);
        let client = Client::new(fake.backend());
        let manager = SessionManager::new(client.auth().clone(), Scope::new());
        manager.init().await;
        manager.login("admin@ivoke.in", "s3cret").await.unwrap();

        // Expired token, refresh refused: the auth client pushes SignedOut.
        fake.set_refresh_allowed(false);
        let session = client.auth().get_session().await.unwrap();
        assert!(session.is_none());

        for _ in 0..50 {
            if !manager.is_logged_in() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(manager.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_revalidate_drops_unrefreshable_session() {
        let fake = FakeBackend::start().await;
        fake.add_user("admin@ivoke.in", "s3cret");
        let manager = manager(&fake).await;
        manager.login("admin@ivoke.in", "s3cret").await.unwrap();

        assert!(matches!(manager.revalidate().await, AuthState::Authenticated(_)));

        fake.set_token_ttl(0);
        manager.login("admin@ivoke.in", "s3cret").await.unwrap();
        fake.set_refresh_allowed(false);
        assert_eq!(manager.revalidate().await, AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed() {
        let fake = FakeBackend::start().await;
        fake.add_user("admin@ivoke.in", "s3cret");
        fake.set_token_ttl(0);
        let client = Client::new(fake.backend());
        client
            .auth()
            .sign_in_with_password("admin@ivoke.in", "s3cret")
            .await
            .unwrap();

        fake.set_token_ttl(3600);
        let session = client.auth().get_session().await.unwrap().unwrap();
        assert_eq!(session.user.email.as_deref(), Some("admin@ivoke.in"));
        assert_eq!(fake.count("POST", "/auth/v1/token"), 2);
    }
}
