//! Auth API primitives: session retrieval, password sign-in, sign-out and
//! session-change notifications.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;

use super::{check, Backend, BackendError};
use crate::models::{Session, TokenGrant, User};

/// Session change pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

const EVENT_CAPACITY: usize = 16;

/// Per-context auth client. Clones share the same session.
#[derive(Clone)]
pub struct AuthClient {
    backend: Backend,
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(backend: Backend) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Subscribe to `SignedIn` / `SignedOut` notifications.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub(super) fn access_token(&self) -> Option<String> {
        self.read_session().map(|s| s.access_token)
    }

    /// User of the locally held session, without checking expiry.
    pub fn current_user(&self) -> Option<User> {
        self.read_session().map(|s| s.user)
    }

    fn read_session(&self) -> Option<Session> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace_session(&self, session: Option<Session>) -> Option<Session> {
        let mut guard = match self.session.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, session)
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Current session. An expired session is refreshed; when that fails the
    /// session is dropped and `SignedOut` is pushed.
    pub async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(session) = self.read_session() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        let refreshed = match session.refresh_token.as_deref() {
            Some(refresh_token) => self.refresh(refresh_token).await.map(Some),
            None => Ok(None),
        };

        match refreshed {
            Ok(Some(fresh)) => {
                self.replace_session(Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Ok(None) => {
                tracing::info!("Session expired without a refresh token");
                self.replace_session(None);
                self.emit(AuthEvent::SignedOut);
                Ok(None)
            }
            Err(err) => {
                tracing::info!(error = %err, "Session expired and could not be refreshed");
                self.replace_session(None);
                self.emit(AuthEvent::SignedOut);
                Ok(None)
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, BackendError> {
        let request = self
            .backend
            .inner
            .http
            .post(self.backend.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));
        let response = check(self.backend.authorize(request, None).send().await?).await?;
        let grant: TokenGrant = response.json().await?;
        Ok(Session::from_grant(grant, Utc::now()))
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let request = self
            .backend
            .inner
            .http
            .post(self.backend.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = check(self.backend.authorize(request, None).send().await?).await?;
        let grant: TokenGrant = response.json().await?;
        let session = Session::from_grant(grant, Utc::now());

        self.replace_session(Some(session.clone()));
        self.emit(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    /// Drop the local session, then ask the backend to revoke its token.
    /// The local session is gone even when revocation fails.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        let previous = self.replace_session(None);
        self.emit(AuthEvent::SignedOut);

        let Some(session) = previous else {
            return Ok(());
        };
        let request = self
            .backend
            .inner
            .http
            .post(self.backend.auth_url("logout"));
        check(
            self.backend
                .authorize(request, Some(&session.access_token))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }
}
