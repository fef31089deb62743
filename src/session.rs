//! Process-wide authentication state. Screens receive this by injection
//! rather than reaching for an ambient client, and route guards subscribe to
//! the change channel to redirect the moment the session goes away.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::info;

use crate::backend::{AuthProvider, BackendError, Session};
use crate::model::TenantId;

const CHANNEL_CAPACITY: usize = 16;

/// A change notification: `Some(tenant)` after sign-in/sign-up,
/// `None` after sign-out.
pub type SessionChanged = Option<TenantId>;

pub struct SessionState {
    auth: Arc<dyn AuthProvider>,
    current: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionChanged>,
}

impl SessionState {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            auth,
            current: RwLock::new(None),
            changes: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Pull the provider's current session at boot. Does not emit: there
    /// was no change, only discovery of the starting state.
    pub async fn init(&self) -> Result<(), BackendError> {
        let session = self.auth.session().await?;
        *self.current.write().await = session;
        Ok(())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let session = self.auth.sign_in(email, password).await?;
        *self.current.write().await = Some(session.clone());
        self.emit(Some(session.tenant.clone()));
        info!(tenant = %session.tenant, "signed in");
        Ok(session)
    }

    /// `None` means the provider wants email confirmation first; state is
    /// only updated once a session actually exists.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, BackendError> {
        let session = self.auth.sign_up(email, password).await?;
        if let Some(session) = &session {
            *self.current.write().await = Some(session.clone());
            self.emit(Some(session.tenant.clone()));
            info!(tenant = %session.tenant, "signed up");
        }
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), BackendError> {
        self.auth.sign_out().await?;
        *self.current.write().await = None;
        self.emit(None);
        info!("signed out");
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), BackendError> {
        self.auth.reset_password(email).await
    }

    pub async fn session(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// The authenticated tenant, the only thing most screens need.
    pub async fn tenant(&self) -> Option<TenantId> {
        self.current.read().await.as_ref().map(|s| s.tenant.clone())
    }

    /// Subscribe to session changes. Dropping the receiver unsubscribes;
    /// there is nothing else to tear down.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChanged> {
        self.changes.subscribe()
    }

    fn emit(&self, change: SessionChanged) {
        // No-op when nobody is listening.
        let _ = self.changes.send(change);
    }
}
