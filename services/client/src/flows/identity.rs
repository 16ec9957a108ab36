//! services/client/src/flows/identity.rs
//!
//! Sign-up, sign-in, sign-out and session observation. The gateway owns the
//! view state machine: `Loading` until the first auth observation, then a fully
//! recomputed `LoggedOut`, `StudentView` or `ParentView` on every change.

use crate::error::{ClientError, ClientResult};
use chrono::Utc;
use crybaby_core::domain::{AuthUser, Identity, NewProfile, Role, ViewState};
use crybaby_core::ports::{AuthProvider, DatabaseService, View};
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const SIGN_UP_INVALID: &str = "Enter valid email & password (6+ chars)";
pub const SIGN_IN_INVALID: &str = "Please enter email and password";
pub const SIGN_UP_OK: &str = "Signup successful";

pub struct IdentityGateway {
    auth: Arc<dyn AuthProvider>,
    db: Arc<dyn DatabaseService>,
    view: Arc<dyn View>,
}

impl IdentityGateway {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        db: Arc<dyn DatabaseService>,
        view: Arc<dyn View>,
    ) -> Self {
        Self { auth, db, view }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user()
    }

    /// Creates the account and its profile record.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> ClientResult<Identity> {
        let email = email.trim();
        let password = password.trim();
        if email.is_empty() || password.chars().count() < MIN_PASSWORD_LEN {
            self.view.alert(SIGN_UP_INVALID);
            return Err(ClientError::Validation(SIGN_UP_INVALID.to_string()));
        }

        self.view.show_loader();
        let result = async {
            let user = self.auth.create_account(email, password).await?;
            let profile = NewProfile {
                email: email.to_string(),
                role,
                created_at: Utc::now(),
            };
            self.db.create_profile(&user.uid, &profile).await?;
            Ok::<_, ClientError>(Identity {
                id: user.uid,
                email: email.to_string(),
                role,
            })
        }
        .await;
        self.view.hide_loader();

        match result {
            Ok(identity) => {
                info!("Signed up {} as {}", identity.id, identity.role);
                self.view.alert(SIGN_UP_OK);
                Ok(identity)
            }
            Err(e) => {
                error!("Sign-up failed: {}", e);
                self.view.alert(&user_message(&e));
                Err(e)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthUser> {
        let email = email.trim();
        let password = password.trim();
        if email.is_empty() || password.is_empty() {
            self.view.alert(SIGN_IN_INVALID);
            return Err(ClientError::Validation(SIGN_IN_INVALID.to_string()));
        }

        self.view.show_loader();
        let result = self.auth.sign_in(email, password).await;
        self.view.hide_loader();

        result.map_err(|e| {
            error!("Sign-in failed: {}", e);
            self.view.alert(&e.to_string());
            ClientError::from(e)
        })
    }

    pub async fn sign_out(&self) -> ClientResult<()> {
        self.auth.sign_out().await.map_err(|e| {
            error!("Sign-out failed: {}", e);
            self.view.alert(&e.to_string());
            ClientError::from(e)
        })
    }

    /// Maps an auth observation to the state to display. A failed profile
    /// lookup falls back to the logged-out view.
    pub async fn resolve_view_state(&self, user: Option<&AuthUser>) -> ViewState {
        let Some(user) = user else {
            return ViewState::LoggedOut;
        };
        match self.db.get_profile(&user.uid).await {
            Ok(Some(profile)) if profile.role == Role::Parent => ViewState::ParentView,
            Ok(_) => ViewState::StudentView,
            Err(e) => {
                warn!("Profile lookup for {} failed: {}", user.uid, e);
                ViewState::LoggedOut
            }
        }
    }

    /// Spawns the session listener. It renders once for the current session and
    /// again after every sign-in or sign-out, until `cancel` fires.
    pub fn observe_session(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        self.view.show_state(ViewState::Loading);
        let mut changes = self.auth.auth_state_changes();
        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = changes.next() => next,
                };
                let Some(user) = next else {
                    info!("Auth state stream closed");
                    break;
                };
                let state = self.resolve_view_state(user.as_ref()).await;
                self.view.show_state(state);
            }
        })
    }
}

/// Platform messages are shown verbatim; anything else as its display form.
fn user_message(e: &ClientError) -> String {
    match e {
        ClientError::Port(port) => port.to_string(),
        other => other.to_string(),
    }
}
