//! services/client/src/adapters/firebase/auth.rs
//!
//! Email/password accounts through the Identity Toolkit REST API.

use super::{read_json, FirebaseEndpoints};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crybaby_core::domain::AuthUser;
use crybaby_core::ports::{AuthProvider, AuthStateStream, PortError, PortResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Clone)]
struct Tokens {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordAuthResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

fn expiry_from(expires_in: &str) -> DateTime<Utc> {
    let secs = expires_in.parse::<i64>().unwrap_or(3600);
    Utc::now() + Duration::seconds(secs - EXPIRY_MARGIN_SECS)
}

pub struct FirebaseAuth {
    http: Client,
    api_key: String,
    endpoints: FirebaseEndpoints,
    state: watch::Sender<Option<AuthUser>>,
    tokens: RwLock<Option<Tokens>>,
}

impl FirebaseAuth {
    pub fn new(http: Client, api_key: impl Into<String>, endpoints: FirebaseEndpoints) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            http,
            api_key: api_key.into(),
            endpoints,
            state,
            tokens: RwLock::new(None),
        }
    }

    pub fn endpoints(&self) -> &FirebaseEndpoints {
        &self.endpoints
    }

    /// The signed-in user's ID token, refreshed first if it is about to expire.
    pub async fn id_token(&self) -> PortResult<String> {
        let current = self
            .tokens
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| PortError::Unauthorized("Not signed in".to_string()))?;

        if current.expires_at > Utc::now() {
            return Ok(current.id_token);
        }

        debug!("ID token expired, refreshing");
        let url = format!(
            "{}/token?key={}",
            self.endpoints.secure_token,
            urlencoding::encode(&self.api_key)
        );
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let value = read_json(response).await?;
        let refreshed: RefreshResponse =
            serde_json::from_value(value).map_err(|e| PortError::Malformed(e.to_string()))?;

        let tokens = Tokens {
            id_token: refreshed.id_token.clone(),
            refresh_token: refreshed.refresh_token,
            expires_at: expiry_from(&refreshed.expires_in),
        };
        *self.tokens.write().unwrap_or_else(|p| p.into_inner()) = Some(tokens);
        Ok(refreshed.id_token)
    }

    async fn password_call(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> PortResult<AuthUser> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.endpoints.identity_toolkit,
            action,
            urlencoding::encode(&self.api_key)
        );
        let response = self
            .http
            .post(&url)
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true
            }))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Identity Toolkit reports bad credentials as 400s; keep its message for the user.
        let value = read_json(response).await.map_err(|e| match e {
            PortError::NotFound(m) | PortError::Unauthorized(m) => PortError::Provider(m),
            other => other,
        })?;
        let auth: PasswordAuthResponse =
            serde_json::from_value(value).map_err(|e| PortError::Malformed(e.to_string()))?;

        let user = AuthUser {
            uid: auth.local_id,
            email: auth.email.or_else(|| Some(email.to_string())),
        };
        *self.tokens.write().unwrap_or_else(|p| p.into_inner()) = Some(Tokens {
            id_token: auth.id_token,
            refresh_token: auth.refresh_token,
            expires_at: expiry_from(&auth.expires_in),
        });
        self.state.send_replace(Some(user.clone()));
        info!("Signed in as {}", user.uid);
        Ok(user)
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn create_account(&self, email: &str, password: &str) -> PortResult<AuthUser> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthUser> {
        self.password_call("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> PortResult<()> {
        *self.tokens.write().unwrap_or_else(|p| p.into_inner()) = None;
        self.state.send_replace(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    fn auth_state_changes(&self) -> AuthStateStream {
        crate::adapters::auth_state_stream(self.state.subscribe())
    }
}
