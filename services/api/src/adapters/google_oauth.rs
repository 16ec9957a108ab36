//! services/api/src/adapters/google_oauth.rs
//!
//! The OAuth 2.0 authorization-code flow for Google Calendar and the on-disk
//! cache of the resulting token.

use super::read_google_json;
use crate::config::GoogleOAuthSettings;
use chrono::{DateTime, Duration, Utc};
use crybaby_core::ports::{PortError, PortResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const CALENDAR_EVENTS_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A cached OAuth token, in the same JSON layout other Google client
/// libraries write to `token.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn bearer() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    /// A token without an expiry never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry <= now + Duration::seconds(EXPIRY_MARGIN_SECS))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    /// Refresh responses usually omit the refresh token; the previous one stays valid.
    fn into_token(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(bearer),
            refresh_token: self.refresh_token.or(previous_refresh),
            expiry: self
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

//=========================================================================================
// OAuth client
//=========================================================================================

pub struct OAuthClient {
    http: Client,
    settings: GoogleOAuthSettings,
    auth_url: String,
    token_url: String,
}

impl OAuthClient {
    pub fn new(http: Client, settings: GoogleOAuthSettings) -> Self {
        Self {
            http,
            settings,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    /// Points the flow at other authorization and token endpoints.
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }

    /// The consent page URL. Offline access is requested so a refresh token
    /// comes back with the first exchange.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?access_type=offline&client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.auth_url,
            urlencoding::encode(&self.settings.client_id),
            urlencoding::encode(&self.settings.redirect_url),
            urlencoding::encode(CALENDAR_EVENTS_SCOPE),
            urlencoding::encode(state)
        )
    }

    pub async fn exchange_code(&self, code: &str) -> PortResult<StoredToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("redirect_uri", self.settings.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let value = read_google_json(response).await?;
        let token: TokenResponse =
            serde_json::from_value(value).map_err(|e| PortError::Malformed(e.to_string()))?;
        Ok(token.into_token(None))
    }

    pub async fn refresh(&self, token: &StoredToken) -> PortResult<StoredToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| PortError::Unauthorized("token has no refresh token".to_string()))?;
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let value = read_google_json(response).await?;
        let refreshed: TokenResponse =
            serde_json::from_value(value).map_err(|e| PortError::Malformed(e.to_string()))?;
        Ok(refreshed.into_token(token.refresh_token.clone()))
    }
}

//=========================================================================================
// Token file
//=========================================================================================

pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable token file means nobody has logged in yet.
    pub async fn load(&self) -> PortResult<Option<StoredToken>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };
        match serde_json::from_slice(&raw) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!("Ignoring unreadable token file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    /// Writes the token, readable by the owner only.
    pub async fn save(&self, token: &StoredToken) -> PortResult<()> {
        let json =
            serde_json::to_vec_pretty(token).map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        file.write_all(&json)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        info!("Saved calendar token to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GoogleOAuthSettings {
        GoogleOAuthSettings {
            client_id: "client-1".to_string(),
            client_secret: "s3cret".to_string(),
            redirect_url: "http://localhost:8080/oauth2callback".to_string(),
        }
    }

    #[test]
    fn consent_url_requests_offline_calendar_access() {
        let url = OAuthClient::new(Client::new(), settings()).authorization_url("st-1");
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Foauth2callback"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fcalendar.events"));
        assert!(url.ends_with("state=st-1"));
    }

    #[test]
    fn expiry_has_a_margin() {
        let now = Utc::now();
        let mut token = StoredToken {
            access_token: "a".into(),
            token_type: bearer(),
            refresh_token: None,
            expiry: None,
        };
        assert!(!token.is_expired(now));
        token.expiry = Some(now + Duration::seconds(30));
        assert!(token.is_expired(now));
        token.expiry = Some(now + Duration::hours(1));
        assert!(!token.is_expired(now));
    }

    #[tokio::test]
    async fn token_file_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = TokenFile::new(dir.path().join("token.json"));
        assert_eq!(file.load().await.unwrap(), None);

        let token = StoredToken {
            access_token: "access".into(),
            token_type: bearer(),
            refresh_token: Some("refresh".into()),
            expiry: None,
        };
        file.save(&token).await.unwrap();
        assert_eq!(file.load().await.unwrap(), Some(token));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn corrupt_token_file_counts_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(TokenFile::new(path).load().await.unwrap(), None);
    }
}
