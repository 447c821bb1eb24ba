use crate::config::Config;
use crate::error::{auth_error, SyncResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Authorized-user token file, as written by Google's OAuth helper libraries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUserToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    /// Fields we don't use but must keep when writing the file back
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl AuthorizedUserToken {
    /// Whether the access token can be used at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        if self.token.as_deref().map_or(true, str::is_empty) {
            return false;
        }
        match self.expiry.as_deref() {
            // No expiry recorded, trust the token until the API says otherwise
            None => true,
            Some(expiry) => DateTime::parse_from_rfc3339(expiry)
                .map(|at| at.with_timezone(&Utc) > now + Duration::seconds(EXPIRY_MARGIN_SECS))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Hands out access tokens, refreshing and persisting them as needed
#[derive(Clone)]
pub struct TokenManager {
    token: Arc<RwLock<AuthorizedUserToken>>,
    token_path: PathBuf,
    client: Client,
}

impl TokenManager {
    /// Build from an already parsed token
    pub fn new(token: AuthorizedUserToken, token_path: PathBuf, client: Client) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
            token_path,
            client,
        }
    }

    /// Load the token from `GOOGLE_TOKEN` (base64) or from the token file
    pub fn from_config(config: &Config, client: Client) -> SyncResult<Self> {
        let raw = if let Some(encoded) = &config.google_token_b64 {
            info!("Google credentials loaded from environment variable");
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| auth_error(&format!("Error decoding GOOGLE_TOKEN: {}", e)))?;
            String::from_utf8(bytes)
                .map_err(|e| auth_error(&format!("GOOGLE_TOKEN is not UTF-8: {}", e)))?
        } else if config.token_path.exists() {
            info!("Using token file {}", config.token_path.display());
            fs::read_to_string(&config.token_path)?
        } else {
            return Err(auth_error(
                "No Google credentials found. Set GOOGLE_TOKEN or provide a token file",
            ));
        };

        let token: AuthorizedUserToken = serde_json::from_str(&raw)
            .map_err(|e| auth_error(&format!("Failed to parse Google token: {}", e)))?;

        Ok(Self::new(token, config.token_path.clone(), client))
    }

    /// Get a usable access token, refreshing it first when expired
    pub async fn access_token(&self) -> SyncResult<String> {
        {
            let token = self.token.read().await;
            if token.is_fresh(Utc::now()) {
                if let Some(access) = &token.token {
                    return Ok(access.clone());
                }
            }
        }

        let mut token = self.token.write().await;
        // Another caller may have refreshed while we waited for the lock
        if token.is_fresh(Utc::now()) {
            if let Some(access) = &token.token {
                return Ok(access.clone());
            }
        }

        self.refresh(&mut token).await?;
        self.persist(&token).await;

        token
            .token
            .clone()
            .ok_or_else(|| auth_error("Token refresh returned no access token"))
    }

    async fn refresh(&self, token: &mut AuthorizedUserToken) -> SyncResult<()> {
        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or_else(|| auth_error("No refresh token in token data"))?;
        let client_id = token
            .client_id
            .clone()
            .ok_or_else(|| auth_error("No client_id in token data"))?;
        let client_secret = token
            .client_secret
            .clone()
            .ok_or_else(|| auth_error("No client_secret in token data"))?;

        debug!("Refreshing Google access token");

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post(&token.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        let expires_at = Utc::now() + Duration::seconds(refreshed.expires_in.unwrap_or(3600));
        token.token = Some(refreshed.access_token);
        token.expiry = Some(expires_at.to_rfc3339_opts(SecondsFormat::Secs, true));

        info!("Google access token refreshed");
        Ok(())
    }

    /// Write the token back so the next run starts with a fresh one
    async fn persist(&self, token: &AuthorizedUserToken) {
        let result = match serde_json::to_string_pretty(token) {
            Ok(json) => tokio::fs::write(&self.token_path, json)
                .await
                .map_err(crate::error::Error::from),
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            warn!(
                "Could not save refreshed token to {}: {}",
                self.token_path.display(),
                e
            );
        }
    }
}
