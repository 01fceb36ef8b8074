//! Service-account authentication for the Google backend.
//!
//! Implements the OAuth 2.0 JWT bearer grant: a self-signed RS256 assertion is
//! exchanged for a short-lived access token, which is cached until shortly
//! before it expires.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::SheetsError;
use crate::http::check_response;

/// OAuth scope granting read/write access to spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion. Google caps this at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a service-account JSON key that the grant needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Read a JSON key file downloaded from the cloud console.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Io`] if the file cannot be read and
    /// [`SheetsError::Parse`] if it is not a service-account key.
    pub async fn from_file(path: &Path) -> Result<Self, SheetsError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    /// Parse a JSON key.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Parse`] if required fields are missing.
    pub fn from_json(raw: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(raw)
            .map_err(|e| SheetsError::Parse(format!("service account key: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Mints and caches access tokens for one service account.
pub struct TokenProvider {
    key: ServiceAccountKey,
    token_uri: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// `token_uri` is used when the key file does not name its own endpoint.
    #[must_use]
    pub fn new(key: ServiceAccountKey, token_uri: &str, http: reqwest::Client) -> Self {
        let token_uri = key
            .token_uri
            .clone()
            .unwrap_or_else(|| token_uri.to_string());
        Self {
            key,
            token_uri,
            http,
            cached: Mutex::new(None),
        }
    }

    /// A valid bearer token, minting a new one if the cached token is stale.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Auth`] if the key cannot sign an assertion or
    /// the token endpoint rejects it.
    pub async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let assertion = self.assertion(now)?;
        let body = format!(
            "grant_type={}&assertion={}",
            urlencoding::encode(JWT_BEARER_GRANT),
            urlencoding::encode(&assertion)
        );
        let resp = self
            .http
            .post(&self.token_uri)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await?;
        let resp = check_response(resp).await.map_err(|e| match e {
            SheetsError::Api { status, message } => {
                SheetsError::Auth(format!("token endpoint returned {status}: {message}"))
            }
            other => other,
        })?;
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SheetsError::Parse(format!("token response: {e}")))?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "minted access token"
        );
        let fresh = CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        };
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, SheetsError> {
        let iat = now.timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| SheetsError::Auth(format!("invalid private key: {e}")))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SheetsError::Auth(format!("failed to sign assertion: {e}")))
    }
}
