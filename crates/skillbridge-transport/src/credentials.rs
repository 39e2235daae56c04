//! Caller credentials attached to outbound skill requests.
//!
//! A provider only authorizes requests to endpoints it has been told to
//! trust; the transport trusts a skill's endpoint right before posting to it.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::RequestBuilder;
use serde::Deserialize;
use skillbridge_config::{CredentialMode, CredentialsConfig};
use skillbridge_core::{BridgeError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Supplies caller identity for requests to skills.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Mark an endpoint as a trusted target. Idempotent.
    fn trust_endpoint(&self, endpoint: &Url);

    fn is_trusted(&self, endpoint: &Url) -> bool;

    /// Attach credentials to a request bound for `endpoint`.
    async fn authorize(&self, endpoint: &Url, request: RequestBuilder) -> Result<RequestBuilder>;
}

/// Set of trusted origins (`scheme://host:port`), shared between clones.
#[derive(Debug, Clone, Default)]
pub struct TrustedEndpoints {
    origins: Arc<RwLock<HashSet<String>>>,
}

impl TrustedEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust the origin of `endpoint`. Returns `true` only the first time.
    pub fn trust(&self, endpoint: &Url) -> bool {
        let origin = endpoint.origin().ascii_serialization();
        if self.origins.read().contains(&origin) {
            return false;
        }
        let inserted = self.origins.write().insert(origin.clone());
        if inserted {
            debug!(%origin, "trusting skill endpoint");
        }
        inserted
    }

    pub fn contains(&self, endpoint: &Url) -> bool {
        self.origins
            .read()
            .contains(&endpoint.origin().ascii_serialization())
    }

    pub fn len(&self) -> usize {
        self.origins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.read().is_empty()
    }
}

// ── Anonymous ──────────────────────────────────────────────────

/// Sends no Authorization header. For local skills and the emulator.
#[derive(Debug, Clone, Default)]
pub struct AnonymousCredentials {
    trusted: TrustedEndpoints,
}

impl AnonymousCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trusted(&self) -> &TrustedEndpoints {
        &self.trusted
    }
}

#[async_trait]
impl CredentialProvider for AnonymousCredentials {
    fn trust_endpoint(&self, endpoint: &Url) {
        self.trusted.trust(endpoint);
    }

    fn is_trusted(&self, endpoint: &Url) -> bool {
        self.trusted.contains(endpoint)
    }

    async fn authorize(&self, _endpoint: &Url, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request)
    }
}

// ── Static bearer token ────────────────────────────────────────

/// Attaches a fixed bearer token to requests for trusted endpoints.
#[derive(Clone)]
pub struct StaticTokenCredentials {
    token: String,
    trusted: TrustedEndpoints,
}

impl StaticTokenCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            trusted: TrustedEndpoints::new(),
        }
    }

    pub fn trusted(&self) -> &TrustedEndpoints {
        &self.trusted
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenCredentials {
    fn trust_endpoint(&self, endpoint: &Url) {
        self.trusted.trust(endpoint);
    }

    fn is_trusted(&self, endpoint: &Url) -> bool {
        self.trusted.contains(endpoint)
    }

    async fn authorize(&self, endpoint: &Url, request: RequestBuilder) -> Result<RequestBuilder> {
        if !self.trusted.contains(endpoint) {
            debug!(%endpoint, "endpoint not trusted, sending without credentials");
            return Ok(request);
        }
        Ok(request.bearer_auth(&self.token))
    }
}

// ── OAuth2 client credentials ──────────────────────────────────

/// A cached app token.
#[derive(Debug, Clone)]
struct AppToken {
    access_token: String,
    /// Unix timestamp (seconds); `None` means no expiry was given.
    expires_at: Option<i64>,
}

impl AppToken {
    /// Treat tokens as expired 60 seconds early so none lapses mid-request.
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => chrono::Utc::now().timestamp() >= expires_at - 60,
            None => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointError {
    error: String,
    error_description: Option<String>,
}

/// Obtains an app token with the OAuth2 client-credentials grant and
/// attaches it as a bearer token. The token is cached until shortly before
/// it expires.
pub struct AppCredentials {
    client: reqwest::Client,
    app_id: String,
    app_password: String,
    token_url: String,
    scope: String,
    trusted: TrustedEndpoints,
    cached: tokio::sync::Mutex<Option<AppToken>>,
}

impl AppCredentials {
    pub fn new(
        client: reqwest::Client,
        app_id: impl Into<String>,
        app_password: impl Into<String>,
        token_url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client,
            app_id: app_id.into(),
            app_password: app_password.into(),
            token_url: token_url.into(),
            scope: scope.into(),
            trusted: TrustedEndpoints::new(),
            cached: tokio::sync::Mutex::new(None),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Current access token, fetching a new one if none is cached or the
    /// cached one is about to expire.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<AppToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_password.as_str()),
            ("scope", self.scope.as_str()),
        ];

        debug!(token_url = %self.token_url, app_id = %self.app_id, "requesting app token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| BridgeError::Credentials(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::Credentials(e.to_string()))?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<TokenEndpointError>(&body) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => format!("HTTP {status}: {body}"),
            };
            return Err(BridgeError::Credentials(reason));
        }

        let parsed: TokenEndpointResponse = serde_json::from_str(&body)
            .map_err(|e| BridgeError::Credentials(format!("bad token response: {e}")))?;

        info!(app_id = %self.app_id, "obtained app token");

        Ok(AppToken {
            access_token: parsed.access_token,
            expires_at: parsed
                .expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs),
        })
    }
}

#[async_trait]
impl CredentialProvider for AppCredentials {
    fn trust_endpoint(&self, endpoint: &Url) {
        self.trusted.trust(endpoint);
    }

    fn is_trusted(&self, endpoint: &Url) -> bool {
        self.trusted.contains(endpoint)
    }

    async fn authorize(&self, endpoint: &Url, request: RequestBuilder) -> Result<RequestBuilder> {
        if !self.trusted.contains(endpoint) {
            debug!(%endpoint, "endpoint not trusted, sending without credentials");
            return Ok(request);
        }
        let token = self.access_token().await?;
        Ok(request.bearer_auth(token))
    }
}

/// Build the credential provider selected by the `[credentials]` section.
///
/// `default_scope` is used for the client-credentials grant when the config
/// does not name one.
pub fn from_config(
    config: &CredentialsConfig,
    client: reqwest::Client,
    default_scope: &str,
) -> Result<Arc<dyn CredentialProvider>> {
    match config.mode {
        CredentialMode::Anonymous => Ok(Arc::new(AnonymousCredentials::new())),
        CredentialMode::Static => {
            let token = config.static_token.clone().ok_or_else(|| {
                BridgeError::ConfigValidation {
                    field: "credentials.static_token".into(),
                    reason: "static mode needs a token".into(),
                }
            })?;
            Ok(Arc::new(StaticTokenCredentials::new(token)))
        }
        CredentialMode::ClientCredentials => {
            let (Some(app_id), Some(app_password)) =
                (config.app_id.clone(), config.app_password.clone())
            else {
                return Err(BridgeError::ConfigValidation {
                    field: "credentials.app_password".into(),
                    reason: "client_credentials mode needs app_id and app_password".into(),
                });
            };
            let scope = config
                .scope
                .clone()
                .unwrap_or_else(|| default_scope.to_string());
            Ok(Arc::new(AppCredentials::new(
                client,
                app_id,
                app_password,
                config.token_url.clone(),
                scope,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        s.parse().unwrap()
    }

    #[test]
    fn test_trust_is_idempotent() {
        let trusted = TrustedEndpoints::new();
        assert!(trusted.trust(&url("https://skill.example.com/api/messages")));
        assert!(!trusted.trust(&url("https://skill.example.com/api/messages")));
        assert_eq!(trusted.len(), 1);
    }

    #[test]
    fn test_trust_is_per_origin() {
        let trusted = TrustedEndpoints::new();
        trusted.trust(&url("https://skill.example.com/api/messages"));
        assert!(trusted.contains(&url("https://skill.example.com/other")));
        assert!(!trusted.contains(&url("http://skill.example.com/api/messages")));
        assert!(!trusted.contains(&url("https://skill.example.com:8443/api/messages")));
    }

    #[test]
    fn test_clones_share_trust() {
        let creds = AnonymousCredentials::new();
        let clone = creds.clone();
        creds.trust_endpoint(&url("https://a.example.com/"));
        assert!(clone.is_trusted(&url("https://a.example.com/x")));
    }

    #[test]
    fn test_app_token_expiry_margin() {
        let now = chrono::Utc::now().timestamp();
        let fresh = AppToken {
            access_token: "t".into(),
            expires_at: Some(now + 3600),
        };
        let stale = AppToken {
            access_token: "t".into(),
            expires_at: Some(now + 30),
        };
        let open = AppToken {
            access_token: "t".into(),
            expires_at: None,
        };
        assert!(!fresh.is_expired());
        assert!(stale.is_expired());
        assert!(!open.is_expired());
    }

    #[test]
    fn test_from_config_rejects_incomplete() {
        let config = CredentialsConfig {
            mode: CredentialMode::Static,
            ..Default::default()
        };
        assert!(from_config(&config, reqwest::Client::new(), "scope").is_err());

        let config = CredentialsConfig {
            mode: CredentialMode::ClientCredentials,
            app_id: Some("app".into()),
            ..Default::default()
        };
        assert!(from_config(&config, reqwest::Client::new(), "scope").is_err());
    }
}
