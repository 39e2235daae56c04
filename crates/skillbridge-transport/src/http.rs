use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use skillbridge_config::TransportConfig;
use skillbridge_core::{Activity, BridgeError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::credentials::CredentialProvider;

pub const ACTIVITY_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Posts one activity to a skill and returns the batch it answers with.
#[async_trait]
pub trait SkillTransport: Send + Sync {
    /// Serialize `activity`, trust `endpoint`, attach credentials, POST, and
    /// deserialize the response batch.
    ///
    /// Non-success statuses fail with [`BridgeError::Transport`]; a fired
    /// `cancel` token fails with [`BridgeError::Cancelled`].
    async fn post_activity(
        &self,
        endpoint: &Url,
        activity: &Activity,
        credentials: &dyn CredentialProvider,
        cancel: &CancellationToken,
    ) -> Result<Vec<Activity>>;
}

/// HTTP transport over one pooled `reqwest::Client`.
///
/// Cloning is cheap and clones share the connection pool, so a single
/// instance should serve every conversation in the process.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .user_agent(config.user_agent.clone());
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| BridgeError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shares its pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The underlying client, for collaborators that should share the pool
    /// (e.g. the token endpoint calls of [`crate::AppCredentials`]).
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn exchange(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
        credentials: &dyn CredentialProvider,
    ) -> Result<Vec<Activity>> {
        let request = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, ACTIVITY_CONTENT_TYPE)
            .body(body);
        let request = credentials.authorize(endpoint, request).await?;

        let response = request
            .send()
            .await
            .map_err(|e| BridgeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = reason_phrase(&response);
            warn!(%endpoint, status = status.as_u16(), %reason, "skill returned an error status");
            return Err(BridgeError::Transport {
                status: status.as_u16(),
                reason,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BridgeError::Network(e.to_string()))?;

        // Some skills answer 200/202 with no body when they have nothing to say.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let batch: Vec<Activity> = serde_json::from_slice(&bytes)?;
        debug!(%endpoint, activities = batch.len(), "received skill responses");
        Ok(batch)
    }
}

/// The reason phrase the skill sent, or the canonical one for its status.
fn reason_phrase(response: &reqwest::Response) -> String {
    if let Some(phrase) = response.extensions().get::<hyper::ext::ReasonPhrase>() {
        return String::from_utf8_lossy(phrase.as_bytes()).into_owned();
    }
    response
        .status()
        .canonical_reason()
        .unwrap_or("Unknown Status")
        .to_string()
}

#[async_trait]
impl SkillTransport for HttpTransport {
    async fn post_activity(
        &self,
        endpoint: &Url,
        activity: &Activity,
        credentials: &dyn CredentialProvider,
        cancel: &CancellationToken,
    ) -> Result<Vec<Activity>> {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }

        let body = serde_json::to_vec(activity)?;
        credentials.trust_endpoint(endpoint);

        debug!(
            %endpoint,
            activity_type = ?activity.activity_type,
            name = activity.name.as_deref().unwrap_or(""),
            "posting activity to skill"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%endpoint, "request to skill cancelled");
                Err(BridgeError::Cancelled)
            }
            result = self.exchange(endpoint, body, credentials) => result,
        }
    }
}
