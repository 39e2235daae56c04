//! Mock skill transport for deterministic testing.
//!
//! Returns pre-configured batches without making any HTTP calls.

use async_trait::async_trait;
use parking_lot::Mutex;
use skillbridge_core::{Activity, BridgeError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::credentials::CredentialProvider;
use crate::http::SkillTransport;

/// A pre-configured reply from the mock transport.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A successful response batch.
    Activities(Vec<Activity>),
    /// A non-success HTTP status with its reason phrase.
    Status(u16, String),
    /// A network-level failure.
    Error(String),
    /// Never answers; only a cancellation ends the request.
    Hang,
}

/// One request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub endpoint: Url,
    pub activity: Activity,
}

/// A mock transport that returns queued replies in order.
///
/// # Example
/// ```
/// use skillbridge_transport::mock::MockTransport;
/// use skillbridge_core::Activity;
/// let transport = MockTransport::new()
///     .with_activities(vec![Activity::message("hi")]);
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    posts: Arc<Mutex<Vec<RecordedPost>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful batch.
    pub fn with_activities(self, batch: Vec<Activity>) -> Self {
        self.queue(MockReply::Activities(batch));
        self
    }

    /// Queue an HTTP error status.
    pub fn with_status(self, status: u16, reason: &str) -> Self {
        self.queue(MockReply::Status(status, reason.to_string()));
        self
    }

    /// Queue a network failure.
    pub fn with_error(self, error: &str) -> Self {
        self.queue(MockReply::Error(error.to_string()));
        self
    }

    /// Queue a request that only ends when cancelled.
    pub fn with_hang(self) -> Self {
        self.queue(MockReply::Hang);
        self
    }

    pub fn queue(&self, reply: MockReply) {
        self.replies.lock().push_back(reply);
    }

    /// Every activity posted so far, in order.
    pub fn posted(&self) -> Vec<Activity> {
        self.posts.lock().iter().map(|p| p.activity.clone()).collect()
    }

    pub fn recorded(&self) -> Vec<RecordedPost> {
        self.posts.lock().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().len()
    }

    /// An empty queue answers with an empty batch.
    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .pop_front()
            .unwrap_or(MockReply::Activities(vec![]))
    }
}

#[async_trait]
impl SkillTransport for MockTransport {
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
        credentials.trust_endpoint(endpoint);
        self.posts.lock().push(RecordedPost {
            endpoint: endpoint.clone(),
            activity: activity.clone(),
        });

        match self.next_reply() {
            MockReply::Activities(batch) => Ok(batch),
            MockReply::Status(status, reason) => Err(BridgeError::Transport { status, reason }),
            MockReply::Error(e) => Err(BridgeError::Network(e)),
            MockReply::Hang => {
                cancel.cancelled().await;
                Err(BridgeError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::AnonymousCredentials;

    fn endpoint() -> Url {
        "https://skill.example.com/api/messages".parse().unwrap()
    }

    #[tokio::test]
    async fn test_replies_in_order() {
        let transport = MockTransport::new()
            .with_activities(vec![Activity::message("first")])
            .with_status(500, "Internal Server Error");
        let creds = AnonymousCredentials::new();
        let cancel = CancellationToken::new();

        let batch = transport
            .post_activity(&endpoint(), &Activity::message("hi"), &creds, &cancel)
            .await
            .unwrap();
        assert_eq!(batch[0].text.as_deref(), Some("first"));

        let err = transport
            .post_activity(&endpoint(), &Activity::message("again"), &creds, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));

        assert_eq!(transport.post_count(), 2);
        assert!(creds.is_trusted(&endpoint()));
    }

    #[tokio::test]
    async fn test_hang_ends_on_cancel() {
        let transport = MockTransport::new().with_hang();
        let creds = AnonymousCredentials::new();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = transport
            .post_activity(&endpoint(), &Activity::message("hi"), &creds, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
