use async_trait::async_trait;
use skillbridge_core::{Activity, BridgeError};
use tokio::sync::mpsc;
use tracing::warn;

use crate::adapter::Channel;

/// A delivered unit: one activity, or a batch that must stay together.
#[derive(Debug, Clone)]
pub enum Outgoing {
    Single(Activity),
    Batch(Vec<Activity>),
}

impl Outgoing {
    pub fn into_activities(self) -> Vec<Activity> {
        match self {
            Outgoing::Single(a) => vec![a],
            Outgoing::Batch(batch) => batch,
        }
    }
}

/// Channel that hands outgoing activities to a receiver owned by whatever
/// hosts the conversation (an HTTP adapter, a websocket, a test harness).
pub struct BufferedChannel {
    id: String,
    outgoing_tx: mpsc::Sender<Outgoing>,
}

impl BufferedChannel {
    /// Create the channel and the receiver the host drains.
    pub fn new(id: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<Outgoing>) {
        let (outgoing_tx, outgoing_rx) = mpsc::channel(capacity);
        (
            Self {
                id: id.into(),
                outgoing_tx,
            },
            outgoing_rx,
        )
    }

    async fn push(&self, item: Outgoing) -> skillbridge_core::Result<()> {
        self.outgoing_tx
            .send(item)
            .await
            .map_err(|e| {
                warn!(channel = %self.id, "Outgoing receiver dropped");
                BridgeError::Network(format!("channel {} closed: {}", self.id, e))
            })
    }
}

#[async_trait]
impl Channel for BufferedChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_activity(&self, activity: Activity) -> skillbridge_core::Result<()> {
        self.push(Outgoing::Single(activity)).await
    }

    async fn send_activities(&self, activities: Vec<Activity>) -> skillbridge_core::Result<()> {
        if activities.is_empty() {
            return Ok(());
        }
        self.push(Outgoing::Batch(activities)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_delivered_as_one_unit() {
        let (channel, mut rx) = BufferedChannel::new("webchat", 8);
        channel
            .send_activities(vec![Activity::message("a"), Activity::message("b")])
            .await
            .unwrap();
        channel.send_trace("note").await.unwrap();

        match rx.recv().await.unwrap() {
            Outgoing::Batch(batch) => {
                assert_eq!(batch.len(), 2);
                assert_eq!(batch[0].text.as_deref(), Some("a"));
                assert_eq!(batch[1].text.as_deref(), Some("b"));
            }
            other => panic!("expected batch, got {:?}", other),
        }
        let trace = rx.recv().await.unwrap().into_activities();
        assert!(trace[0].is_trace());
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_sent() {
        let (channel, mut rx) = BufferedChannel::new("webchat", 8);
        channel.send_activities(vec![]).await.unwrap();
        drop(channel);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_receiver_errors() {
        let (channel, rx) = BufferedChannel::new("webchat", 1);
        drop(rx);
        let err = channel
            .send_activity(Activity::message("lost"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("webchat"));
    }
}
