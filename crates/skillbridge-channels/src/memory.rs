//! In-memory channel that records every delivered activity.
//!
//! Used in tests and local tooling to assert exactly what reached the user.

use async_trait::async_trait;
use parking_lot::Mutex;
use skillbridge_core::{Activity, ActivityType};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryChannel {
    id: String,
    sent: Arc<Mutex<Vec<Activity>>>,
    /// Number of `send_activities` calls (one per delivered batch).
    batches: Arc<Mutex<usize>>,
}

impl MemoryChannel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Everything delivered so far, in order.
    pub fn sent(&self) -> Vec<Activity> {
        self.sent.lock().clone()
    }

    /// Text of delivered message activities.
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|a| a.activity_type == ActivityType::Message)
            .filter_map(|a| a.text.clone())
            .collect()
    }

    /// Text of delivered trace activities.
    pub fn traces(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|a| a.is_trace())
            .filter_map(|a| a.text.clone())
            .collect()
    }

    pub fn batch_count(&self) -> usize {
        *self.batches.lock()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
        *self.batches.lock() = 0;
    }
}

#[async_trait]
impl crate::Channel for MemoryChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_activity(&self, activity: Activity) -> skillbridge_core::Result<()> {
        self.sent.lock().push(activity);
        Ok(())
    }

    async fn send_activities(&self, activities: Vec<Activity>) -> skillbridge_core::Result<()> {
        *self.batches.lock() += 1;
        self.sent.lock().extend(activities);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channel;

    #[tokio::test]
    async fn test_records_in_order() {
        let channel = MemoryChannel::new("test");
        channel.send_activity(Activity::message("one")).await.unwrap();
        channel
            .send_activities(vec![Activity::trace("dbg"), Activity::message("two")])
            .await
            .unwrap();

        assert_eq!(channel.messages(), vec!["one", "two"]);
        assert_eq!(channel.traces(), vec!["dbg"]);
        assert_eq!(channel.sent().len(), 3);
        assert_eq!(channel.batch_count(), 1);

        channel.clear();
        assert!(channel.sent().is_empty());
    }
}
