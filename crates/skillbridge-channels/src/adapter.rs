use async_trait::async_trait;
use skillbridge_core::Activity;

/// The user-facing side of a conversation: wherever activities relayed from
/// a skill (and bridge trace notes) end up.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique identifier for this channel instance.
    fn id(&self) -> &str;

    /// Deliver a single activity.
    async fn send_activity(&self, activity: Activity) -> skillbridge_core::Result<()>;

    /// Deliver a batch of activities, preserving their order.
    ///
    /// Default implementation sends one by one. Channels that can batch
    /// natively should override this.
    async fn send_activities(&self, activities: Vec<Activity>) -> skillbridge_core::Result<()> {
        for activity in activities {
            self.send_activity(activity).await?;
        }
        Ok(())
    }

    /// Deliver a trace note (visible in emulators and logs, not to end users).
    async fn send_trace(&self, text: &str) -> skillbridge_core::Result<()> {
        self.send_activity(Activity::trace(text)).await
    }
}
