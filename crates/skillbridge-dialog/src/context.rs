use skillbridge_channels::Channel;
use skillbridge_core::{Activity, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Everything one inbound turn carries: the activity, where replies go, and
/// the caller's cancellation signal.
#[derive(Clone)]
pub struct TurnContext {
    activity: Activity,
    channel: Arc<dyn Channel>,
    cancel: CancellationToken,
}

impl TurnContext {
    pub fn new(activity: Activity, channel: Arc<dyn Channel>, cancel: CancellationToken) -> Self {
        Self {
            activity,
            channel,
            cancel,
        }
    }

    /// The inbound activity that started this turn.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Send a trace note to the conversation.
    pub async fn send_trace(&self, text: &str) -> Result<()> {
        debug!(channel = self.channel.id(), text, "trace");
        self.channel.send_trace(text).await
    }
}

/// Per-conversation state of a skill dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkillDialogState {
    /// No skill engaged; the next turn must begin one.
    #[default]
    Inactive,
    /// The skill owns the conversation; turns are forwarded to it.
    Forwarding,
    /// The auth sub-dialog is collecting a token for the skill.
    AwaitingAuth,
}

impl SkillDialogState {
    pub fn is_active(&self) -> bool {
        !matches!(self, SkillDialogState::Inactive)
    }
}

/// A turn plus the dialog state it runs against.
///
/// The state is loaded by whoever dispatches turns (see
/// [`crate::SkillHost`]) and read back after the dialog has handled the turn.
pub struct DialogContext {
    pub turn: TurnContext,
    state: SkillDialogState,
}

impl DialogContext {
    pub fn new(turn: TurnContext) -> Self {
        Self::with_state(turn, SkillDialogState::Inactive)
    }

    pub fn with_state(turn: TurnContext, state: SkillDialogState) -> Self {
        Self { turn, state }
    }

    pub fn state(&self) -> SkillDialogState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SkillDialogState) {
        self.state = state;
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn activity(&self) -> &Activity {
        self.turn.activity()
    }
}
