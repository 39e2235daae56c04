use async_trait::async_trait;
use serde_json::Value;
use skillbridge_core::{Result, TokenResponse};
use std::sync::Arc;

use crate::context::TurnContext;

/// What the auth sub-dialog produced for this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// A token was obtained; it is forwarded to the skill.
    Token(TokenResponse),
    /// The user still has to act (sign-in card, magic code, MFA prompt).
    Waiting,
    /// The sub-dialog finished without a token (e.g. the user gave up).
    Complete(Option<Value>),
}

/// A nested dialog that obtains a user token on a skill's behalf.
///
/// Implementations keep whatever per-conversation state they need; the skill
/// dialog only tells them when to start and when a new turn arrived.
#[async_trait]
pub trait AuthDialog: Send + Sync {
    fn id(&self) -> &str;

    /// Start collecting a token. Called when a skill sends `tokenRequest`.
    async fn begin(&self, turn: &TurnContext) -> Result<AuthOutcome>;

    /// Continue with the user's next activity after a `Waiting` outcome.
    async fn resume(&self, turn: &TurnContext) -> Result<AuthOutcome>;
}

/// Which auth capability a skill dialog was wired with.
#[derive(Clone, Default)]
pub enum AuthSlot {
    #[default]
    NoAuth,
    SubDialog(Arc<dyn AuthDialog>),
}

impl AuthSlot {
    pub fn dialog(&self) -> Option<&Arc<dyn AuthDialog>> {
        match self {
            AuthSlot::NoAuth => None,
            AuthSlot::SubDialog(dialog) => Some(dialog),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, AuthSlot::SubDialog(_))
    }
}
