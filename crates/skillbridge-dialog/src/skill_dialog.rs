//! The skill forwarding dialog.
//!
//! Once begun, a [`SkillDialog`] owns its conversation: every inbound turn is
//! POSTed to the remote skill and the response batch is classified, relayed,
//! and acted on until the skill sends `endOfConversation`.

use serde_json::Value;
use skillbridge_core::{
    Activity, BridgeError, ChannelAccount, DialogTurnResult, Result, SkillManifest,
};
use skillbridge_transport::{CredentialProvider, SkillTransport};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::auth::{AuthDialog, AuthOutcome, AuthSlot};
use crate::classifier::classify;
use crate::context::{DialogContext, SkillDialogState};

/// Default bound on chained token exchanges within one turn.
pub const DEFAULT_MAX_TOKEN_HOPS: u32 = 5;

const TOKEN_REQUEST_TRACE: &str = "<--Received a Token Request from a skill";
const END_OF_CONVERSATION_TRACE: &str = "<--Ending the skill conversation";

/// Forwards a conversation to one remote skill.
///
/// A `SkillDialog` holds no per-conversation data; all of that lives in the
/// [`DialogContext`] passed to each call, so one instance serves every
/// conversation routed to its skill.
pub struct SkillDialog {
    manifest: SkillManifest,
    transport: Arc<dyn SkillTransport>,
    credentials: Arc<dyn CredentialProvider>,
    auth: AuthSlot,
    max_token_hops: u32,
    bot: Option<ChannelAccount>,
}

impl SkillDialog {
    pub fn new(
        manifest: SkillManifest,
        transport: Arc<dyn SkillTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            manifest,
            transport,
            credentials,
            auth: AuthSlot::NoAuth,
            max_token_hops: DEFAULT_MAX_TOKEN_HOPS,
            bot: None,
        }
    }

    /// Wire the nested dialog that answers the skill's token requests.
    pub fn with_auth_dialog(mut self, dialog: Arc<dyn AuthDialog>) -> Self {
        self.auth = AuthSlot::SubDialog(dialog);
        self
    }

    pub fn with_max_token_hops(mut self, hops: u32) -> Self {
        self.max_token_hops = hops;
        self
    }

    /// Identity used as the recipient of `skillBegin` when the triggering
    /// activity carries none.
    pub fn with_bot(mut self, bot: ChannelAccount) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn manifest(&self) -> &SkillManifest {
        &self.manifest
    }

    pub fn auth(&self) -> &AuthSlot {
        &self.auth
    }

    /// Start the skill: send it a `skillBegin` event built from the inbound
    /// activity, then treat its answer like any other forwarded turn.
    pub async fn begin(
        &self,
        dc: &mut DialogContext,
        options: Option<Value>,
    ) -> Result<DialogTurnResult> {
        if dc.is_active() {
            return Err(BridgeError::Dialog(format!(
                "skill {} is already active in this conversation",
                self.manifest.id
            )));
        }

        info!(
            skill = %self.manifest.id,
            conversation = dc.activity().conversation_id().unwrap_or_default(),
            "Beginning skill"
        );
        let mut begin = Activity::skill_begin(dc.activity(), options);
        if begin.recipient.is_none() {
            begin.recipient = self.bot.clone();
        }
        dc.set_state(SkillDialogState::Forwarding);
        self.forward(dc, begin).await
    }

    /// Handle the next inbound turn of an active skill conversation.
    pub async fn continue_dialog(&self, dc: &mut DialogContext) -> Result<DialogTurnResult> {
        match dc.state() {
            SkillDialogState::Inactive => Err(BridgeError::Dialog(format!(
                "skill {} is not active in this conversation",
                self.manifest.id
            ))),
            SkillDialogState::AwaitingAuth => self.resume_auth(dc).await,
            SkillDialogState::Forwarding => {
                let activity = dc.activity().clone();
                self.forward(dc, activity).await
            }
        }
    }

    /// End the skill for this conversation. Always succeeds.
    pub fn end(&self, dc: &mut DialogContext, result: Option<Value>) -> DialogTurnResult {
        info!(
            skill = %self.manifest.id,
            conversation = dc.activity().conversation_id().unwrap_or_default(),
            "Skill dialog ended"
        );
        dc.set_state(SkillDialogState::Inactive);
        DialogTurnResult::complete(result)
    }

    async fn resume_auth(&self, dc: &mut DialogContext) -> Result<DialogTurnResult> {
        let Some(auth) = self.auth.dialog().cloned() else {
            // State can only reach AwaitingAuth through a wired auth dialog.
            dc.set_state(SkillDialogState::Forwarding);
            let activity = dc.activity().clone();
            return self.forward(dc, activity).await;
        };

        let outcome = match auth.resume(&dc.turn).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(dc, e)),
        };

        match outcome {
            AuthOutcome::Token(token) => {
                debug!(skill = %self.manifest.id, auth = auth.id(), "Token obtained on resume");
                let event = dc.activity().to_token_response(&token)?;
                dc.set_state(SkillDialogState::Forwarding);
                self.forward(dc, event).await
            }
            AuthOutcome::Waiting => Ok(DialogTurnResult::waiting()),
            AuthOutcome::Complete(result) => {
                info!(skill = %self.manifest.id, "Auth dialog finished without a token");
                Ok(self.end(dc, result))
            }
        }
    }

    /// Forward one activity and act on the skill's answer. Any failure other
    /// than cancellation ends the skill before it is returned.
    async fn forward(&self, dc: &mut DialogContext, activity: Activity) -> Result<DialogTurnResult> {
        match self.forward_turn(dc, activity).await {
            Ok(result) => Ok(result),
            Err(e) => Err(self.fail(dc, e)),
        }
    }

    fn fail(&self, dc: &mut DialogContext, err: BridgeError) -> BridgeError {
        if err.is_cancelled() {
            warn!(skill = %self.manifest.id, "Skill turn cancelled");
        } else {
            error!(skill = %self.manifest.id, error = %err, "Skill turn failed");
            self.end(dc, None);
        }
        err
    }

    async fn forward_turn(
        &self,
        dc: &mut DialogContext,
        mut activity: Activity,
    ) -> Result<DialogTurnResult> {
        let mut hops = 0u32;

        loop {
            let batch = self.post(dc, &activity).await?;
            let classification = classify(batch);

            if classification.dropped > 0 {
                warn!(
                    skill = %self.manifest.id,
                    dropped = classification.dropped,
                    "Ignoring extra token requests in one batch"
                );
            }

            if classification.token_request.is_some() && !self.auth.is_configured() {
                return Err(BridgeError::Configuration(format!(
                    "skill {} requested a token but no auth dialog is configured",
                    self.manifest.id
                )));
            }

            if !classification.deliver.is_empty() {
                dc.turn
                    .channel()
                    .send_activities(classification.deliver)
                    .await?;
            }

            if classification.end_of_conversation {
                if classification.token_request.is_some() {
                    warn!(skill = %self.manifest.id, "Ignoring token request in a batch that ends the conversation");
                }
                dc.turn.send_trace(END_OF_CONVERSATION_TRACE).await?;
                return Ok(self.end(dc, None));
            }

            let (Some(request), Some(auth)) = (classification.token_request, self.auth.dialog())
            else {
                return Ok(DialogTurnResult::waiting());
            };

            if hops >= self.max_token_hops {
                return Err(BridgeError::TokenHopLimit {
                    skill: self.manifest.id.clone(),
                    limit: self.max_token_hops,
                });
            }
            hops += 1;

            dc.turn.send_trace(TOKEN_REQUEST_TRACE).await?;
            dc.set_state(SkillDialogState::AwaitingAuth);

            match auth.begin(&dc.turn).await? {
                AuthOutcome::Token(token) => {
                    debug!(skill = %self.manifest.id, hop = hops, "Forwarding token response");
                    activity = request.create_reply().to_token_response(&token)?;
                    dc.set_state(SkillDialogState::Forwarding);
                }
                AuthOutcome::Waiting => return Ok(DialogTurnResult::waiting()),
                AuthOutcome::Complete(result) => {
                    info!(skill = %self.manifest.id, "Auth dialog finished without a token");
                    return Ok(self.end(dc, result));
                }
            }
        }
    }

    async fn post(&self, dc: &DialogContext, activity: &Activity) -> Result<Vec<Activity>> {
        debug!(
            skill = %self.manifest.id,
            endpoint = %self.manifest.endpoint,
            kind = ?activity.activity_type,
            "Forwarding activity"
        );
        let result = self
            .transport
            .post_activity(
                &self.manifest.endpoint,
                activity,
                self.credentials.as_ref(),
                dc.turn.cancel(),
            )
            .await;

        if let Err(BridgeError::Transport { status, reason }) = &result {
            let trace = format!(
                "HTTP error when forwarding activity to the skill: Status Code:{status}, Message:{reason}"
            );
            if let Err(e) = dc.turn.send_trace(&trace).await {
                warn!(skill = %self.manifest.id, error = %e, "Could not send HTTP error trace");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TurnContext;
    use skillbridge_channels::MemoryChannel;
    use skillbridge_transport::{AnonymousCredentials, MockTransport};
    use tokio_util::sync::CancellationToken;

    fn dialog(transport: MockTransport) -> SkillDialog {
        let manifest = SkillManifest::new(
            "calendar",
            "http://localhost:3980/api/skill/messages".parse().unwrap(),
        );
        SkillDialog::new(
            manifest,
            Arc::new(transport),
            Arc::new(AnonymousCredentials::new()),
        )
    }

    fn context(channel: &MemoryChannel) -> DialogContext {
        DialogContext::new(TurnContext::new(
            Activity::message("hi"),
            Arc::new(channel.clone()),
            CancellationToken::new(),
        ))
    }

    #[tokio::test]
    async fn test_begin_twice_fails() {
        let channel = MemoryChannel::new("test");
        let skill = dialog(MockTransport::new());
        let mut dc = context(&channel);

        skill.begin(&mut dc, None).await.unwrap();
        assert_eq!(dc.state(), SkillDialogState::Forwarding);
        let err = skill.begin(&mut dc, None).await.unwrap_err();
        assert!(matches!(err, BridgeError::Dialog(_)));
    }

    #[tokio::test]
    async fn test_bot_identity_fills_missing_recipient() {
        let transport = MockTransport::new();
        let skill = dialog(transport.clone())
            .with_bot(ChannelAccount::new("assistant", Some("Virtual Assistant".into())));
        let channel = MemoryChannel::new("test");
        let mut dc = context(&channel);

        skill.begin(&mut dc, None).await.unwrap();
        let begin = &transport.posted()[0];
        assert_eq!(begin.recipient.as_ref().map(|r| r.id.as_str()), Some("assistant"));
    }

    #[tokio::test]
    async fn test_continue_inactive_fails() {
        let channel = MemoryChannel::new("test");
        let skill = dialog(MockTransport::new());
        let mut dc = context(&channel);
        let err = skill.continue_dialog(&mut dc).await.unwrap_err();
        assert!(matches!(err, BridgeError::Dialog(_)));
    }

    #[tokio::test]
    async fn test_end_always_completes() {
        let channel = MemoryChannel::new("test");
        let skill = dialog(MockTransport::new());
        let mut dc = context(&channel);
        let result = skill.end(&mut dc, Some(serde_json::json!({"ok": true})));
        assert!(result.is_complete());
        assert_eq!(dc.state(), SkillDialogState::Inactive);
    }
}
