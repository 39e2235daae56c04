//! Per-conversation routing between the parent bot and its skills.
//!
//! The host keeps one [`SkillDialog`] per configured skill and remembers,
//! for each conversation, which skill currently owns it. While a skill is
//! active every turn goes to it; the host never begins a second skill in a
//! conversation that already has one.

use dashmap::DashMap;
use skillbridge_channels::Channel;
use skillbridge_config::BridgeConfig;
use skillbridge_core::{
    Activity, BridgeError, ChannelAccount, DialogTurnResult, Result, SkillManifest,
};
use skillbridge_transport::{HttpTransport, SkillTransport, credentials};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::auth::AuthDialog;
use crate::context::{DialogContext, SkillDialogState, TurnContext};
use crate::skill_dialog::SkillDialog;

/// Scope requested for skills whose manifest carries no app id.
pub const DEFAULT_SKILL_SCOPE: &str = "https://api.botframework.com/.default";

/// The skill that owns a conversation, and where it is in its flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSkill {
    pub skill_id: String,
    pub state: SkillDialogState,
}

pub struct SkillHost {
    /// Keyed by lower-cased skill id.
    dialogs: HashMap<String, SkillDialog>,
    conversations: DashMap<String, ActiveSkill>,
}

impl SkillHost {
    pub fn new() -> Self {
        Self {
            dialogs: HashMap::new(),
            conversations: DashMap::new(),
        }
    }

    /// Build a host for every skill in the config.
    ///
    /// All skills share one HTTP client. Each skill gets its own credential
    /// provider so client-credential tokens are requested for that skill's
    /// app id.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.transport)?;
        let client = transport.client().clone();
        let transport: Arc<dyn SkillTransport> = Arc::new(transport);

        let bot = ChannelAccount::new(config.bot.id.clone(), Some(config.bot.name.clone()));
        let mut host = Self::new();
        for manifest in &config.skills {
            let scope = skill_scope(manifest);
            let creds = credentials::from_config(&config.credentials, client.clone(), &scope)?;
            let dialog = SkillDialog::new(manifest.clone(), transport.clone(), creds)
                .with_max_token_hops(config.transport.max_token_hops)
                .with_bot(bot.clone());
            host.register(dialog);
        }

        info!(skills = host.dialogs.len(), "Skill host ready");
        Ok(host)
    }

    /// Add or replace a skill dialog.
    pub fn register(&mut self, dialog: SkillDialog) {
        debug!(skill = dialog.id(), "Registering skill");
        self.dialogs.insert(dialog.id().to_lowercase(), dialog);
    }

    /// Wire an auth dialog into an already registered skill.
    pub fn set_auth_dialog(&mut self, skill_id: &str, auth: Arc<dyn AuthDialog>) -> Result<()> {
        let key = skill_id.to_lowercase();
        let dialog = self
            .dialogs
            .remove(&key)
            .ok_or_else(|| BridgeError::SkillNotFound(skill_id.to_string()))?;
        self.dialogs.insert(key, dialog.with_auth_dialog(auth));
        Ok(())
    }

    pub fn dialog(&self, skill_id: &str) -> Option<&SkillDialog> {
        self.dialogs.get(&skill_id.to_lowercase())
    }

    pub fn skills(&self) -> Vec<&SkillManifest> {
        self.dialogs.values().map(|d| d.manifest()).collect()
    }

    /// The skill currently owning a conversation.
    pub fn active_skill(&self, conversation_id: &str) -> Option<ActiveSkill> {
        self.conversations.get(conversation_id).map(|e| e.clone())
    }

    pub fn active_conversations(&self) -> usize {
        self.conversations.len()
    }

    /// Forget whatever skill owns a conversation. The skill is not notified.
    pub fn cancel_conversation(&self, conversation_id: &str) -> bool {
        let removed = self.conversations.remove(conversation_id).is_some();
        if removed {
            info!(conversation = conversation_id, "Skill conversation cancelled");
        }
        removed
    }

    /// Run one inbound turn.
    ///
    /// `skill_id` picks the skill to begin when the conversation has none.
    /// If a skill is already active, the turn continues that skill instead.
    /// A cancelled turn leaves the conversation as it was before the turn.
    pub async fn on_turn(
        &self,
        skill_id: &str,
        activity: Activity,
        channel: Arc<dyn Channel>,
        cancel: CancellationToken,
    ) -> Result<DialogTurnResult> {
        let conversation_id = activity
            .conversation_id()
            .ok_or_else(|| BridgeError::Dialog("activity has no conversation id".into()))?
            .to_string();

        let active = self.active_skill(&conversation_id);
        let owner = active
            .as_ref()
            .map(|a| a.skill_id.clone())
            .unwrap_or_else(|| skill_id.to_string());
        let dialog = self
            .dialog(&owner)
            .ok_or_else(|| BridgeError::SkillNotFound(owner.clone()))?;

        let turn = TurnContext::new(activity, channel, cancel);
        let result = match &active {
            Some(active) => {
                if !active.skill_id.eq_ignore_ascii_case(skill_id) {
                    debug!(
                        conversation = %conversation_id,
                        active = %active.skill_id,
                        requested = skill_id,
                        "Routing turn to active skill"
                    );
                }
                let mut dc = DialogContext::with_state(turn, active.state);
                let result = dialog.continue_dialog(&mut dc).await;
                (result, dc.state())
            }
            None => {
                let mut dc = DialogContext::new(turn);
                let result = dialog.begin(&mut dc, None).await;
                (result, dc.state())
            }
        };

        match result {
            (Err(e), _) if e.is_cancelled() => Err(e),
            (result, state) => {
                if state.is_active() {
                    self.conversations.insert(
                        conversation_id,
                        ActiveSkill {
                            skill_id: dialog.id().to_string(),
                            state,
                        },
                    );
                } else {
                    self.conversations.remove(&conversation_id);
                }
                result
            }
        }
    }
}

impl Default for SkillHost {
    fn default() -> Self {
        Self::new()
    }
}

fn skill_scope(manifest: &SkillManifest) -> String {
    match &manifest.msa_app_id {
        Some(app_id) if !app_id.is_empty() => format!("{app_id}/.default"),
        _ => DEFAULT_SKILL_SCOPE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_scope() {
        let mut manifest = SkillManifest::new(
            "calendar",
            "http://localhost:3980/api/skill/messages".parse().unwrap(),
        );
        assert_eq!(skill_scope(&manifest), DEFAULT_SKILL_SCOPE);
        manifest.msa_app_id = Some("1234".into());
        assert_eq!(skill_scope(&manifest), "1234/.default");
    }

    #[test]
    fn test_from_config_registers_skills() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [[skills]]
            id = "calendar"
            name = "Calendar"
            endpoint = "http://localhost:3980/api/skill/messages"
            "#,
        )
        .unwrap();
        let host = SkillHost::from_config(&config).unwrap();
        assert!(host.dialog("Calendar").is_some());
        assert_eq!(host.skills().len(), 1);
        assert!(host.active_skill("conv").is_none());
    }
}
