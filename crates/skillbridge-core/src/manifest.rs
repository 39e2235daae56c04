use serde::{Deserialize, Serialize};
use url::Url;

/// Static description of a remote skill.
///
/// Only `id` and `endpoint` drive forwarding; the rest is carried for hosts
/// that want to inspect what a skill offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillManifest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where activities for this skill are POSTed.
    pub endpoint: Url,
    /// App id the skill authenticates as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msa_app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication_connections: Vec<AuthenticationConnection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SkillAction>,
}

/// An OAuth connection the skill needs the host to obtain tokens for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationConnection {
    pub id: String,
    #[serde(default)]
    pub service_provider_id: String,
    #[serde(default)]
    pub scopes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAction {
    pub id: String,
    #[serde(default)]
    pub definition: ActionDefinition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub triggers: Triggers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// What invokes an action: utterances from language models, or named events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triggers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub utterance_sources: Vec<UtteranceSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<TriggerEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtteranceSource {
    pub locale: String,
    #[serde(default)]
    pub source: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub name: String,
}

impl SkillManifest {
    pub fn new(id: impl Into<String>, endpoint: Url) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            endpoint,
            msa_app_id: None,
            authentication_connections: vec![],
            actions: vec![],
        }
    }

    /// Whether the skill declares any OAuth connection, i.e. it may send
    /// token requests.
    pub fn requires_auth(&self) -> bool {
        !self.authentication_connections.is_empty()
    }

    /// Match against an id or display name, ignoring case.
    pub fn matches(&self, id_or_name: &str) -> bool {
        self.id.eq_ignore_ascii_case(id_or_name) || self.name.eq_ignore_ascii_case(id_or_name)
    }

    /// Names of every slot declared across all actions, deduplicated.
    pub fn slot_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for action in &self.actions {
            for slot in &action.definition.slots {
                if !names.contains(&slot.name) {
                    names.push(slot.name.clone());
                }
            }
        }
        names
    }
}
