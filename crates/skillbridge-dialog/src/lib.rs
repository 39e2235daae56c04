//! # skillbridge-dialog
//!
//! The skill forwarding protocol. A [`SkillDialog`] forwards each turn of a
//! conversation to a remote skill, relays what comes back, hands token
//! requests to an [`AuthDialog`], and ends when the skill says it is done.
//! [`SkillHost`] keeps track of which skill owns which conversation.
//!
//! | Module | Role |
//! |--------|------|
//! | [`classifier`] | Splits a skill's response batch |
//! | [`auth`] | Contract for the token-collecting sub-dialog |
//! | [`context`] | Turn and per-conversation dialog state |
//! | [`skill_dialog`] | The forwarding state machine |
//! | [`host`] | Conversation-to-skill routing |

pub mod auth;
pub mod classifier;
pub mod context;
pub mod host;
pub mod skill_dialog;

pub use auth::{AuthDialog, AuthOutcome, AuthSlot};
pub use classifier::{Classification, classify};
pub use context::{DialogContext, SkillDialogState, TurnContext};
pub use host::{ActiveSkill, DEFAULT_SKILL_SCOPE, SkillHost};
pub use skill_dialog::{DEFAULT_MAX_TOKEN_HOPS, SkillDialog};
