//! # skillbridge-core
//!
//! Shared vocabulary for the skill bridge: the wire-compatible [`Activity`]
//! model, skill manifests, dialog turn results, and the unified error type.

pub mod activity;
pub mod error;
pub mod manifest;
pub mod turn;

pub use activity::{
    Activity, ActivityType, ChannelAccount, ConversationAccount, SKILL_BEGIN_EVENT,
    TOKEN_REQUEST_EVENT, TOKEN_RESPONSE_EVENT, TokenResponse,
};
pub use error::{BridgeError, Result};
pub use manifest::{AuthenticationConnection, SkillManifest};
pub use turn::{DialogTurnResult, DialogTurnStatus};
