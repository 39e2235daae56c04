//! # skillbridge-transport
//!
//! Reaching remote skills: the [`SkillTransport`] that POSTs an activity and
//! reads back the response batch, and the [`CredentialProvider`]s that attach
//! caller identity to those requests.

pub mod credentials;
pub mod http;
pub mod mock;

pub use credentials::{
    AnonymousCredentials, AppCredentials, CredentialProvider, StaticTokenCredentials,
    TrustedEndpoints,
};
pub use http::{ACTIVITY_CONTENT_TYPE, HttpTransport, SkillTransport};
pub use mock::{MockReply, MockTransport};
