//! # skillbridge-config
//!
//! Configuration for the skill bridge. Reads `skillbridge.toml`, then applies
//! environment variable overrides. Supports hot-reload via filesystem watcher,
//! and installs the `tracing` subscriber every other crate logs through.

pub mod loader;
pub mod logging;
pub mod schema;

pub use loader::ConfigLoader;
pub use logging::init_tracing;
pub use schema::{
    BotConfig, BridgeConfig, ConfigWarning, CredentialMode, CredentialsConfig, LoggingConfig,
    TransportConfig, WarningSeverity,
};
