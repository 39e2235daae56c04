use thiserror::Error;

/// Unified error type for the skill bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    // ── Wiring errors ──────────────────────────────────────────
    /// The host is not wired for something the skill asked for
    /// (e.g. a token request with no auth dialog configured).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("skill not found: {0}")]
    SkillNotFound(String),

    // ── Transport errors ───────────────────────────────────────
    /// The skill answered with a non-success HTTP status.
    #[error("{reason}")]
    Transport { status: u16, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("credential error: {0}")]
    Credentials(String),

    #[error("operation cancelled")]
    Cancelled,

    // ── Dialog errors ──────────────────────────────────────────
    #[error("skill {skill} exceeded {limit} chained token exchanges in one turn")]
    TokenHopLimit { skill: String, limit: u32 },

    #[error("dialog error: {0}")]
    Dialog(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    /// Whether the failure came from caller-supplied cancellation rather than
    /// from the skill or the network.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BridgeError::Cancelled)
    }

    /// HTTP status carried by a transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BridgeError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
