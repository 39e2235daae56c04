use serde::{Deserialize, Serialize};
use skillbridge_core::SkillManifest;
use std::collections::HashSet;

/// Root configuration, read from `skillbridge.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bot: BotConfig,
    pub skills: Vec<SkillManifest>,
    pub transport: TransportConfig,
    pub credentials: CredentialsConfig,
    pub logging: LoggingConfig,
}

// ── Bot ────────────────────────────────────────────────────────

/// Identity of the parent assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub id: String,
    pub name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            id: "assistant".into(),
            name: "Virtual Assistant".into(),
        }
    }
}

// ── Transport ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Whole-request timeout for one POST to a skill, in seconds.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on token request / token response round trips chained
    /// inside a single turn.
    pub max_token_hops: u32,
    /// Idle pooled connections kept per skill host.
    pub pool_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("skillbridge/{}", env!("CARGO_PKG_VERSION")),
            max_token_hops: 5,
            pool_idle_per_host: 8,
        }
    }
}

// ── Credentials ────────────────────────────────────────────────

/// How the bridge authenticates itself to skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
    /// No Authorization header (local development, emulator).
    Anonymous,
    /// A fixed bearer token.
    Static,
    /// OAuth2 client-credentials grant with the app id and password.
    ClientCredentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub mode: CredentialMode,
    pub app_id: Option<String>,
    pub app_password: Option<String>,
    pub token_url: String,
    pub scope: Option<String>,
    pub static_token: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            mode: CredentialMode::Anonymous,
            app_id: None,
            app_password: None,
            token_url: "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token"
                .into(),
            scope: None,
            static_token: None,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };
        write!(f, "{} {}: {}", label, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl BridgeConfig {
    /// Look up a skill by id or display name, ignoring case.
    pub fn skill(&self, id_or_name: &str) -> Option<&SkillManifest> {
        self.skills.iter().find(|s| s.matches(id_or_name))
    }

    /// Disconnect a skill by id or name. Returns whether one was removed.
    pub fn remove_skill(&mut self, id_or_name: &str) -> bool {
        let before = self.skills.len();
        self.skills.retain(|s| !s.matches(id_or_name));
        self.skills.len() != before
    }

    /// Validate the configuration. Returns warnings on success, or a combined
    /// message listing every hard error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Skills ───
        if self.skills.is_empty() {
            warnings.push(ConfigWarning {
                field: "skills".into(),
                message: "no skills configured, nothing to forward to".into(),
                severity: WarningSeverity::Info,
                hint: Some("Add a [[skills]] table with an id and endpoint".into()),
            });
        }

        let mut seen = HashSet::new();
        for (i, skill) in self.skills.iter().enumerate() {
            if skill.id.trim().is_empty() {
                warnings.push(ConfigWarning {
                    field: format!("skills[{}].id", i),
                    message: "skill id is empty".into(),
                    severity: WarningSeverity::Error,
                    hint: None,
                });
            } else if !seen.insert(skill.id.to_ascii_lowercase()) {
                warnings.push(ConfigWarning {
                    field: format!("skills[{}].id", i),
                    message: format!("duplicate skill id '{}'", skill.id),
                    severity: WarningSeverity::Error,
                    hint: Some("Skill ids must be unique (case-insensitive)".into()),
                });
            }

            let scheme = skill.endpoint.scheme();
            if scheme != "http" && scheme != "https" {
                warnings.push(ConfigWarning {
                    field: format!("skills[{}].endpoint", i),
                    message: format!("unsupported endpoint scheme '{}'", scheme),
                    severity: WarningSeverity::Error,
                    hint: Some("Skill endpoints must be http:// or https:// URLs".into()),
                });
            } else if scheme == "http" && !is_local(&skill.endpoint) {
                warnings.push(ConfigWarning {
                    field: format!("skills[{}].endpoint", i),
                    message: format!("skill '{}' is reached over plain http", skill.id),
                    severity: WarningSeverity::Warning,
                    hint: Some("Credentials are sent in clear text; use https".into()),
                });
            }
        }

        // ── Transport ───
        if self.transport.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                field: "transport.timeout_secs".into(),
                message: "timeout is 0, requests to skills never time out".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set to e.g. 30".into()),
            });
        }
        if self.transport.max_token_hops == 0 {
            warnings.push(ConfigWarning {
                field: "transport.max_token_hops".into(),
                message: "max_token_hops is 0, any token request ends the skill".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set to e.g. 5".into()),
            });
        }

        // ── Credentials ───
        match self.credentials.mode {
            CredentialMode::Anonymous => {}
            CredentialMode::Static => {
                if self.credentials.static_token.is_none() {
                    warnings.push(ConfigWarning {
                        field: "credentials.static_token".into(),
                        message: "static mode selected but no token set".into(),
                        severity: WarningSeverity::Error,
                        hint: None,
                    });
                }
            }
            CredentialMode::ClientCredentials => {
                if self.credentials.app_id.is_none() || self.credentials.app_password.is_none() {
                    warnings.push(ConfigWarning {
                        field: "credentials.app_password".into(),
                        message: "client_credentials mode needs both app_id and app_password"
                            .into(),
                        severity: WarningSeverity::Error,
                        hint: Some("Set SKILLBRIDGE_APP_ID and SKILLBRIDGE_APP_PASSWORD".into()),
                    });
                }
                if url::Url::parse(&self.credentials.token_url).is_err() {
                    warnings.push(ConfigWarning {
                        field: "credentials.token_url".into(),
                        message: format!("invalid token url '{}'", self.credentials.token_url),
                        severity: WarningSeverity::Error,
                        hint: None,
                    });
                }
            }
        }

        // ── Logging format ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Logging level ───
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}

fn is_local(url: &url::Url) -> bool {
    matches!(url.host_str(), Some("localhost") | Some("127.0.0.1") | Some("[::1]"))
}
