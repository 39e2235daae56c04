use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use skillbridge_core::BridgeError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::schema::{BridgeConfig, CredentialMode};

/// Loads and optionally hot-reloads the bridge configuration.
pub struct ConfigLoader {
    config: Arc<RwLock<BridgeConfig>>,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > SKILLBRIDGE_CONFIG env > ~/.skillbridge/skillbridge.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("SKILLBRIDGE_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".skillbridge")
            .join("skillbridge.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> skillbridge_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            Self::read(&config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            BridgeConfig::default()
        };

        let config = Self::apply_env_overrides(config);

        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(BridgeError::Config(e));
            }
        }

        info!(skills = config.skills.len(), "configuration ready");

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    /// Get a read snapshot of the current config.
    pub fn get(&self) -> BridgeConfig {
        self.config.read().clone()
    }

    /// Get a shared reference for subscription.
    pub fn shared(&self) -> Arc<RwLock<BridgeConfig>> {
        Arc::clone(&self.config)
    }

    /// Path being watched.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    fn read(path: &Path) -> skillbridge_core::Result<BridgeConfig> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str::<BridgeConfig>(&raw).map_err(|e| {
            BridgeError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply env var overrides (SKILLBRIDGE_LOG_LEVEL, SKILLBRIDGE_TIMEOUT_SECS, etc.)
    pub fn apply_env_overrides(mut config: BridgeConfig) -> BridgeConfig {
        if let Ok(v) = std::env::var("SKILLBRIDGE_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse::<u64>() {
                config.transport.timeout_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("SKILLBRIDGE_MAX_TOKEN_HOPS") {
            if let Ok(hops) = v.parse::<u32>() {
                config.transport.max_token_hops = hops;
            }
        }
        // App credentials: config file takes priority, env is the fallback.
        if config.credentials.app_id.is_none() {
            if let Ok(v) = std::env::var("SKILLBRIDGE_APP_ID") {
                config.credentials.app_id = Some(v);
            }
        }
        if config.credentials.app_password.is_none() {
            if let Ok(v) = std::env::var("SKILLBRIDGE_APP_PASSWORD") {
                config.credentials.app_password = Some(v);
            }
        }
        // Supplying both halves through the environment switches an
        // unconfigured bridge to the client-credentials grant.
        if config.credentials.mode == CredentialMode::Anonymous
            && config.credentials.app_id.is_some()
            && config.credentials.app_password.is_some()
        {
            config.credentials.mode = CredentialMode::ClientCredentials;
        }
        config
    }

    /// Reload the config from disk.
    pub fn reload(&self) -> skillbridge_core::Result<()> {
        if !self.config_path.exists() {
            return Err(BridgeError::Config(format!(
                "config file not found: {}",
                self.config_path.display()
            )));
        }
        let new_config = Self::apply_env_overrides(Self::read(&self.config_path)?);
        new_config.validate().map_err(BridgeError::Config)?;
        *self.config.write() = new_config;
        info!("configuration reloaded");
        Ok(())
    }

    /// Start a background file watcher that swaps in the new config when the
    /// file changes. The returned watcher must be kept alive.
    ///
    /// Skill dialogs already running keep the manifest they were built with;
    /// only hosts built after the reload see the change.
    pub fn watch(&self) -> skillbridge_core::Result<notify::RecommendedWatcher> {
        let config = Arc::clone(&self.config);
        let config_path = self.config_path.clone();

        info!(?config_path, "starting config file watcher");

        let path_for_event = config_path.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(error = %e, "file watcher error");
                        return;
                    }
                };
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                let is_our_file = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == path_for_event.file_name());
                if !is_our_file {
                    return;
                }

                info!("config file changed, reloading");
                match ConfigLoader::read(&path_for_event) {
                    Ok(new_config) => {
                        let new_config = ConfigLoader::apply_env_overrides(new_config);
                        if let Err(e) = new_config.validate() {
                            warn!(error = %e, "new config is invalid, keeping current config");
                            return;
                        }
                        *config.write() = new_config;
                        info!("configuration hot-reloaded successfully");
                    }
                    Err(e) => {
                        warn!(error = %e, "config file has errors, keeping current config");
                    }
                }
            })
            .map_err(|e| BridgeError::Config(format!("failed to create file watcher: {}", e)))?;

        // Watch the parent directory (some editors create temp files + rename)
        let watch_path = self.config_path.parent().unwrap_or(Path::new("."));
        watcher
            .watch(watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                BridgeError::Config(format!("failed to watch config directory: {}", e))
            })?;

        Ok(watcher)
    }
}
