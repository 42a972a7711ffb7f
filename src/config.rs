//! Application-level configuration loading: command prefix, record file and access lists.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::platform::Snowflake;

/// Default location on disk where the bot looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COMPAT_BOT_CONFIG_PATH";
/// Environment variable that overrides the relay secret from the file.
const RELAY_TOKEN_ENV: &str = "RELAY_TOKEN";

const DEFAULT_PREFIX: &str = ">";
const DEFAULT_DATABASE: &str = "games.json";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Prefix a message must start with to be treated as a command.
    pub command_prefix: String,
    /// Location of the JSON record file.
    pub database_path: PathBuf,
    /// Account allowed to run owner-only commands; also receives error reports.
    pub owner_id: Snowflake,
    /// Accounts allowed to edit the list besides the owner.
    pub editor_user_ids: Vec<Snowflake>,
    /// Members of any of these roles may edit the list.
    pub editor_role_ids: Vec<Snowflake>,
    /// Shared secret the gateway relay presents on every event.
    pub relay_token: Option<String>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        editors = app_config.editor_user_ids.len(),
                        editor_roles = app_config.editor_role_ids.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(token) = env::var(RELAY_TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
            config.relay_token = Some(token);
        }
        if config.relay_token.is_none() {
            warn!("no relay token configured; every inbound event will be rejected");
        }
        config
    }

    /// Whether `user_id` is the bot owner.
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id != 0 && self.owner_id == user_id
    }

    /// Whether a user with the given id and roles may modify the list.
    pub fn is_editor(&self, user_id: Snowflake, roles: &[Snowflake]) -> bool {
        self.is_owner(user_id)
            || self.editor_user_ids.contains(&user_id)
            || roles.iter().any(|role| self.editor_role_ids.contains(role))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command_prefix: DEFAULT_PREFIX.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE),
            owner_id: 0,
            editor_user_ids: Vec::new(),
            editor_role_ids: Vec::new(),
            relay_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    database: Option<PathBuf>,
    #[serde(default)]
    owner_id: Snowflake,
    #[serde(default)]
    editors: Vec<Snowflake>,
    #[serde(default)]
    editor_roles: Vec<Snowflake>,
    #[serde(default)]
    relay_token: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            command_prefix: value
                .prefix
                .filter(|prefix| !prefix.trim().is_empty())
                .unwrap_or(defaults.command_prefix),
            database_path: value.database.unwrap_or(defaults.database_path),
            owner_id: value.owner_id,
            editor_user_ids: value.editors,
            editor_role_ids: value.editor_roles,
            relay_token: value.relay_token.filter(|token| !token.is_empty()),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
