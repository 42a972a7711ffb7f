use std::{env, fs, path::PathBuf};

use crate::platform::error::{PlatformError, PlatformResult};

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
const TOKEN_ENV: &str = "DISCORD_TOKEN";
const TOKEN_FILE_ENV: &str = "DISCORD_TOKEN_FILE";
const DEFAULT_TOKEN_FILE: &str = "token";

/// Runtime configuration describing how to reach the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub api_base: String,
    pub token: String,
}

impl DiscordConfig {
    /// Construct a configuration for the public API with the given bot token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
        }
    }

    /// Point the client at another API root (proxies, test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Build a configuration from `DISCORD_TOKEN`, falling back to the token file.
    ///
    /// The token file defaults to `./token` and can be moved with `DISCORD_TOKEN_FILE`.
    pub fn from_env() -> PlatformResult<Self> {
        let token = match env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => token,
            _ => read_token_file()?,
        };

        let mut config = Self::new(token.trim_end_matches(['\r', '\n']));
        if let Ok(api_base) = env::var("DISCORD_API_BASE") {
            config = config.with_api_base(api_base);
        }
        Ok(config)
    }
}

fn read_token_file() -> PlatformResult<String> {
    let path = env::var_os(TOKEN_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));

    fs::read_to_string(&path)
        .ok()
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| PlatformError::MissingToken {
            var: TOKEN_ENV,
            file: path.display().to_string(),
        })
}
