//! Config schema types (core credentials, data sources, notify, run, gateway).
use std::path::{Path, PathBuf};

use {
    muster_common::PostJoinAction,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MusterConfig {
    pub core: CoreConfig,
    pub data: DataConfig,
    /// Completion reports are only sent when this section is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyConfig>,
    pub run: RunSettings,
    pub gateway: GatewayConfig,
}

impl MusterConfig {
    /// Resolve relative data source paths against `base` (normally the
    /// directory holding the config file).
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.data.sessions, &mut self.data.channels] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Credential pair shared by every account session.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub api_id: i32,
    #[serde(serialize_with = "serialize_secret")]
    pub api_hash: Secret<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_id: 0,
            api_hash: Secret::new(String::new()),
        }
    }
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_id", &self.api_id)
            .field("api_hash", &"[REDACTED]")
            .finish()
    }
}

/// Locations of the account and channel sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Delimited file whose first column holds session identifiers.
    pub sessions: PathBuf,
    /// Delimited file with `display name, channel id, invite token` rows.
    pub channels: PathBuf,
    /// Field delimiter for both files.
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sessions: PathBuf::from("accounts.csv"),
            channels: PathBuf::from("channels.csv"),
            delimiter: ',',
        }
    }
}

/// Operator-facing completion reports, delivered by a bot.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Chat that receives one message per completed (account, channel) pair.
    pub chat_id: String,
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub bot_token: Secret<String>,
    /// Label of the bot session, shown in logs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Self-hosted Bot API server; `https://api.telegram.org` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            chat_id: String::new(),
            bot_token: Secret::new(String::new()),
            session: None,
            api_url: None,
        }
    }
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("chat_id", &self.chat_id)
            .field("bot_token", &"[REDACTED]")
            .field("session", &self.session)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Defaults for a run; every field can be overridden on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub post_join_action: PostJoinAction,
    /// Process a random subset of this many accounts instead of all of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_sample_size: Option<usize>,
    /// Pause between two channels, in seconds.
    pub inter_channel_delay_secs: u64,
    /// Seed for account sampling; a fresh random draw when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// HTTP session gateway that hosts the account sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Transport timeout of the HTTP client, in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".into(),
            timeout_secs: 60,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
