use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

pub const DEFAULT_UPSTREAM_URL: &str = "http://api.plos.org/search";
pub const DEFAULT_LOCAL_BROKER_URL: &str = "mem://local";
pub const DEFAULT_CLOUD_BROKER_URL: &str = "nats://demo.nats.io:4222";
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("PAPERBRIDGE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("paperbridge/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| BridgeError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| BridgeError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.upstream {
            self.upstream.merge(patch);
        }
        if let Some(patch) = patch.broker {
            self.broker.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("PAPERBRIDGE_UPSTREAM_BASE_URL") {
            self.upstream.base_url = value;
        }
        if let Some(value) = env_u64("PAPERBRIDGE_UPSTREAM_TIMEOUT_MS")? {
            self.upstream.timeout_ms = value;
        }
        if let Some(values) = env_list("PAPERBRIDGE_UPSTREAM_FIELDS") {
            self.upstream.fields = values;
        }

        if let Some(value) = env_string("PAPERBRIDGE_BROKER_MODE") {
            self.broker.mode = value.parse()?;
        }
        if let Some(value) = env_string("PAPERBRIDGE_BROKER_LOCAL_URL") {
            self.broker.local_url = value;
        }
        if let Some(value) = env_string("PAPERBRIDGE_BROKER_CLOUD_URL") {
            self.broker.cloud_url = value;
        }
        if let Some(value) = env_u64("PAPERBRIDGE_BROKER_CONNECT_TIMEOUT_SECS")? {
            self.broker.connect_timeout_secs = value;
        }
        if let Some(value) = env_u64("PAPERBRIDGE_BROKER_REPLY_TIMEOUT_MS")? {
            self.broker.reply_timeout_ms = value;
        }
        if let Some(value) = env_string("PAPERBRIDGE_BROKER_INBOX_PREFIX") {
            self.broker.inbox_prefix = value;
        }

        Ok(())
    }

    /// Reject values the bridge cannot run with and keep the upstream HTTP
    /// timeout within the broker wait.
    pub fn validate(&mut self) -> Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(BridgeError::MissingConfig("upstream.base_url".to_string()));
        }
        if self.broker.reply_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "broker.reply_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.broker.inbox_prefix.trim().is_empty()
            || self.broker.inbox_prefix.contains(char::is_whitespace)
        {
            return Err(BridgeError::Config(format!(
                "broker.inbox_prefix {:?} must be a non-empty token without whitespace",
                self.broker.inbox_prefix
            )));
        }

        if self.upstream.timeout() > self.broker.reply_timeout() {
            tracing::warn!(
                upstream_ms = self.upstream.timeout_ms,
                reply_ms = self.broker.reply_timeout_ms,
                "upstream timeout exceeds broker reply timeout; clamping"
            );
            self.upstream.timeout_ms = self.broker.reply_timeout_ms;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout_ms: 5_000,
            fields: [
                "id",
                "title",
                "abstract_primary_display",
                "journal",
                "publication_date",
                "author",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl UpstreamConfig {
    fn merge(&mut self, patch: UpstreamPatch) {
        if let Some(value) = patch.base_url {
            self.base_url = value;
        }
        if let Some(value) = patch.timeout_ms {
            self.timeout_ms = value;
        }
        if let Some(values) = patch.fields {
            self.fields = values;
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

/// How the search service reaches its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeMode {
    /// Publish the result on the broker and wait for it on a reply channel.
    #[default]
    Broker,
    /// Skip the broker round trip and hand the serialized result back directly.
    Direct,
}

impl std::str::FromStr for BridgeMode {
    type Err = BridgeError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "broker" => Ok(Self::Broker),
            "direct" => Ok(Self::Direct),
            other => Err(BridgeError::Config(format!(
                "invalid broker mode {other} (expected broker|direct)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub mode: BridgeMode,
    #[serde(default)]
    pub local_url: String,
    #[serde(default)]
    pub cloud_url: String,
    #[serde(default)]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub reply_timeout_ms: u64,
    #[serde(default)]
    pub inbox_prefix: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            mode: BridgeMode::Broker,
            local_url: DEFAULT_LOCAL_BROKER_URL.to_string(),
            cloud_url: DEFAULT_CLOUD_BROKER_URL.to_string(),
            connect_timeout_secs: 10,
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
            inbox_prefix: "_INBOX".to_string(),
        }
    }
}

impl BrokerConfig {
    fn merge(&mut self, patch: BrokerPatch) {
        if let Some(value) = patch.mode {
            self.mode = value;
        }
        if let Some(value) = patch.local_url {
            self.local_url = value;
        }
        if let Some(value) = patch.cloud_url {
            self.cloud_url = value;
        }
        if let Some(value) = patch.connect_timeout_secs {
            self.connect_timeout_secs = value;
        }
        if let Some(value) = patch.reply_timeout_ms {
            self.reply_timeout_ms = value;
        }
        if let Some(value) = patch.inbox_prefix {
            self.inbox_prefix = value;
        }
    }

    #[must_use]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    /// URL of the broker for the requested deployment.
    #[must_use]
    pub fn url_for(&self, in_cloud: bool) -> &str {
        if in_cloud {
            &self.cloud_url
        } else {
            &self.local_url
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub upstream: Option<UpstreamPatch>,
    pub broker: Option<BrokerPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct UpstreamPatch {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BrokerPatch {
    pub mode: Option<BridgeMode>,
    pub local_url: Option<String>,
    pub cloud_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub reply_timeout_ms: Option<u64>,
    pub inbox_prefix: Option<String>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u64>().map(Some).map_err(|err| {
            BridgeError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}
