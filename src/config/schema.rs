use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_PRIMARY_URL: &str = "UPSTASH_REDIS_REST_URL";
pub const ENV_PRIMARY_TOKEN: &str = "UPSTASH_REDIS_REST_TOKEN";
pub const ENV_HOT_URL: &str = "UPSTASH_REDIS_REST_URL2";
pub const ENV_HOT_TOKEN: &str = "UPSTASH_REDIS_REST_TOKEN2";

// ── Store endpoints ───────────────────────────────────────────────

/// Connection endpoint and bearer credential for one remote store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreEndpoint {
    pub url: String,
    pub token: String,
}

impl StoreEndpoint {
    pub fn new(url: impl AsRef<str>, token: impl AsRef<str>) -> Self {
        Self {
            url: strip_quotes(url.as_ref()).trim_end_matches('/').to_string(),
            token: strip_quotes(token.as_ref()).to_string(),
        }
    }
}

impl fmt::Debug for StoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreEndpoint")
            .field("url", &self.url)
            .field("token", &"[redacted]")
            .finish()
    }
}

// Some shell configs embed the quotes in the exported value.
fn strip_quotes(value: &str) -> &str {
    value.trim().trim_matches('"').trim_matches('\'')
}

// ── Session ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Prior sessions carried forward in the state (default: 5)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Entries kept in the project session log (default: 100)
    #[serde(default = "default_log_limit")]
    pub log_limit: usize,
}

fn default_history_limit() -> usize {
    5
}

fn default_log_limit() -> usize {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            log_limit: default_log_limit(),
        }
    }
}

// ── Broadcast ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Envelopes kept per recipient channel (default: 50)
    #[serde(default = "default_retention")]
    pub retention: usize,
    /// Seconds between polls in the await loop (default: 300)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_retention() -> usize {
    50
}

fn default_poll_interval_secs() -> u64 {
    300
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            retention: default_retention(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

// ── File-backed tunables ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    project: Option<String>,
    agent_id: Option<String>,
    request_timeout_secs: Option<u64>,
    session: SessionConfig,
    broadcast: BroadcastConfig,
}

// ── Top-level config ──────────────────────────────────────────────

/// Process-wide configuration, built once at startup and handed to every
/// component constructor.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub primary: StoreEndpoint,
    /// Secondary store for short-lived ancillary data.
    pub hot: StoreEndpoint,
    pub project: String,
    pub agent_id: String,
    pub request_timeout_secs: u64,
    pub session: SessionConfig,
    pub broadcast: BroadcastConfig,
}

pub const DEFAULT_PROJECT: &str = "default";
pub const DEFAULT_AGENT: &str = "orchestrator";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

impl BoardConfig {
    /// Endpoints only; tunables at their defaults.
    pub fn new(primary: StoreEndpoint, hot: StoreEndpoint) -> Self {
        Self {
            primary,
            hot,
            project: DEFAULT_PROJECT.into(),
            agent_id: DEFAULT_AGENT.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session: SessionConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }

    /// Read credentials from the process environment and tunables from the
    /// default config file, if one exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => Some(expand_path(path)),
            None => default_config_path(),
        };
        Self::load_with(path.as_deref(), |name| std::env::var(name).ok())
    }

    /// Same as [`BoardConfig::load`] with an injectable variable lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) if path.exists() => read_file_config(path)?,
            _ => FileConfig::default(),
        };

        let mut config = Self::from_lookup(lookup)?;
        if let Some(project) = file.project {
            config.project = project;
        }
        if let Some(agent_id) = file.agent_id {
            config.agent_id = agent_id;
        }
        if let Some(timeout) = file.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
        config.session = file.session;
        config.broadcast = file.broadcast;
        config.validate()?;
        Ok(config)
    }

    /// Credentials only. Every one of the four variables is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !strip_quotes(value).is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(name.to_string()))
        };

        let primary = StoreEndpoint::new(require(ENV_PRIMARY_URL)?, require(ENV_PRIMARY_TOKEN)?);
        let hot = StoreEndpoint::new(require(ENV_HOT_URL)?, require(ENV_HOT_TOKEN)?);
        Ok(Self::new(primary, hot))
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.trim().is_empty() {
            return Err(ConfigError::Validation("project must not be empty".into()));
        }
        if self.agent_id.trim().is_empty() {
            return Err(ConfigError::Validation("agent_id must not be empty".into()));
        }
        if self.session.history_limit == 0 {
            return Err(ConfigError::Validation(
                "session.history_limit must be at least 1".into(),
            ));
        }
        if self.session.log_limit == 0 {
            return Err(ConfigError::Validation(
                "session.log_limit must be at least 1".into(),
            ));
        }
        if self.broadcast.retention == 0 {
            return Err(ConfigError::Validation(
                "broadcast.retention must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw)
        .map_err(|error| ConfigError::Load(format!("{}: {error}", path.display())))
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).to_string())
}

/// `~/.blackboard/config.toml`, when a home directory can be resolved.
pub fn default_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().join(".blackboard").join("config.toml"))
}
