use crate::error::Result;
use crate::store::{Command, Keys, Store};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default lifetime of a cached agent profile on the hot store.
pub const PROFILE_TTL: Duration = Duration::from_secs(86_400);

/// Registry value for an agent. Free text on the wire; the protocol itself
/// only ever writes `spawning` and `completed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStatus {
    Spawning,
    Active,
    Completed,
    Parked,
    Other(String),
}

impl AgentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Spawning => "spawning",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Parked => "parked",
            Self::Other(value) => value,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "spawning" => Self::Spawning,
            "active" => Self::Active,
            "completed" => Self::Completed,
            "parked" => Self::Parked,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short-lived descriptive data about an agent, kept on the hot store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub agent: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub progress: f64,
}

/// Live agent registry (primary store) plus the profile cache (hot store).
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    store: Store,
    hot: Store,
    keys: Keys,
}

impl AgentRegistry {
    pub fn new(store: Store, hot: Store, keys: Keys) -> Self {
        Self { store, hot, keys }
    }

    /// Registry write for inclusion in a larger batch.
    pub fn status_command(&self, agent: &str, status: &AgentStatus) -> Command {
        Command::hset(self.keys.agents(), agent, status.as_str())
    }

    pub async fn set_status(&self, agent: &str, status: &AgentStatus) -> Result<()> {
        self.store
            .hset(&self.keys.agents(), agent, status.as_str())
            .await?;
        tracing::debug!(project = self.keys.project(), agent, status = %status, "registry updated");
        Ok(())
    }

    /// Register many agents in one batch.
    pub async fn register_all<'a, I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, AgentStatus)>,
    {
        let commands: Vec<Command> = entries
            .into_iter()
            .map(|(agent, status)| self.status_command(agent, &status))
            .collect();
        if commands.is_empty() {
            return Ok(());
        }
        self.store.batch(commands).await?;
        Ok(())
    }

    pub async fn statuses(&self) -> Result<BTreeMap<String, AgentStatus>> {
        let raw = self.store.hgetall(&self.keys.agents()).await?;
        Ok(raw
            .into_iter()
            .map(|(agent, status)| (agent, AgentStatus::parse(&status)))
            .collect())
    }

    pub async fn agents(&self) -> Result<Vec<String>> {
        self.store.hkeys(&self.keys.agents()).await
    }

    pub async fn cache_profile(&self, profile: &AgentProfile, ttl: Duration) -> Result<()> {
        self.hot
            .set_json(&Keys::agent_profile(&profile.agent), profile, Some(ttl))
            .await
    }

    pub async fn profile(&self, agent: &str) -> Result<Option<AgentProfile>> {
        self.hot.get_json(&Keys::agent_profile(agent)).await
    }
}
