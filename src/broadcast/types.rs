use serde::{Deserialize, Serialize};

/// Broadcast type. Free text on the wire; unrecognized values are carried
/// through as `Other` so one foreign envelope never poisons a channel.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "snake_case")]
pub enum BroadcastKind {
    Task,
    Decision,
    Unblock,
    StatusRequest,
    Notice,
    #[strum(default, to_string = "{0}")]
    Other(String),
}

impl From<String> for BroadcastKind {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Self::Other(value))
    }
}

impl From<BroadcastKind> for String {
    fn from(kind: BroadcastKind) -> Self {
        kind.to_string()
    }
}

/// Informational only; delivery order is by send time.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
    #[strum(default, to_string = "{0}")]
    Other(String),
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Self::Other(value))
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.to_string()
    }
}

/// Caller-supplied part of a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    #[serde(rename = "type")]
    pub kind: BroadcastKind,
    pub subject: String,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default)]
    pub priority: Priority,
}

impl BroadcastMessage {
    pub fn new(kind: BroadcastKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            body: serde_json::Value::Null,
            priority: Priority::Normal,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// One broadcast as stored in every recipient's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    pub id: String,
    pub from_agent: String,
    pub timestamp: String,
    pub ts_score: f64,
    #[serde(flatten)]
    pub message: BroadcastMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub broadcast_id: String,
    pub agent: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}
