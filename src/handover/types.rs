use crate::decisions::Decision;
use crate::error::Result;
use crate::session::{CurrentTask, FilesTouched, SessionState};
use crate::store::decode;
use serde::{Deserialize, Serialize};

/// Number of the requester's latest decisions copied into a handover.
pub const CONTEXT_DECISIONS: usize = 5;

/// Context travelling with a handover: a snapshot of the requester's state,
/// or whatever the caller supplies (kept in `extra`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandoverContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<CurrentTask>,
    #[serde(default)]
    pub decisions_made: Vec<Decision>,
    #[serde(default)]
    pub files_touched: FilesTouched,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl HandoverContext {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            current_task: state.current_task.clone(),
            decisions_made: state.recent_decisions(CONTEXT_DECISIONS).to_vec(),
            files_touched: state.files_touched.clone(),
            blockers: state.blockers.clone(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn custom(extra: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            extra,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoverRequest {
    pub task: String,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl HandoverRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            expected_output: String::new(),
            constraints: Vec::new(),
        }
    }

    pub fn expecting(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }
}

/// Where the result of a handover goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnTo {
    pub agent: String,
    pub callback_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoverPacket {
    pub id: String,
    pub from_agent: String,
    pub to_agent: String,
    pub session_id: String,
    pub project: String,
    pub timestamp: String,
    #[serde(default)]
    pub context: HandoverContext,
    pub request: HandoverRequest,
    pub return_to: ReturnTo,
}

/// Typed notice queued in an inbox next to plain handover ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboxNotice {
    Result { handover_id: String, key: String },
}

/// One raw inbox item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboxEntry {
    Notice(InboxNotice),
    Handover(String),
}

impl InboxEntry {
    /// Ids are stored bare; notices are JSON objects.
    pub fn parse(inbox_key: &str, raw: &str) -> Result<Self> {
        if raw.trim_start().starts_with('{') {
            decode::<InboxNotice>(inbox_key, raw).map(Self::Notice)
        } else {
            Ok(Self::Handover(raw.to_string()))
        }
    }
}

/// What [`receive`](super::HandoverChannel::receive) hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum InboxMessage {
    Handover(Box<HandoverPacket>),
    Result(InboxNotice),
}
