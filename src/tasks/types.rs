use crate::broadcast::Priority;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Dispatched,
    Claimed,
    Done,
    Failed,
}

impl TaskStatus {
    /// Board display order.
    pub const ALL: [Self; 4] = [Self::Dispatched, Self::Claimed, Self::Done, Self::Failed];

    /// `dispatched -> claimed -> {done | failed}`.
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Dispatched, Self::Claimed)
                | (Self::Claimed, Self::Done)
                | (Self::Claimed, Self::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// One unit of work in a plan, or the input to a single dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub agent: String,
    pub task: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl PlanItem {
    pub fn new(agent: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            task: task.into(),
            description: String::new(),
            priority: Priority::Normal,
            context: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub from_agent: String,
    pub agent: String,
    pub task: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub priority: Priority,
    pub status: TaskStatus,
    pub dispatched_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            agent: self.agent.clone(),
            task: self.task.clone(),
            status: self.status,
            priority: self.priority.clone(),
            dispatched_at: self.dispatched_at.clone(),
        }
    }
}

/// Board hash entry; enough to render the board without loading records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub agent: String,
    pub task: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub dispatched_at: String,
}
