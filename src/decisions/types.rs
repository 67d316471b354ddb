use super::gate::{Gate, GateOutcome};
use serde::{Deserialize, Serialize};

/// A decision as handed in by a caller, before it is stamped.
///
/// Gate fields are optional and never computed here; run
/// [`classify`](super::classify) and attach the outcome with
/// [`DecisionDraft::with_gate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionDraft {
    pub task: String,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_sd: Option<f64>,
    /// Caller-defined fields (ids, affected agents, ...) carried verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DecisionDraft {
    pub fn new(task: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            rationale: rationale.into(),
            gate: None,
            gate_sd: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_gate(mut self, outcome: GateOutcome) -> Self {
        self.gate = Some(outcome.gate);
        self.gate_sd = Some(outcome.stddev);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

/// An immutable entry of the decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub task: String,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_sd: Option<f64>,
    #[serde(default)]
    pub ice_caked: bool,
    pub timestamp: String,
    pub session_id: String,
    pub agent: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Decision {
    pub(crate) fn stamp(
        draft: DecisionDraft,
        timestamp: String,
        session_id: String,
        agent: String,
    ) -> Self {
        Self {
            task: draft.task,
            rationale: draft.rationale,
            gate: draft.gate,
            gate_sd: draft.gate_sd,
            ice_caked: true,
            timestamp,
            session_id,
            agent,
            extra: draft.extra,
        }
    }
}
