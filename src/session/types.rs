use super::scope::SessionScope;
use crate::broadcast::BroadcastEnvelope;
use crate::decisions::Decision;
use crate::handover::InboxEntry;
use crate::util::now_rfc3339;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SessionStatus {
    #[default]
    Fresh,
    Hydrated,
    Persisted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTask {
    pub description: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub progress: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesTouched {
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub written: Vec<String>,
}

/// Compact record of an earlier session carried in the history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorSession {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub ice_cake_layers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub active: Vec<String>,
    #[serde(default)]
    pub parked: Vec<String>,
}

/// The one mutable record per project.
///
/// Owned by the running session between hydrate and persist. Fields the
/// protocol does not know about are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub current_task: Option<CurrentTask>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub files_touched: FilesTouched,
    #[serde(default)]
    pub previous_sessions: Vec<PriorSession>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub ice_cake_layers: u64,
    /// Mirror of the agent's authoritative broadcast watermark.
    #[serde(default)]
    pub last_broadcast_seen: f64,
    #[serde(default)]
    pub team: Team,

    /// Inbox entries seen at hydrate; not consumed and not persisted.
    #[serde(skip)]
    pub pending_handovers: Vec<InboxEntry>,
    /// Broadcasts above the watermark; not persisted.
    #[serde(skip)]
    pub pending_broadcasts: Vec<BroadcastEnvelope>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionState {
    pub fn fresh(scope: &SessionScope) -> Self {
        Self {
            project: scope.project.clone(),
            session_id: scope.session_id.clone(),
            last_updated: now_rfc3339(),
            current_task: None,
            decisions: Vec::new(),
            blockers: Vec::new(),
            files_touched: FilesTouched::default(),
            previous_sessions: Vec::new(),
            summary: String::new(),
            status: SessionStatus::Fresh,
            ice_cake_layers: 0,
            last_broadcast_seen: 0.0,
            team: Team {
                active: vec![scope.agent_id.clone()],
                parked: Vec::new(),
            },
            pending_handovers: Vec::new(),
            pending_broadcasts: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Snapshot of this session for the next session's history.
    pub fn as_prior(&self) -> PriorSession {
        PriorSession {
            session_id: self.session_id.clone(),
            summary: self.summary.clone(),
            ice_cake_layers: self.ice_cake_layers,
        }
    }

    /// Push `prior` to the front of the history, keeping at most `limit`.
    pub(crate) fn carry_forward(&mut self, prior: PriorSession, limit: usize) {
        self.previous_sessions.insert(0, prior);
        self.previous_sessions.truncate(limit);
    }

    pub fn update_task(
        &mut self,
        description: impl Into<String>,
        phase: impl Into<String>,
        progress: f64,
    ) {
        self.current_task = Some(CurrentTask {
            description: description.into(),
            phase: phase.into(),
            progress: progress.clamp(0.0, 1.0),
        });
    }

    /// Merge into the touched-file sets; each set stays sorted and unique.
    pub fn log_files<R, W>(&mut self, read: R, written: W)
    where
        R: IntoIterator,
        R::Item: Into<String>,
        W: IntoIterator,
        W::Item: Into<String>,
    {
        merge_sorted(&mut self.files_touched.read, read);
        merge_sorted(&mut self.files_touched.written, written);
    }

    pub fn add_blocker(&mut self, blocker: impl Into<String>) {
        let blocker = blocker.into();
        if !self.blockers.contains(&blocker) {
            self.blockers.push(blocker);
        }
    }

    pub fn clear_blocker(&mut self, blocker: &str) -> bool {
        let before = self.blockers.len();
        self.blockers.retain(|existing| existing != blocker);
        self.blockers.len() != before
    }

    pub(crate) fn record_decision(&mut self, decision: Decision) {
        self.decisions.push(decision);
        self.ice_cake_layers += 1;
    }

    /// The last `n` decisions made, oldest first.
    pub fn recent_decisions(&self, n: usize) -> &[Decision] {
        let start = self.decisions.len().saturating_sub(n);
        &self.decisions[start..]
    }
}

fn merge_sorted<I>(target: &mut Vec<String>, incoming: I)
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut merged: BTreeSet<String> = target.drain(..).collect();
    merged.extend(incoming.into_iter().map(Into::into));
    target.extend(merged);
}

/// Keys older writers persisted alongside the state that are now transient.
pub(crate) const TRANSIENT_KEYS: [&str; 2] = ["pending_handovers", "pending_broadcasts"];

/// Compact entry appended to the project's session log at persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub session_id: String,
    pub agent: String,
    pub timestamp: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub decisions_count: usize,
    #[serde(default)]
    pub ice_cake_layers: u64,
}
