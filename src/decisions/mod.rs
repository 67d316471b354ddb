pub mod gate;
pub mod types;

pub use gate::{BLOCK_THRESHOLD, FLOW_THRESHOLD, Gate, GateOutcome, TOP_K, classify};
pub use types::{Decision, DecisionDraft};

use crate::error::Result;
use crate::session::{SessionScope, SessionState};
use crate::store::{Command, Keys, Store, decode, encode};
use crate::util::{now_rfc3339, now_score};
use std::sync::Arc;

/// Append-only, time-ordered decision log ("ice cake") with a monotonic
/// layer counter.
#[derive(Debug, Clone)]
pub struct DecisionLog {
    store: Store,
    keys: Keys,
    scope: Arc<SessionScope>,
}

impl DecisionLog {
    pub fn new(store: Store, keys: Keys, scope: Arc<SessionScope>) -> Self {
        Self { store, keys, scope }
    }

    /// Stamp and append a decision, bump the layer counter, and mirror both
    /// into `state` when one is given.
    pub async fn record(
        &self,
        draft: DecisionDraft,
        state: Option<&mut SessionState>,
    ) -> Result<Decision> {
        let decision = Decision::stamp(
            draft,
            now_rfc3339(),
            self.scope.session_id.clone(),
            self.scope.agent_id.clone(),
        );

        let replies = self
            .store
            .batch(vec![
                Command::zadd(self.keys.decisions(), now_score(), encode(&decision)?),
                Command::incr(self.keys.layer_counter()),
            ])
            .await?;
        let layer = replies.last().and_then(crate::store::Reply::as_int);

        tracing::debug!(
            project = %self.scope.project,
            agent = %self.scope.agent_id,
            session_id = %self.scope.session_id,
            gate = ?decision.gate,
            layer,
            "decision ice-caked"
        );

        if let Some(state) = state {
            state.record_decision(decision.clone());
        }
        Ok(decision)
    }

    /// The `n` most recent decisions, newest first.
    pub async fn recent(&self, n: usize) -> Result<Vec<Decision>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let key = self.keys.decisions();
        let stop = i64::try_from(n).unwrap_or(i64::MAX) - 1;
        self.store
            .zrevrange(&key, 0, stop)
            .await?
            .iter()
            .map(|raw| decode(&key, raw))
            .collect()
    }

    /// Total decisions ever recorded.
    pub async fn count(&self) -> Result<u64> {
        let layers = self.store.get_int(&self.keys.layer_counter()).await?;
        Ok(u64::try_from(layers).unwrap_or_default())
    }

    /// Decisions currently held in the ordered collection.
    pub async fn cardinality(&self) -> Result<usize> {
        self.store.zcard(&self.keys.decisions()).await
    }
}
