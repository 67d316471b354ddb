use super::types::{Acknowledgement, BroadcastEnvelope, BroadcastMessage};
use super::watermark::WatermarkStore;
use crate::config::BroadcastConfig;
use crate::error::Result;
use crate::registry::AgentRegistry;
use crate::session::{SessionScope, SessionState};
use crate::store::{Command, Keys, ScoreBound, Store, decode, encode};
use crate::util::{now_rfc3339, now_score, prefixed_id};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Smallest step between two scores issued by one channel.
const SCORE_STEP: f64 = 1e-6;

/// How [`BroadcastChannel::await_work`] waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwaitOptions {
    pub poll_interval: Duration,
    /// `None` waits until work arrives or the token is cancelled.
    pub timeout: Option<Duration>,
}

impl AwaitOptions {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            timeout: None,
        }
    }

    pub fn from_config(config: &BroadcastConfig) -> Self {
        Self::new(Duration::from_secs(config.poll_interval_secs))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Per-agent bounded notification channels with watermark consumption and
/// acknowledgement collection.
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    store: Store,
    keys: Keys,
    scope: Arc<SessionScope>,
    registry: AgentRegistry,
    watermarks: WatermarkStore,
    retention: usize,
    last_score: Arc<Mutex<f64>>,
}

impl BroadcastChannel {
    pub fn new(
        store: Store,
        keys: Keys,
        scope: Arc<SessionScope>,
        registry: AgentRegistry,
        watermarks: WatermarkStore,
        retention: usize,
    ) -> Self {
        Self {
            store,
            keys,
            scope,
            registry,
            watermarks,
            retention,
            last_score: Arc::new(Mutex::new(0.0)),
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Wall-clock score, nudged forward so that one sender never reuses a
    /// score.
    fn next_score(&self) -> f64 {
        let mut last = self
            .last_score
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let score = now_score().max(*last + SCORE_STEP);
        *last = score;
        score
    }

    /// Deliver one envelope to every recipient and trim each channel to the
    /// newest `retention` entries. All writes go out as one batch.
    pub async fn send(&self, to_agents: &[String], message: BroadcastMessage) -> Result<String> {
        let envelope = BroadcastEnvelope {
            id: prefixed_id("bc"),
            from_agent: self.scope.agent_id.clone(),
            timestamp: now_rfc3339(),
            ts_score: self.next_score(),
            message,
        };
        let payload = encode(&envelope)?;
        let keep = i64::try_from(self.retention).unwrap_or(i64::MAX);

        let mut commands = Vec::with_capacity(to_agents.len() * 2);
        for agent in to_agents {
            let channel = self.keys.broadcast_channel(agent);
            commands.push(Command::zadd(channel.clone(), envelope.ts_score, payload.clone()));
            commands.push(Command::zremrange_by_rank(channel, 0, -(keep + 1)));
        }
        if !commands.is_empty() {
            self.store.batch(commands).await?;
        }

        tracing::info!(
            project = %self.scope.project,
            from = %self.scope.agent_id,
            broadcast_id = %envelope.id,
            kind = %envelope.message.kind,
            recipients = to_agents.len(),
            "broadcast sent"
        );
        Ok(envelope.id)
    }

    /// Send to every registered agent not listed in `exclude`. `None` when
    /// nobody is left.
    pub async fn send_all(
        &self,
        message: BroadcastMessage,
        exclude: &[String],
    ) -> Result<Option<String>> {
        let recipients: Vec<String> = self
            .registry
            .agents()
            .await?
            .into_iter()
            .filter(|agent| !exclude.contains(agent))
            .collect();
        if recipients.is_empty() {
            tracing::debug!(project = %self.scope.project, "broadcast skipped, no recipients");
            return Ok(None);
        }
        self.send(&recipients, message).await.map(Some)
    }

    /// Envelopes in `agent`'s channel strictly newer than `since` (all of
    /// them when `since` is zero), oldest first.
    pub async fn poll_since(&self, agent: &str, since: f64) -> Result<Vec<BroadcastEnvelope>> {
        let channel = self.keys.broadcast_channel(agent);
        self.store
            .zrange_by_score(&channel, ScoreBound::after(since), ScoreBound::PosInf)
            .await?
            .iter()
            .map(|raw| decode(&channel, raw))
            .collect()
    }

    /// Unconsumed envelopes for `agent`, read against its authoritative
    /// watermark. Does not advance anything.
    pub async fn pending_for(&self, agent: &str) -> Result<Vec<BroadcastEnvelope>> {
        let since = self.watermarks.get(agent).await?.unwrap_or(0.0);
        self.poll_since(agent, since).await
    }

    pub async fn pending(&self) -> Result<Vec<BroadcastEnvelope>> {
        self.pending_for(&self.scope.agent_id).await
    }

    /// Mark `envelopes` as consumed by this agent. Returns the new
    /// watermark and mirrors it into `state`.
    pub async fn consume(
        &self,
        envelopes: &[BroadcastEnvelope],
        state: Option<&mut SessionState>,
    ) -> Result<f64> {
        let agent = self.scope.agent_id.as_str();
        let mark = if envelopes.is_empty() {
            self.watermarks.get(agent).await?.unwrap_or(0.0)
        } else {
            let newest = envelopes
                .iter()
                .map(|envelope| envelope.ts_score)
                .fold(0.0, f64::max);
            self.watermarks.advance(agent, newest).await?
        };
        if let Some(state) = state {
            state.last_broadcast_seen = mark;
        }
        Ok(mark)
    }

    /// Wait for broadcasts addressed to this agent.
    ///
    /// Polls above the authoritative watermark every `poll_interval`. When
    /// something arrives the watermark is advanced past it and the batch is
    /// returned. Returns empty on timeout or when `cancel` fires.
    pub async fn await_work(
        &self,
        options: AwaitOptions,
        cancel: &CancellationToken,
        mut state: Option<&mut SessionState>,
    ) -> Result<Vec<BroadcastEnvelope>> {
        let deadline = options.timeout.map(|timeout| Instant::now() + timeout);
        let agent = self.scope.agent_id.as_str();

        loop {
            let since = self.watermarks.get(agent).await?.unwrap_or(0.0);
            let found = self.poll_since(agent, since).await?;
            if !found.is_empty() {
                self.consume(&found, state.as_deref_mut()).await?;
                tracing::info!(agent, count = found.len(), "broadcasts received");
                return Ok(found);
            }

            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::debug!(agent, "await_work timed out");
                        return Ok(Vec::new());
                    }
                    options.poll_interval.min(deadline - now)
                }
                None => options.poll_interval,
            };

            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!(agent, "await_work cancelled");
                    return Ok(Vec::new());
                }
                () = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Record (or overwrite) this agent's acknowledgement of a broadcast.
    pub async fn acknowledge(
        &self,
        broadcast_id: &str,
        response: Option<serde_json::Value>,
    ) -> Result<()> {
        let ack = Acknowledgement {
            broadcast_id: broadcast_id.to_string(),
            agent: self.scope.agent_id.clone(),
            timestamp: now_rfc3339(),
            response,
        };
        self.store
            .hset(
                &self.keys.broadcast_acks(broadcast_id),
                &self.scope.agent_id,
                &encode(&ack)?,
            )
            .await?;
        tracing::debug!(agent = %self.scope.agent_id, broadcast_id, "broadcast acknowledged");
        Ok(())
    }

    pub async fn acks_for(&self, broadcast_id: &str) -> Result<BTreeMap<String, Acknowledgement>> {
        let key = self.keys.broadcast_acks(broadcast_id);
        self.store
            .hgetall(&key)
            .await?
            .into_iter()
            .map(|(agent, raw)| decode(&key, &raw).map(|ack| (agent, ack)))
            .collect()
    }
}
