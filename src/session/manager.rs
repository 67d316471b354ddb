use super::scope::SessionScope;
use super::types::{SessionLogEntry, SessionState, SessionStatus, TRANSIENT_KEYS};
use crate::broadcast::{BroadcastChannel, WatermarkStore};
use crate::config::SessionConfig;
use crate::error::{Result, StateError};
use crate::handover::HandoverChannel;
use crate::store::{Command, Keys, Store, decode, encode};
use crate::util::now_rfc3339;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const HYDRATING: u8 = 1;
const HYDRATED: u8 = 2;

/// Hydrate/persist lifecycle for one session.
///
/// The state itself is owned by the caller; this type only loads it,
/// attaches pending work, and commits it back.
#[derive(Debug)]
pub struct SessionManager {
    store: Store,
    keys: Keys,
    scope: Arc<SessionScope>,
    config: SessionConfig,
    handover: HandoverChannel,
    broadcast: BroadcastChannel,
    watermarks: WatermarkStore,
    lifecycle: AtomicU8,
}

impl SessionManager {
    pub fn new(
        store: Store,
        keys: Keys,
        scope: Arc<SessionScope>,
        config: SessionConfig,
        handover: HandoverChannel,
        broadcast: BroadcastChannel,
        watermarks: WatermarkStore,
    ) -> Self {
        Self {
            store,
            keys,
            scope,
            config,
            handover,
            broadcast,
            watermarks,
            lifecycle: AtomicU8::new(IDLE),
        }
    }

    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    pub fn is_hydrated(&self) -> bool {
        self.lifecycle.load(Ordering::SeqCst) == HYDRATED
    }

    /// Load the project's state, or start a fresh one.
    ///
    /// An existing state is carried forward into this session: its identity
    /// goes to the front of `previous_sessions`. Pending inbox entries and
    /// broadcasts above the watermark are attached but not consumed.
    ///
    /// A failed hydrate leaves the manager unhydrated, so it may be retried.
    pub async fn hydrate(&self) -> Result<SessionState> {
        if self
            .lifecycle
            .compare_exchange(IDLE, HYDRATING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StateError::AlreadyHydrated {
                session_id: self.scope.session_id.clone(),
            }
            .into());
        }

        match self.load().await {
            Ok(state) => {
                self.lifecycle.store(HYDRATED, Ordering::SeqCst);
                Ok(state)
            }
            Err(err) => {
                self.lifecycle.store(IDLE, Ordering::SeqCst);
                tracing::warn!(
                    project = %self.scope.project,
                    agent = %self.scope.agent_id,
                    error = %err,
                    "hydrate failed"
                );
                Err(err)
            }
        }
    }

    async fn load(&self) -> Result<SessionState> {
        let mut state = match self.store.get_json::<SessionState>(&self.keys.state()).await? {
            None => SessionState::fresh(&self.scope),
            Some(mut state) => {
                let prior = state.as_prior();
                state.carry_forward(prior, self.config.history_limit);
                state.project.clone_from(&self.scope.project);
                state.session_id.clone_from(&self.scope.session_id);
                state.last_updated = now_rfc3339();
                state.status = SessionStatus::Hydrated;
                for key in TRANSIENT_KEYS {
                    state.extra.remove(key);
                }
                state
            }
        };

        let agent = self.scope.agent_id.as_str();
        let watermark = match self.watermarks.get(agent).await? {
            Some(mark) => mark,
            None if state.last_broadcast_seen > 0.0 => {
                self.watermarks
                    .advance(agent, state.last_broadcast_seen)
                    .await?
            }
            None => 0.0,
        };
        state.last_broadcast_seen = watermark;

        state.pending_handovers = self.handover.peek_inbox().await?;
        state.pending_broadcasts = self.broadcast.poll_since(agent, watermark).await?;

        tracing::info!(
            project = %self.scope.project,
            agent,
            session_id = %self.scope.session_id,
            status = %state.status,
            prior_sessions = state.previous_sessions.len(),
            pending_handovers = state.pending_handovers.len(),
            pending_broadcasts = state.pending_broadcasts.len(),
            "session hydrated"
        );
        Ok(state)
    }

    /// Commit the state in one batch: current record, latest-session
    /// pointer, immutable snapshot, and a capped log entry.
    pub async fn persist(&self, state: &mut SessionState) -> Result<()> {
        if !self.is_hydrated() {
            return Err(StateError::NotHydrated.into());
        }
        if state.session_id != self.scope.session_id {
            return Err(StateError::SessionMismatch {
                expected: self.scope.session_id.clone(),
                actual: state.session_id.clone(),
            }
            .into());
        }

        state.last_updated = now_rfc3339();
        state.status = SessionStatus::Persisted;

        let entry = SessionLogEntry {
            session_id: state.session_id.clone(),
            agent: self.scope.agent_id.clone(),
            timestamp: state.last_updated.clone(),
            summary: state.summary.clone(),
            decisions_count: state.decisions.len(),
            ice_cake_layers: state.ice_cake_layers,
        };
        let payload = encode(&*state)?;
        let keep = i64::try_from(self.config.log_limit).unwrap_or(i64::MAX);
        let log_key = self.keys.session_log();

        self.store
            .batch(vec![
                Command::set(self.keys.state(), payload.clone()),
                Command::set(self.keys.latest_session(), state.session_id.clone()),
                Command::set(Keys::session_snapshot(&state.session_id), payload),
                Command::lpush(log_key.clone(), encode(&entry)?),
                Command::ltrim(log_key, 0, keep - 1),
            ])
            .await?;

        tracing::info!(
            project = %self.scope.project,
            agent = %self.scope.agent_id,
            session_id = %state.session_id,
            decisions = entry.decisions_count,
            ice_cake_layers = entry.ice_cake_layers,
            "session persisted"
        );
        Ok(())
    }

    /// The last `n` session log entries, newest first.
    pub async fn session_log(&self, n: usize) -> Result<Vec<SessionLogEntry>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let key = self.keys.session_log();
        let stop = i64::try_from(n).unwrap_or(i64::MAX) - 1;
        self.store
            .lrange(&key, 0, stop)
            .await?
            .iter()
            .map(|raw| decode(&key, raw))
            .collect()
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.store
            .get_json(&Keys::session_snapshot(session_id))
            .await
    }

    pub async fn latest_session_id(&self) -> Result<Option<String>> {
        self.store.get_string(&self.keys.latest_session()).await
    }
}
