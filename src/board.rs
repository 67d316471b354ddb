use crate::broadcast::{BroadcastChannel, WatermarkStore};
use crate::config::BoardConfig;
use crate::decisions::DecisionLog;
use crate::error::Result;
use crate::handover::HandoverChannel;
use crate::registry::AgentRegistry;
use crate::session::{SessionManager, SessionScope};
use crate::store::{Keys, RestStore, Store};
use crate::tasks::TaskBoard;
use std::sync::Arc;

/// Every protocol component for one agent session, wired to the same
/// stores and scope.
#[derive(Debug)]
pub struct Blackboard {
    scope: Arc<SessionScope>,
    session: SessionManager,
    decisions: DecisionLog,
    handover: HandoverChannel,
    broadcast: BroadcastChannel,
    tasks: TaskBoard,
    registry: AgentRegistry,
    watermarks: WatermarkStore,
}

impl Blackboard {
    /// Connect both REST stores named in `config`.
    pub fn connect(config: &BoardConfig) -> Result<Self> {
        config.validate()?;
        let primary = Store::new(Arc::new(RestStore::new(
            "primary",
            &config.primary,
            config.request_timeout_secs,
        )));
        let hot = Store::new(Arc::new(RestStore::new(
            "hot",
            &config.hot,
            config.request_timeout_secs,
        )));
        Ok(Self::with_stores(config, primary, hot))
    }

    /// Wire components over caller-supplied backends.
    pub fn with_stores(config: &BoardConfig, primary: Store, hot: Store) -> Self {
        let keys = Keys::new(config.project.clone());
        let scope = Arc::new(SessionScope::new(
            config.project.clone(),
            config.agent_id.clone(),
        ));

        let registry = AgentRegistry::new(primary.clone(), hot, keys.clone());
        let watermarks = WatermarkStore::new(primary.clone(), keys.clone());
        let handover = HandoverChannel::new(
            primary.clone(),
            keys.clone(),
            scope.clone(),
            registry.clone(),
        );
        let broadcast = BroadcastChannel::new(
            primary.clone(),
            keys.clone(),
            scope.clone(),
            registry.clone(),
            watermarks.clone(),
            config.broadcast.retention,
        );
        let decisions = DecisionLog::new(primary.clone(), keys.clone(), scope.clone());
        let tasks = TaskBoard::new(primary.clone(), keys.clone(), scope.clone());
        let session = SessionManager::new(
            primary,
            keys,
            scope.clone(),
            config.session.clone(),
            handover.clone(),
            broadcast.clone(),
            watermarks.clone(),
        );

        tracing::debug!(
            project = %scope.project,
            agent = %scope.agent_id,
            session_id = %scope.session_id,
            "blackboard ready"
        );

        Self {
            scope,
            session,
            decisions,
            handover,
            broadcast,
            tasks,
            registry,
            watermarks,
        }
    }

    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    pub fn handover(&self) -> &HandoverChannel {
        &self.handover
    }

    pub fn broadcast(&self) -> &BroadcastChannel {
        &self.broadcast
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn watermarks(&self) -> &WatermarkStore {
        &self.watermarks
    }
}
