pub mod manager;
pub mod scope;
pub mod types;

pub use manager::SessionManager;
pub use scope::SessionScope;
pub use types::{
    CurrentTask, FilesTouched, PriorSession, SessionLogEntry, SessionState, SessionStatus, Team,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{BroadcastChannel, BroadcastKind, BroadcastMessage, WatermarkStore};
    use crate::config::SessionConfig;
    use crate::error::{BoardError, StateError};
    use crate::handover::{HandoverChannel, HandoverRequest, InboxEntry};
    use crate::registry::AgentRegistry;
    use crate::store::{Command, Keys, Store};
    use std::sync::Arc;

    struct Parts {
        manager: SessionManager,
        handover: HandoverChannel,
        broadcast: BroadcastChannel,
        watermarks: WatermarkStore,
    }

    fn parts(store: &Store, agent: &str) -> Parts {
        let keys = Keys::new("demo");
        let scope = Arc::new(SessionScope::new("demo", agent));
        let registry = AgentRegistry::new(store.clone(), Store::memory(), keys.clone());
        let watermarks = WatermarkStore::new(store.clone(), keys.clone());
        let handover =
            HandoverChannel::new(store.clone(), keys.clone(), scope.clone(), registry.clone());
        let broadcast = BroadcastChannel::new(
            store.clone(),
            keys.clone(),
            scope.clone(),
            registry,
            watermarks.clone(),
            50,
        );
        let manager = SessionManager::new(
            store.clone(),
            keys,
            scope,
            SessionConfig::default(),
            handover.clone(),
            broadcast.clone(),
            watermarks.clone(),
        );
        Parts {
            manager,
            handover,
            broadcast,
            watermarks,
        }
    }

    #[tokio::test]
    async fn first_hydrate_is_fresh() {
        let store = Store::memory();
        let state = parts(&store, "architect").manager.hydrate().await.unwrap();
        assert_eq!(state.status, SessionStatus::Fresh);
        assert!(state.previous_sessions.is_empty());
        assert!(state.pending_handovers.is_empty());
        assert!(state.pending_broadcasts.is_empty());
    }

    #[tokio::test]
    async fn hydrate_twice_is_refused() {
        let store = Store::memory();
        let parts = parts(&store, "architect");
        parts.manager.hydrate().await.unwrap();
        let err = parts.manager.hydrate().await.unwrap_err();
        assert!(matches!(err, BoardError::State(StateError::AlreadyHydrated { .. })));
    }

    #[tokio::test]
    async fn persist_requires_hydrate_and_matching_session() {
        let store = Store::memory();
        let parts = parts(&store, "architect");
        let mut stray = SessionState::fresh(&SessionScope::new("demo", "architect"));

        let err = parts.manager.persist(&mut stray).await.unwrap_err();
        assert!(matches!(err, BoardError::State(StateError::NotHydrated)));

        parts.manager.hydrate().await.unwrap();
        let err = parts.manager.persist(&mut stray).await.unwrap_err();
        assert!(matches!(err, BoardError::State(StateError::SessionMismatch { .. })));
    }

    #[tokio::test]
    async fn failed_hydrate_can_be_retried_and_blocks_persist() {
        let store = Store::memory();
        store
            .command(Command::set(
                Keys::new("demo").state(),
                r#"{"session_id":"sess_old","summary":"important work","blockers":["keep me"]}"#,
            ))
            .await
            .unwrap();
        store
            .command(Command::set(Keys::inbox("core"), "not a list"))
            .await
            .unwrap();

        let parts = parts(&store, "core");
        let err = parts.manager.hydrate().await.unwrap_err();
        assert!(matches!(err, BoardError::Transport(_)));
        assert!(!parts.manager.is_hydrated());

        let mut blank = SessionState::fresh(parts.manager.scope());
        let err = parts.manager.persist(&mut blank).await.unwrap_err();
        assert!(matches!(err, BoardError::State(StateError::NotHydrated)));

        store.command(Command::del(Keys::inbox("core"))).await.unwrap();
        let state = parts.manager.hydrate().await.unwrap();
        assert!(parts.manager.is_hydrated());
        assert_eq!(state.blockers, vec!["keep me".to_string()]);
        assert_eq!(state.previous_sessions[0].summary, "important work");
    }

    #[tokio::test]
    async fn persist_writes_pointer_snapshot_and_log() {
        let store = Store::memory();
        let parts = parts(&store, "architect");
        let mut state = parts.manager.hydrate().await.unwrap();
        state.summary = "scaffolded storage".into();
        parts.manager.persist(&mut state).await.unwrap();
        assert_eq!(state.status, SessionStatus::Persisted);

        let sid = parts.manager.scope().session_id.clone();
        assert_eq!(parts.manager.latest_session_id().await.unwrap(), Some(sid.clone()));
        let snapshot = parts.manager.snapshot(&sid).await.unwrap().unwrap();
        assert_eq!(snapshot.summary, "scaffolded storage");
        let log = parts.manager.session_log(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].agent, "architect");
    }

    #[tokio::test]
    async fn hydrate_attaches_pending_without_consuming() {
        let store = Store::memory();
        let architect = parts(&store, "architect");
        architect
            .handover
            .post("core", HandoverRequest::new("review"), None, None)
            .await
            .unwrap();
        architect
            .broadcast
            .send(
                &["core".into()],
                BroadcastMessage::new(BroadcastKind::Unblock, "go ahead"),
            )
            .await
            .unwrap();

        let core = parts(&store, "core");
        let state = core.manager.hydrate().await.unwrap();
        assert_eq!(state.pending_handovers.len(), 1);
        assert!(matches!(state.pending_handovers[0], InboxEntry::Handover(_)));
        assert_eq!(state.pending_broadcasts.len(), 1);
        assert!(core.watermarks.get("core").await.unwrap().is_none());
        assert_eq!(core.handover.peek_inbox().await.unwrap().len(), 1);
        assert_eq!(core.broadcast.pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn hydrate_survives_malformed_inbox_item() {
        let store = Store::memory();
        store
            .command(Command::lpush(Keys::inbox("core"), r#"{"type":"result"}"#))
            .await
            .unwrap();
        parts(&store, "architect")
            .handover
            .post("core", HandoverRequest::new("review"), None, None)
            .await
            .unwrap();

        let state = parts(&store, "core").manager.hydrate().await.unwrap();
        assert_eq!(state.pending_handovers.len(), 1);
        assert!(matches!(state.pending_handovers[0], InboxEntry::Handover(_)));
    }

    #[tokio::test]
    async fn legacy_transient_keys_are_dropped() {
        let store = Store::memory();
        store
            .command(Command::set(
                Keys::new("demo").state(),
                r#"{"session_id":"sess_old","summary":"x","pending_handovers":["ho_1"],"last_broadcast_seen":7.5}"#,
            ))
            .await
            .unwrap();

        let parts = parts(&store, "core");
        let state = parts.manager.hydrate().await.unwrap();
        assert!(!state.extra.contains_key("pending_handovers"));
        assert_eq!(state.previous_sessions[0].session_id, "sess_old");
        assert_eq!(parts.watermarks.get("core").await.unwrap(), Some(7.5));
        assert!((state.last_broadcast_seen - 7.5).abs() < f64::EPSILON);
    }
}
