pub mod channel;
pub mod types;

pub use channel::HandoverChannel;
pub use types::{
    CONTEXT_DECISIONS, HandoverContext, HandoverPacket, HandoverRequest, InboxEntry, InboxMessage,
    InboxNotice, ReturnTo,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AgentRegistry, AgentStatus};
    use crate::session::{SessionScope, SessionState};
    use crate::store::{Keys, Store};
    use std::sync::Arc;

    fn channel_for(store: &Store, agent: &str) -> HandoverChannel {
        let keys = Keys::new("demo");
        let scope = Arc::new(SessionScope::new("demo", agent));
        let registry = AgentRegistry::new(store.clone(), Store::memory(), keys.clone());
        HandoverChannel::new(store.clone(), keys, scope, registry)
    }

    fn registry_for(store: &Store) -> AgentRegistry {
        AgentRegistry::new(store.clone(), Store::memory(), Keys::new("demo"))
    }

    #[tokio::test]
    async fn handover_is_delivered_exactly_once() {
        let store = Store::memory();
        let architect = channel_for(&store, "architect");
        let entity = channel_for(&store, "entity");

        let id = architect
            .post("entity", HandoverRequest::new("Implement spawn event"), None, None)
            .await
            .unwrap();

        let Some(InboxMessage::Handover(packet)) = entity.receive().await.unwrap() else {
            panic!("expected a handover");
        };
        assert_eq!(packet.id, id);
        assert_eq!(packet.from_agent, "architect");
        assert_eq!(packet.request.task, "Implement spawn event");
        assert_eq!(packet.return_to.callback_key, format!("ada:a2a:result:{id}"));

        assert!(entity.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inbox_is_first_in_first_out() {
        let store = Store::memory();
        let architect = channel_for(&store, "architect");
        let core = channel_for(&store, "core");

        let first = architect
            .post("core", HandoverRequest::new("one"), None, None)
            .await
            .unwrap();
        let second = architect
            .post("core", HandoverRequest::new("two"), None, None)
            .await
            .unwrap();

        assert_eq!(
            core.peek_inbox().await.unwrap(),
            vec![
                InboxEntry::Handover(first.clone()),
                InboxEntry::Handover(second.clone())
            ]
        );

        let Some(InboxMessage::Handover(packet)) = core.receive().await.unwrap() else {
            panic!("expected a handover");
        };
        assert_eq!(packet.id, first);
        let Some(InboxMessage::Handover(packet)) = core.receive().await.unwrap() else {
            panic!("expected a handover");
        };
        assert_eq!(packet.id, second);
    }

    #[tokio::test]
    async fn peek_does_not_consume() {
        let store = Store::memory();
        let architect = channel_for(&store, "architect");
        let core = channel_for(&store, "core");
        architect
            .post("core", HandoverRequest::new("one"), None, None)
            .await
            .unwrap();

        assert_eq!(core.peek_inbox().await.unwrap().len(), 1);
        assert_eq!(core.peek_inbox().await.unwrap().len(), 1);
        assert!(core.receive().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn result_flows_back_to_requester() {
        let store = Store::memory();
        let architect = channel_for(&store, "architect");
        let entity = channel_for(&store, "entity");
        let registry = registry_for(&store);

        let id = architect
            .post("entity", HandoverRequest::new("task"), None, None)
            .await
            .unwrap();
        assert_eq!(
            registry.statuses().await.unwrap()["entity"],
            AgentStatus::Spawning
        );
        assert!(
            architect
                .check_result::<serde_json::Value>(&id)
                .await
                .unwrap()
                .is_none()
        );

        let Some(InboxMessage::Handover(packet)) = entity.receive().await.unwrap() else {
            panic!("expected a handover");
        };
        entity
            .post_result(&packet, &serde_json::json!({"status": "done"}))
            .await
            .unwrap();

        assert_eq!(
            registry.statuses().await.unwrap()["entity"],
            AgentStatus::Completed
        );

        let Some(InboxMessage::Result(notice)) = architect.receive().await.unwrap() else {
            panic!("expected a result notice");
        };
        assert_eq!(
            notice,
            InboxNotice::Result {
                handover_id: id.clone(),
                key: format!("ada:a2a:result:{id}"),
            }
        );
        let via_notice: serde_json::Value =
            architect.resolve_notice(&notice).await.unwrap().unwrap();
        let via_id: serde_json::Value = architect.check_result(&id).await.unwrap().unwrap();
        assert_eq!(via_notice, via_id);
        assert_eq!(via_id["status"], "done");
    }

    #[tokio::test]
    async fn context_defaults_to_requester_snapshot() {
        let store = Store::memory();
        let architect = channel_for(&store, "architect");
        let entity = channel_for(&store, "entity");

        let scope = SessionScope::new("demo", "architect");
        let mut state = SessionState::fresh(&scope);
        state.update_task("Plan sprint", "planning", 0.3);
        state.add_blocker("waiting on protocol");

        architect
            .post(
                "entity",
                HandoverRequest::new("task").with_constraint("no renames"),
                None,
                Some(&state),
            )
            .await
            .unwrap();

        let Some(InboxMessage::Handover(packet)) = entity.receive().await.unwrap() else {
            panic!("expected a handover");
        };
        assert_eq!(
            packet.context.current_task.as_ref().unwrap().description,
            "Plan sprint"
        );
        assert_eq!(packet.context.blockers, vec!["waiting on protocol"]);
        assert_eq!(packet.request.constraints, vec!["no renames"]);
    }

    #[tokio::test]
    async fn dangling_inbox_id_yields_none() {
        let store = Store::memory();
        let core = channel_for(&store, "core");
        store
            .command(crate::store::Command::lpush(Keys::inbox("core"), "ho_gone"))
            .await
            .unwrap();
        assert!(core.receive().await.unwrap().is_none());
        assert!(core.peek_inbox().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_notice_is_skipped_not_fatal() {
        let store = Store::memory();
        let architect = channel_for(&store, "architect");
        let core = channel_for(&store, "core");
        store
            .command(crate::store::Command::lpush(Keys::inbox("core"), r#"{"type":"ping"}"#))
            .await
            .unwrap();
        let id = architect
            .post("core", HandoverRequest::new("review"), None, None)
            .await
            .unwrap();

        let peeked = core.peek_inbox().await.unwrap();
        assert_eq!(peeked, vec![InboxEntry::Handover(id.clone())]);

        assert!(core.receive().await.unwrap().is_none());
        let Some(InboxMessage::Handover(packet)) = core.receive().await.unwrap() else {
            panic!("expected the queued handover");
        };
        assert_eq!(packet.id, id);
    }
}
