use crate::board_harness::board;
use blackboard::handover::HandoverContext;
use blackboard::{AgentStatus, HandoverRequest, InboxMessage, Store};

#[tokio::test]
async fn handover_round_trip_between_sessions() {
    let store = Store::memory();
    let architect = board(&store, "architect");
    let entity = board(&store, "entity");

    let mut extra = serde_json::Map::new();
    extra.insert("crate".into(), serde_json::json!("pumpkin-entity"));
    let id = architect
        .handover()
        .post(
            "entity",
            HandoverRequest::new("Implement EntitySpawnEvent")
                .expecting("PR link")
                .with_constraint("no public API changes"),
            Some(HandoverContext::custom(extra)),
            None,
        )
        .await
        .expect("post");

    // The recipient sees the handover at hydrate without consuming it.
    let state = entity.session().hydrate().await.expect("hydrate");
    assert_eq!(state.pending_handovers.len(), 1);

    let Some(InboxMessage::Handover(packet)) = entity.handover().receive().await.expect("receive")
    else {
        panic!("expected the posted handover");
    };
    assert_eq!(packet.id, id);
    assert_eq!(packet.project, "pumpkin");
    assert_eq!(packet.request.expected_output, "PR link");
    assert_eq!(packet.context.extra["crate"], "pumpkin-entity");
    assert!(entity.handover().receive().await.expect("receive").is_none());

    entity
        .handover()
        .post_result(&packet, &serde_json::json!({"pr": 42}))
        .await
        .expect("post result");

    let result: serde_json::Value = architect
        .handover()
        .check_result(&id)
        .await
        .expect("check")
        .expect("result present");
    assert_eq!(result["pr"], 42);

    let Some(InboxMessage::Result(notice)) = architect.handover().receive().await.expect("receive")
    else {
        panic!("expected a result notice");
    };
    let via_notice: Option<serde_json::Value> = architect
        .handover()
        .resolve_notice(&notice)
        .await
        .expect("resolve");
    assert_eq!(via_notice, Some(result));

    let statuses = architect.registry().statuses().await.expect("statuses");
    assert_eq!(statuses["entity"], AgentStatus::Completed);
}
