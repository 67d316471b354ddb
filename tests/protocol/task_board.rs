use crate::board_harness::board;
use blackboard::{BoardError, PlanItem, Priority, Store, TaskStatus};
use blackboard::error::StateError;

#[tokio::test]
async fn plan_dispatch_and_lifecycle() {
    let store = Store::memory();
    let architect = board(&store, "architect");
    let plan: Vec<PlanItem> = serde_json::from_str(
        r#"[
            {"agent": "entity", "task": "Implement EntitySpawnEvent", "priority": "high"},
            {"agent": "redstone", "task": "Add piston head block state"},
            {"agent": "entity", "task": "Despawn rules"}
        ]"#,
    )
    .expect("plan json");
    let ids = architect.tasks().dispatch_plan(plan).await.expect("dispatch");
    assert_eq!(ids.len(), 3);

    let entity = board(&store, "entity");
    let first = entity.tasks().claim_next().await.expect("claim").expect("task");
    assert_eq!(first.task, "Implement EntitySpawnEvent");
    assert_eq!(first.priority, Priority::High);
    entity
        .tasks()
        .complete(&first.id, serde_json::json!({"ok": true}))
        .await
        .expect("complete");

    let second = entity.tasks().claim_next().await.expect("claim").expect("task");
    entity.tasks().fail(&second.id, "blocked on world gen").await.expect("fail");
    assert!(entity.tasks().claim_next().await.expect("claim").is_none());

    let board_view = architect.tasks().board().await.expect("board");
    assert_eq!(board_view[&ids[0]].status, TaskStatus::Done);
    assert_eq!(board_view[&ids[1]].status, TaskStatus::Dispatched);
    assert_eq!(board_view[&ids[2]].status, TaskStatus::Failed);

    let err = entity
        .tasks()
        .complete(&ids[2], serde_json::Value::Null)
        .await
        .expect_err("failed task cannot complete");
    assert!(matches!(
        err,
        BoardError::State(StateError::InvalidTaskTransition { .. })
    ));
}
