use crate::board_harness::board;
use blackboard::session::PriorSession;
use blackboard::{DecisionDraft, SessionStatus, Store};

#[tokio::test]
async fn history_grows_to_five_then_rolls() {
    let store = Store::memory();

    for round in 0..8_usize {
        let session = board(&store, "architect");
        let mut state = session.session().hydrate().await.expect("hydrate");
        if round == 0 {
            assert_eq!(state.status, SessionStatus::Fresh);
            assert!(state.previous_sessions.is_empty());
        } else {
            assert_eq!(state.status, SessionStatus::Hydrated);
            assert_eq!(state.previous_sessions.len(), round.min(5));
        }
        state.summary = format!("round {round}");
        session.session().persist(&mut state).await.expect("persist");
    }
}

#[tokio::test]
async fn persisted_state_is_carried_into_next_session() {
    let store = Store::memory();

    let first = board(&store, "architect");
    let mut state = first.session().hydrate().await.expect("hydrate");
    first
        .decisions()
        .record(DecisionDraft::new("Use NBT", "shared format"), Some(&mut state))
        .await
        .expect("record");
    state.summary = "picked storage format".into();
    state.update_task("storage", "design", 0.5);
    state.log_files(["pumpkin-nbt/src/lib.rs"], ["pumpkin-store/src/lib.rs"]);
    first.session().persist(&mut state).await.expect("persist");

    let second = board(&store, "architect");
    let resumed = second.session().hydrate().await.expect("hydrate");
    assert_eq!(
        resumed.previous_sessions[0],
        PriorSession {
            session_id: state.session_id.clone(),
            summary: "picked storage format".into(),
            ice_cake_layers: 1,
        }
    );
    assert_ne!(resumed.session_id, state.session_id);
    assert_eq!(resumed.decisions.len(), 1);
    assert_eq!(resumed.files_touched.written, vec!["pumpkin-store/src/lib.rs"]);
    assert_eq!(resumed.current_task, state.current_task);

    let log = second.session().session_log(5).await.expect("log");
    assert_eq!(log[0].session_id, state.session_id);
    assert_eq!(log[0].decisions_count, 1);
}

#[tokio::test]
async fn session_log_is_capped() {
    let store = Store::memory();
    let mut config = crate::board_harness::config_for("architect");
    config.session.log_limit = 3;

    for _ in 0..5 {
        let session = blackboard::Blackboard::with_stores(&config, store.clone(), Store::memory());
        let mut state = session.session().hydrate().await.expect("hydrate");
        session.session().persist(&mut state).await.expect("persist");
    }

    let session = board(&store, "architect");
    assert_eq!(session.session().session_log(10).await.expect("log").len(), 3);
}

#[tokio::test]
async fn extra_fields_survive_round_trip() {
    let store = Store::memory();
    let first = board(&store, "architect");
    let mut state = first.session().hydrate().await.expect("hydrate");
    state
        .extra
        .insert("sprint".into(), serde_json::json!({"number": 4}));
    first.session().persist(&mut state).await.expect("persist");

    let second = board(&store, "architect");
    let resumed = second.session().hydrate().await.expect("hydrate");
    assert_eq!(resumed.extra["sprint"]["number"], 4);
}
