use crate::board_harness::board;
use blackboard::{AwaitOptions, BroadcastKind, BroadcastMessage, Priority, Store};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn task(subject: String) -> BroadcastMessage {
    BroadcastMessage::new(BroadcastKind::Task, subject)
}

#[tokio::test]
async fn sixty_broadcasts_leave_the_newest_fifty() {
    let store = Store::memory();
    let architect = board(&store, "architect");
    let recipients = vec!["redstone".to_string()];

    for n in 0..60 {
        architect
            .broadcast()
            .send(&recipients, task(format!("b{n:02}")))
            .await
            .expect("send");
    }

    let all = architect
        .broadcast()
        .poll_since("redstone", 0.0)
        .await
        .expect("poll");
    assert_eq!(all.len(), 50);
    assert_eq!(all[0].message.subject, "b10");
    assert_eq!(all[49].message.subject, "b59");
    assert!(all.windows(2).all(|pair| pair[0].ts_score < pair[1].ts_score));

    let cut = all[24].ts_score;
    let newer = architect
        .broadcast()
        .poll_since("redstone", cut)
        .await
        .expect("poll");
    assert_eq!(newer.len(), 25);
    assert!(newer.iter().all(|envelope| envelope.ts_score > cut));
}

#[tokio::test]
async fn hydrate_reports_pending_and_await_work_consumes() {
    let store = Store::memory();
    let architect = board(&store, "architect");
    architect
        .broadcast()
        .send(
            &["core".into()],
            task("wire the codec".into()).with_priority(Priority::High),
        )
        .await
        .expect("send");

    let core = board(&store, "core");
    let mut state = core.session().hydrate().await.expect("hydrate");
    assert_eq!(state.pending_broadcasts.len(), 1);

    let cancel = CancellationToken::new();
    let options = AwaitOptions::new(Duration::from_millis(10)).with_timeout(Duration::from_secs(1));
    let got = core
        .broadcast()
        .await_work(options, &cancel, Some(&mut state))
        .await
        .expect("await");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].message.priority, Priority::High);
    assert!((state.last_broadcast_seen - got[0].ts_score).abs() < f64::EPSILON);

    // A later session starts from the advanced watermark.
    core.session().persist(&mut state).await.expect("persist");
    let next = board(&store, "core");
    let resumed = next.session().hydrate().await.expect("hydrate");
    assert!(resumed.pending_broadcasts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn await_work_wakes_when_a_broadcast_lands() {
    let store = Store::memory();
    let core = board(&store, "core");
    let architect = board(&store, "architect");
    let sender = architect.broadcast().clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(90)).await;
        sender
            .send(&["core".into()], task("late".into()))
            .await
            .expect("send");
    });

    let cancel = CancellationToken::new();
    let got = core
        .broadcast()
        .await_work(AwaitOptions::new(Duration::from_secs(60)), &cancel, None)
        .await
        .expect("await");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].message.subject, "late");
}

#[tokio::test]
async fn acks_collect_per_agent() {
    let store = Store::memory();
    let architect = board(&store, "architect");
    let id = architect
        .broadcast()
        .send(
            &["core".into(), "storage".into()],
            BroadcastMessage::new(BroadcastKind::StatusRequest, "report in"),
        )
        .await
        .expect("send");

    board(&store, "core")
        .broadcast()
        .acknowledge(&id, Some(serde_json::json!({"progress": 0.4})))
        .await
        .expect("ack");
    board(&store, "storage")
        .broadcast()
        .acknowledge(&id, None)
        .await
        .expect("ack");

    let acks = architect.broadcast().acks_for(&id).await.expect("acks");
    assert_eq!(acks.keys().collect::<Vec<_>>(), vec!["core", "storage"]);
    assert!(architect.broadcast().acks_for("bc_none").await.expect("acks").is_empty());
}
