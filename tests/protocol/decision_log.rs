use crate::board_harness::board;
use blackboard::{DecisionDraft, Gate, Store, classify};

#[test]
fn gate_boundaries() {
    let consensus = classify(&[0.9, 0.9, 0.9]);
    assert_eq!(consensus.gate, Gate::Flow);
    assert!(consensus.stddev.abs() < 1e-9);

    let split = classify(&[0.9, 0.1, 0.5]);
    assert!(split.stddev > 0.15);
    assert!((split.stddev - 0.3266).abs() < 1e-3);
    assert_eq!(split.gate, Gate::Hold);

    assert_eq!(classify(&[1.0, 0.0]).gate, Gate::Block);
    assert_eq!(classify(&[]).gate, Gate::Hold);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn layer_counter_matches_records_across_writers() {
    let store = Store::memory();
    let mut handles = Vec::new();
    for writer in 0..4 {
        let log = board(&store, &format!("agent{writer}")).decisions().clone();
        handles.push(tokio::spawn(async move {
            for n in 0..10 {
                log.record(DecisionDraft::new(format!("w{writer} d{n}"), "load"), None)
                    .await
                    .expect("record");
            }
        }));
    }
    for handle in handles {
        handle.await.expect("writer task");
    }

    let log = board(&store, "reader");
    assert_eq!(log.decisions().count().await.expect("count"), 40);
}

#[tokio::test]
async fn recent_returns_newest_first_with_gate() {
    let store = Store::memory();
    let session = board(&store, "architect");
    let outcome = classify(&[0.8, 0.2, 0.1]);
    session
        .decisions()
        .record(DecisionDraft::new("older", "r"), None)
        .await
        .expect("record");
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    session
        .decisions()
        .record(DecisionDraft::new("newer", "r").with_gate(outcome), None)
        .await
        .expect("record");

    let recent = session.decisions().recent(1).await.expect("recent");
    assert_eq!(recent[0].task, "newer");
    assert_eq!(recent[0].gate, Some(outcome.gate));
    assert_eq!(recent[0].agent, "architect");
}
