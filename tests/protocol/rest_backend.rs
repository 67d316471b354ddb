use crate::board_harness::config_for;
use blackboard::config::StoreEndpoint;
use blackboard::{Blackboard, HandoverRequest, SessionStatus};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_with(primary: &MockServer, hot: &MockServer) -> blackboard::BoardConfig {
    let mut config = config_for("architect");
    config.primary = StoreEndpoint::new(primary.uri(), "primary-token");
    config.hot = StoreEndpoint::new(hot.uri(), "hot-token");
    config
}

#[tokio::test]
async fn fresh_hydrate_over_rest_reads_only() {
    let primary = MockServer::start().await;
    let hot = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("authorization", "Bearer primary-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": null})))
        .expect(4)
        .mount(&primary)
        .await;

    let board = Blackboard::connect(&config_with(&primary, &hot)).expect("connect");
    let state = board.session().hydrate().await.expect("hydrate");
    assert_eq!(state.status, SessionStatus::Fresh);
    primary.verify().await;
}

#[tokio::test]
async fn handover_post_is_a_single_pipeline() {
    let primary = MockServer::start().await;
    let hot = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pipeline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"result": "OK"},
            {"result": 1},
            {"result": 1}
        ])))
        .expect(1)
        .mount(&primary)
        .await;

    let board = Blackboard::connect(&config_with(&primary, &hot)).expect("connect");
    let id = board
        .handover()
        .post("entity", HandoverRequest::new("spawn"), None, None)
        .await
        .expect("post");
    assert!(id.starts_with("ho_"));
    primary.verify().await;
}

#[tokio::test]
async fn server_errors_propagate_without_retry() {
    let primary = MockServer::start().await;
    let hot = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&primary)
        .await;

    let board = Blackboard::connect(&config_with(&primary, &hot)).expect("connect");
    let err = board.decisions().count().await.expect_err("503");
    assert!(err.to_string().contains("503"));
    primary.verify().await;
}
