#![allow(dead_code)]

use blackboard::config::StoreEndpoint;
use blackboard::{Blackboard, BoardConfig, Store};

pub const PROJECT: &str = "pumpkin";

pub fn config_for(agent: &str) -> BoardConfig {
    BoardConfig::new(
        StoreEndpoint::new("https://primary.invalid", "primary-token"),
        StoreEndpoint::new("https://hot.invalid", "hot-token"),
    )
    .with_project(PROJECT)
    .with_agent(agent)
}

/// A fresh session for `agent` over a shared in-memory primary store.
pub fn board(store: &Store, agent: &str) -> Blackboard {
    Blackboard::with_stores(&config_for(agent), store.clone(), Store::memory())
}
