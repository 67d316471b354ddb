#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    clippy::too_many_arguments
)]

pub mod board;
pub mod broadcast;
pub mod config;
pub mod decisions;
pub mod error;
pub mod handover;
pub mod registry;
pub mod session;
pub mod store;
pub mod tasks;
pub mod util;

pub use board::Blackboard;
pub use broadcast::{
    Acknowledgement, AwaitOptions, BroadcastChannel, BroadcastEnvelope, BroadcastKind,
    BroadcastMessage, Priority, WatermarkStore,
};
pub use config::BoardConfig;
pub use decisions::{Decision, DecisionDraft, DecisionLog, Gate, GateOutcome, classify};
pub use error::{BoardError, Result};
pub use handover::{HandoverChannel, HandoverPacket, HandoverRequest, InboxEntry, InboxMessage};
pub use registry::{AgentProfile, AgentRegistry, AgentStatus};
pub use session::{SessionManager, SessionScope, SessionState, SessionStatus};
pub use store::{KvStore, MemoryStore, RestStore, Store};
pub use tasks::{PlanItem, TaskBoard, TaskRecord, TaskStatus, TaskSummary};
