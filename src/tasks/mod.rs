pub mod board;
pub mod types;

pub use board::TaskBoard;
pub use types::{PlanItem, TaskRecord, TaskStatus, TaskSummary};
