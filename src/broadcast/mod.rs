pub mod channel;
pub mod types;
pub mod watermark;

pub use channel::{AwaitOptions, BroadcastChannel};
pub use types::{Acknowledgement, BroadcastEnvelope, BroadcastKind, BroadcastMessage, Priority};
pub use watermark::WatermarkStore;
