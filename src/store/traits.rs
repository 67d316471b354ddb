use super::command::{Command, Reply};
use crate::error::TransportError;
use async_trait::async_trait;

/// Remote key-value backend.
///
/// A pipeline either submits all of its commands or fails as a whole. It
/// does not isolate them from concurrent readers.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Label used in errors and logs (`primary`, `hot`, `memory`).
    fn name(&self) -> &str;

    async fn execute(&self, command: Command) -> Result<Reply, TransportError>;

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Reply>, TransportError>;
}
