pub mod command;
pub mod keys;
pub mod memory;
pub mod rest;
pub mod traits;

pub use command::{Command, Reply, ScoreBound};
pub use keys::Keys;
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use traits::KvStore;

use crate::error::{Result, SerializationError, TransportError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Cheaply cloneable handle with typed helpers over a [`KvStore`].
///
/// Payloads are validated here: anything read back that does not decode
/// into the expected structure is a [`SerializationError`].
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KvStore>,
}

impl Store {
    pub fn new(backend: Arc<dyn KvStore>) -> Self {
        Self { backend }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub async fn command(&self, command: Command) -> Result<Reply> {
        Ok(self.backend.execute(command).await?)
    }

    /// Submit all commands together; fails as a whole.
    pub async fn batch(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        Ok(self.backend.pipeline(commands).await?)
    }

    pub async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.command(Command::get(key)).await?.into_opt_string())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_string(key).await? {
            Some(raw) if !raw.is_empty() => decode(key, &raw).map(Some),
            _ => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let payload = encode(value)?;
        let command = match ttl {
            Some(ttl) => Command::set_ex(key, payload, ttl),
            None => Command::set(key, payload),
        };
        self.command(command).await?;
        Ok(())
    }

    /// Integer value at `key`, zero when absent.
    pub async fn get_int(&self, key: &str) -> Result<i64> {
        match self.get_string(key).await? {
            None => Ok(0),
            Some(raw) => raw.parse().map_err(|_| {
                SerializationError::InvalidNumber {
                    key: key.to_string(),
                    value: raw,
                }
                .into()
            }),
        }
    }

    pub async fn rpop(&self, key: &str) -> Result<Option<String>> {
        Ok(self.command(Command::rpop(key)).await?.into_opt_string())
    }

    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let command = Command::lrange(key, start, stop);
        let reply = self.command(command.clone()).await?;
        expect_strings(&command, reply)
    }

    pub async fn zrange_by_score(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
    ) -> Result<Vec<String>> {
        let command = Command::zrange_by_score(key, min, max);
        let reply = self.command(command.clone()).await?;
        expect_strings(&command, reply)
    }

    pub async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let command = Command::zrevrange(key, start, stop);
        let reply = self.command(command.clone()).await?;
        expect_strings(&command, reply)
    }

    pub async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        match self.command(Command::zscore(key, member)).await?.into_opt_string() {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                SerializationError::InvalidNumber {
                    key: format!("{key}#{member}"),
                    value: raw,
                }
                .into()
            }),
        }
    }

    pub async fn zcard(&self, key: &str) -> Result<usize> {
        let command = Command::zcard(key);
        let reply = self.command(command.clone()).await?;
        reply
            .as_int()
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| unexpected(&command, &reply))
    }

    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.command(Command::hset(key, field, value)).await?;
        Ok(())
    }

    pub async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let command = Command::hgetall(key);
        let reply = self.command(command.clone()).await?;
        let flat = expect_strings(&command, reply)?;
        let mut pairs = flat.into_iter();
        let mut map = BTreeMap::new();
        while let (Some(field), Some(value)) = (pairs.next(), pairs.next()) {
            map.insert(field, value);
        }
        Ok(map)
    }

    pub async fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        let command = Command::hkeys(key);
        let reply = self.command(command.clone()).await?;
        expect_strings(&command, reply)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("backend", &self.name()).finish()
    }
}

pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|error| SerializationError::Encode(error).into())
}

pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| {
        SerializationError::Decode {
            key: key.to_string(),
            source,
        }
        .into()
    })
}

fn expect_strings(command: &Command, reply: Reply) -> Result<Vec<String>> {
    let rendered = reply.to_string();
    reply.into_strings().ok_or_else(|| {
        TransportError::UnexpectedReply {
            command: command.to_string(),
            reply: rendered,
        }
        .into()
    })
}

fn unexpected(command: &Command, reply: &Reply) -> crate::error::BoardError {
    TransportError::UnexpectedReply {
        command: command.to_string(),
        reply: reply.to_string(),
    }
    .into()
}
