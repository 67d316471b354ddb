use crate::error::{Result, SerializationError};
use crate::store::{Command, Keys, Reply, Store};
use std::collections::BTreeMap;

/// Authoritative per-agent broadcast cursors.
///
/// One sorted set per project: member is the agent, score the newest
/// consumed broadcast timestamp. Advancing uses `ZADD GT` so the cursor
/// only moves forward, even with concurrent writers.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    store: Store,
    keys: Keys,
}

impl WatermarkStore {
    pub fn new(store: Store, keys: Keys) -> Self {
        Self { store, keys }
    }

    pub async fn get(&self, agent: &str) -> Result<Option<f64>> {
        self.store.zscore(&self.keys.watermarks(), agent).await
    }

    /// Watermarks for several agents in one batch; agents without one are
    /// absent from the result.
    pub async fn for_agents(&self, agents: &[String]) -> Result<BTreeMap<String, f64>> {
        if agents.is_empty() {
            return Ok(BTreeMap::new());
        }
        let key = self.keys.watermarks();
        let commands = agents
            .iter()
            .map(|agent| Command::zscore(key.clone(), agent.clone()))
            .collect();
        let replies = self.store.batch(commands).await?;

        let mut marks = BTreeMap::new();
        for (agent, reply) in agents.iter().zip(replies) {
            if let Some(score) = parse_score(&key, agent, reply)? {
                marks.insert(agent.clone(), score);
            }
        }
        Ok(marks)
    }

    /// Move `agent`'s watermark to `ts` unless it is already further ahead.
    /// Returns the watermark after the update.
    pub async fn advance(&self, agent: &str, ts: f64) -> Result<f64> {
        let key = self.keys.watermarks();
        let mut replies = self
            .store
            .batch(vec![
                Command::zadd_gt(key.clone(), ts, agent),
                Command::zscore(key.clone(), agent),
            ])
            .await?;
        let current = replies
            .pop()
            .map(|reply| parse_score(&key, agent, reply))
            .transpose()?
            .flatten()
            .unwrap_or(ts);
        tracing::debug!(project = self.keys.project(), agent, watermark = current, "watermark advanced");
        Ok(current)
    }
}

fn parse_score(key: &str, agent: &str, reply: Reply) -> Result<Option<f64>> {
    match reply.into_opt_string() {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            SerializationError::InvalidNumber {
                key: format!("{key}#{agent}"),
                value: raw,
            }
            .into()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watermarks() -> WatermarkStore {
        WatermarkStore::new(Store::memory(), Keys::new("demo"))
    }

    #[tokio::test]
    async fn watermark_never_moves_backwards() {
        let marks = watermarks();
        assert_eq!(marks.get("core").await.unwrap(), None);

        assert!((marks.advance("core", 10.0).await.unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((marks.advance("core", 5.0).await.unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((marks.advance("core", 12.5).await.unwrap() - 12.5).abs() < f64::EPSILON);
        assert_eq!(marks.get("core").await.unwrap(), Some(12.5));
    }

    #[tokio::test]
    async fn for_agents_skips_unknown() {
        let marks = watermarks();
        marks.advance("core", 3.0).await.unwrap();
        marks.advance("entity", 4.0).await.unwrap();

        let all = marks
            .for_agents(&["core".into(), "entity".into(), "storage".into()])
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!((all["entity"] - 4.0).abs() < f64::EPSILON);
        assert!(marks.for_agents(&[]).await.unwrap().is_empty());
    }
}
