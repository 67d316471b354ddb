use super::types::{PlanItem, TaskRecord, TaskStatus, TaskSummary};
use crate::error::{Result, StateError};
use crate::session::SessionScope;
use crate::store::{Command, Keys, Store, decode, encode};
use crate::util::{now_rfc3339, prefixed_id};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Dispatched work: one record per task, a FIFO queue per agent, and a
/// board hash summarising every task of the project.
#[derive(Debug, Clone)]
pub struct TaskBoard {
    store: Store,
    keys: Keys,
    scope: Arc<SessionScope>,
}

impl TaskBoard {
    pub fn new(store: Store, keys: Keys, scope: Arc<SessionScope>) -> Self {
        Self { store, keys, scope }
    }

    fn new_record(&self, item: PlanItem) -> TaskRecord {
        TaskRecord {
            id: prefixed_id("task"),
            from_agent: self.scope.agent_id.clone(),
            agent: item.agent,
            task: item.task,
            description: item.description,
            context: item.context,
            priority: item.priority,
            status: TaskStatus::Dispatched,
            dispatched_at: now_rfc3339(),
            claimed_at: None,
            finished_at: None,
            result: None,
            error: None,
        }
    }

    fn write_commands(&self, record: &TaskRecord) -> Result<[Command; 2]> {
        Ok([
            Command::set(self.keys.task(&record.id), encode(record)?),
            Command::hset(
                self.keys.task_board(),
                record.id.clone(),
                encode(&record.summary())?,
            ),
        ])
    }

    /// Record, queue push and board entry go out as one batch.
    pub async fn dispatch_task(&self, item: PlanItem) -> Result<String> {
        let mut ids = self.dispatch_plan(vec![item]).await?;
        Ok(ids.pop().unwrap_or_default())
    }

    /// Dispatch every item of a plan in a single batch. Ids come back in
    /// plan order.
    pub async fn dispatch_plan(&self, items: Vec<PlanItem>) -> Result<Vec<String>> {
        let mut commands = Vec::with_capacity(items.len() * 3);
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let record = self.new_record(item);
            commands.extend(self.write_commands(&record)?);
            commands.push(Command::lpush(
                self.keys.task_queue(&record.agent),
                record.id.clone(),
            ));
            tracing::info!(
                project = %self.scope.project,
                from = %record.from_agent,
                to = %record.agent,
                task_id = %record.id,
                priority = %record.priority,
                "task dispatched"
            );
            ids.push(record.id);
        }
        if !commands.is_empty() {
            self.store.batch(commands).await?;
        }
        Ok(ids)
    }

    /// Take the oldest task from this agent's own queue and mark it claimed.
    ///
    /// Queued ids that are missing or already past `dispatched` are skipped
    /// with a warning.
    pub async fn claim_next(&self) -> Result<Option<TaskRecord>> {
        let queue = self.keys.task_queue(&self.scope.agent_id);
        while let Some(id) = self.store.rpop(&queue).await? {
            let Some(record) = self.get(&id).await? else {
                tracing::warn!(agent = %self.scope.agent_id, task_id = %id, "queued task has no record");
                continue;
            };
            if !record.status.can_become(TaskStatus::Claimed) {
                tracing::warn!(
                    agent = %self.scope.agent_id,
                    task_id = %id,
                    status = %record.status,
                    "dropped queued task that is no longer claimable"
                );
                continue;
            }
            return self
                .transition(record, TaskStatus::Claimed, |record, at| {
                    record.claimed_at = Some(at);
                })
                .await
                .inspect_err(|err| {
                    tracing::warn!(
                        agent = %self.scope.agent_id,
                        task_id = %id,
                        error = %err,
                        "claim failed after the task left the queue"
                    );
                })
                .map(Some);
        }
        Ok(None)
    }

    pub async fn complete(&self, task_id: &str, result: serde_json::Value) -> Result<TaskRecord> {
        let record = self.require(task_id).await?;
        self.transition(record, TaskStatus::Done, |record, at| {
            record.finished_at = Some(at);
            record.result = Some(result);
        })
        .await
    }

    pub async fn fail(&self, task_id: &str, error: impl Into<String>) -> Result<TaskRecord> {
        let error = error.into();
        let record = self.require(task_id).await?;
        self.transition(record, TaskStatus::Failed, |record, at| {
            record.finished_at = Some(at);
            record.error = Some(error);
        })
        .await
    }

    async fn require(&self, task_id: &str) -> Result<TaskRecord> {
        self.get(task_id)
            .await?
            .ok_or_else(|| StateError::TaskNotFound(task_id.to_string()).into())
    }

    async fn transition<F>(&self, mut record: TaskRecord, next: TaskStatus, stamp: F) -> Result<TaskRecord>
    where
        F: FnOnce(&mut TaskRecord, String),
    {
        if !record.status.can_become(next) {
            return Err(StateError::InvalidTaskTransition {
                task_id: record.id,
                from: record.status.to_string(),
                to: next.to_string(),
            }
            .into());
        }
        let from = record.status;
        record.status = next;
        stamp(&mut record, now_rfc3339());
        self.store.batch(self.write_commands(&record)?.into()).await?;

        tracing::info!(
            project = %self.scope.project,
            agent = %self.scope.agent_id,
            task_id = %record.id,
            from = %from,
            to = %next,
            "task transitioned"
        );
        Ok(record)
    }

    pub async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        self.store.get_json(&self.keys.task(task_id)).await
    }

    /// Every task of the project keyed by id.
    pub async fn board(&self) -> Result<BTreeMap<String, TaskSummary>> {
        let key = self.keys.task_board();
        self.store
            .hgetall(&key)
            .await?
            .into_iter()
            .map(|(id, raw)| decode(&key, &raw).map(|summary| (id, summary)))
            .collect()
    }

    /// Ids waiting in `agent`'s queue, oldest first. Nothing is removed.
    pub async fn queued(&self, agent: &str) -> Result<Vec<String>> {
        let mut ids = self.store.lrange(&self.keys.task_queue(agent), 0, -1).await?;
        ids.reverse();
        Ok(ids)
    }
}
