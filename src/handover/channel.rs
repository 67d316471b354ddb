use super::types::{
    HandoverContext, HandoverPacket, HandoverRequest, InboxEntry, InboxMessage, InboxNotice,
    ReturnTo,
};
use crate::error::Result;
use crate::registry::{AgentRegistry, AgentStatus};
use crate::session::{SessionScope, SessionState};
use crate::store::{Command, Keys, Store, decode, encode};
use crate::util::{now_rfc3339, prefixed_id};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Per-agent FIFO inbox plus keyed request/response packets.
#[derive(Debug, Clone)]
pub struct HandoverChannel {
    store: Store,
    keys: Keys,
    scope: Arc<SessionScope>,
    registry: AgentRegistry,
}

impl HandoverChannel {
    pub fn new(store: Store, keys: Keys, scope: Arc<SessionScope>, registry: AgentRegistry) -> Self {
        Self {
            store,
            keys,
            scope,
            registry,
        }
    }

    /// Post a handover to `to_agent`.
    ///
    /// Without an explicit context the requester's state is snapshotted.
    /// Packet, inbox push and registry mark go out as one batch.
    pub async fn post(
        &self,
        to_agent: &str,
        request: HandoverRequest,
        context: Option<HandoverContext>,
        state: Option<&SessionState>,
    ) -> Result<String> {
        let id = prefixed_id("ho");
        let context = context
            .or_else(|| state.map(HandoverContext::from_state))
            .unwrap_or_default();

        let packet = HandoverPacket {
            id: id.clone(),
            from_agent: self.scope.agent_id.clone(),
            to_agent: to_agent.to_string(),
            session_id: self.scope.session_id.clone(),
            project: self.scope.project.clone(),
            timestamp: now_rfc3339(),
            context,
            request,
            return_to: ReturnTo {
                agent: self.scope.agent_id.clone(),
                callback_key: Keys::handover_result(&id),
            },
        };

        self.store
            .batch(vec![
                Command::set(self.keys.handover(&id), encode(&packet)?),
                Command::lpush(Keys::inbox(to_agent), id.clone()),
                self.registry
                    .status_command(to_agent, &AgentStatus::Spawning),
            ])
            .await?;

        tracing::info!(
            project = %self.scope.project,
            from = %self.scope.agent_id,
            to = to_agent,
            handover_id = %id,
            "handover posted"
        );
        Ok(id)
    }

    /// Pop the oldest item from this agent's inbox.
    ///
    /// Each item is delivered at most once. An id whose packet is gone, or a
    /// notice that does not decode, is dropped with a warning.
    pub async fn receive(&self) -> Result<Option<InboxMessage>> {
        let inbox = Keys::inbox(&self.scope.agent_id);
        let Some(raw) = self.store.rpop(&inbox).await? else {
            return Ok(None);
        };

        let entry = match InboxEntry::parse(&inbox, &raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    agent = %self.scope.agent_id,
                    raw = %raw,
                    error = %err,
                    "dropped undecodable inbox item"
                );
                return Ok(None);
            }
        };

        match entry {
            InboxEntry::Notice(notice) => Ok(Some(InboxMessage::Result(notice))),
            InboxEntry::Handover(id) => {
                let key = self.keys.handover(&id);
                match self.store.get_json::<HandoverPacket>(&key).await? {
                    Some(packet) => {
                        tracing::info!(
                            agent = %self.scope.agent_id,
                            handover_id = %id,
                            from = %packet.from_agent,
                            "handover received"
                        );
                        Ok(Some(InboxMessage::Handover(Box::new(packet))))
                    }
                    None => {
                        tracing::warn!(
                            agent = %self.scope.agent_id,
                            handover_id = %id,
                            "inbox referenced a missing handover packet"
                        );
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Non-destructive view of this agent's inbox, oldest first.
    ///
    /// Items that do not decode are skipped with a warning.
    pub async fn peek_inbox(&self) -> Result<Vec<InboxEntry>> {
        let inbox = Keys::inbox(&self.scope.agent_id);
        let raw = self.store.lrange(&inbox, 0, -1).await?;
        let entries = raw
            .iter()
            .rev()
            .filter_map(|item| match InboxEntry::parse(&inbox, item) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(
                        agent = %self.scope.agent_id,
                        raw = %item,
                        error = %err,
                        "skipping undecodable inbox item"
                    );
                    None
                }
            })
            .collect();
        Ok(entries)
    }

    /// Answer a handover: store the result, notify the requester, and mark
    /// this agent completed.
    pub async fn post_result<T: Serialize>(&self, packet: &HandoverPacket, result: &T) -> Result<()> {
        let notice = InboxNotice::Result {
            handover_id: packet.id.clone(),
            key: packet.return_to.callback_key.clone(),
        };

        self.store
            .batch(vec![
                Command::set(packet.return_to.callback_key.clone(), encode(result)?),
                Command::lpush(Keys::inbox(&packet.return_to.agent), encode(&notice)?),
                self.registry
                    .status_command(&self.scope.agent_id, &AgentStatus::Completed),
            ])
            .await?;

        tracing::info!(
            agent = %self.scope.agent_id,
            handover_id = %packet.id,
            to = %packet.return_to.agent,
            "handover result posted"
        );
        Ok(())
    }

    /// Non-destructive read of a handover's result, if posted yet.
    pub async fn check_result<T: DeserializeOwned>(&self, handover_id: &str) -> Result<Option<T>> {
        self.store.get_json(&Keys::handover_result(handover_id)).await
    }

    /// Result for a notice popped from the inbox.
    pub async fn resolve_notice<T: DeserializeOwned>(&self, notice: &InboxNotice) -> Result<Option<T>> {
        let InboxNotice::Result { key, .. } = notice;
        match self.store.get_string(key).await? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }
}
