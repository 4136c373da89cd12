//! Reply deduplication.
//!
//! Every reply the bot sends for an inbound message is recorded as a
//! [`ReplyBinding`]. When the inbound message is edited the bound reply is
//! edited in place instead of a second reply being sent.

use crate::store::{Collection, StoreError};
use crate::telegram::{ChatApi, TextMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyBinding {
    pub chat_id: i64,
    pub inbound_id: i64,
    pub outbound_id: i64,
}

pub struct ReplyTracker {
    bindings: Collection<ReplyBinding>,
}

fn binding_key(chat_id: i64, inbound_id: i64) -> String {
    format!("{}:{}", chat_id, inbound_id)
}

impl ReplyTracker {
    pub fn new(bindings: Collection<ReplyBinding>) -> Self {
        Self { bindings }
    }

    pub async fn binding(&self, chat_id: i64, inbound_id: i64) -> Option<ReplyBinding> {
        self.bindings.get(&binding_key(chat_id, inbound_id)).await
    }

    pub async fn binding_count(&self) -> usize {
        self.bindings.len().await
    }

    async fn bind(&self, binding: ReplyBinding) -> Result<(), StoreError> {
        let key = binding_key(binding.chat_id, binding.inbound_id);
        self.bindings.upsert(key, binding).await?;
        Ok(())
    }

    /// Send `message` as the reply to `inbound_id`, or edit the earlier reply.
    ///
    /// Returns the outbound message id, or `None` when delivery failed. A
    /// failed edit (reply deleted, text unchanged) is logged and dropped.
    pub async fn deliver(
        &self,
        api: &dyn ChatApi,
        chat_id: i64,
        inbound_id: i64,
        message: &TextMessage,
    ) -> Option<i64> {
        if let Some(existing) = self.binding(chat_id, inbound_id).await {
            return match api.edit_text(chat_id, existing.outbound_id, message).await {
                Ok(()) => Some(existing.outbound_id),
                Err(e) => {
                    tracing::warn!(
                        "Could not edit reply {} in chat {}: {}",
                        existing.outbound_id,
                        chat_id,
                        e
                    );
                    None
                }
            };
        }

        let outbound_id = match api.send_text(chat_id, message).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Failed to send reply in chat {}: {}", chat_id, e);
                return None;
            }
        };

        let binding = ReplyBinding {
            chat_id,
            inbound_id,
            outbound_id,
        };
        if let Err(e) = self.bind(binding).await {
            tracing::error!("Failed to record reply binding: {}", e);
        }
        Some(outbound_id)
    }
}
