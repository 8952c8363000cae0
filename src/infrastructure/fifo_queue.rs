//! In-memory stand-in for the external ordered, deduplicating FIFO queue.
//!
//! Semantics follow the external service's contract:
//! - delivery is FIFO within a message group, and a group hands out nothing new
//!   while any of its messages is in flight;
//! - groups are independent of each other;
//! - a dedup id seen within the dedup window is coalesced into the first send;
//! - a released message is redelivered from the head of its group until its
//!   receive count reaches the limit, after which it is dead-lettered.

use crate::config::QueueConfig;
use crate::domain::ports::{
    Delivery, MessageId, MutationQueue, MutationSource, OutboundMessage, ReceiptHandle,
    SendReceipt,
};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// A message that exhausted its receive budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub message_id: MessageId,
    pub group_id: String,
    pub body: String,
    pub receive_count: u32,
}

struct QueuedMessage {
    message_id: MessageId,
    body: String,
    receive_count: u32,
    receipt: Option<ReceiptHandle>,
}

#[derive(Default)]
struct QueueState {
    groups: HashMap<String, VecDeque<QueuedMessage>>,
    /// Groups in first-seen order; `receive` scans them in this order.
    group_order: Vec<String>,
    seen_dedup_ids: HashMap<String, MessageId>,
    /// Dedup ids in send order, for expiring the window from the front.
    dedup_expiry: VecDeque<(Instant, String)>,
    receipts: HashMap<ReceiptHandle, String>,
    dead_letters: Vec<DeadLetter>,
}

impl QueueState {
    fn expire_dedup_ids(&mut self, now: Instant, window: Duration) {
        while let Some((seen, _)) = self.dedup_expiry.front() {
            if now.duration_since(*seen) < window {
                break;
            }
            if let Some((_, dedup_id)) = self.dedup_expiry.pop_front() {
                self.seen_dedup_ids.remove(&dedup_id);
            }
        }
    }

    fn drop_group_if_empty(&mut self, group_id: &str) {
        if self.groups.get(group_id).is_some_and(VecDeque::is_empty) {
            self.groups.remove(group_id);
            self.group_order.retain(|g| g != group_id);
        }
    }

    fn group_for(&mut self, receipt: &ReceiptHandle) -> Result<String> {
        self.receipts
            .remove(receipt)
            .ok_or_else(|| OrderError::Queue(format!("unknown receipt handle {receipt}")))
    }
}

/// Cloneable handle; clones share one queue.
#[derive(Clone)]
pub struct InMemoryFifoQueue {
    config: QueueConfig,
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryFifoQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
        }
    }

    /// Messages still owned by the queue, in flight or not.
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.groups.values().map(VecDeque::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.receipts.len()
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.lock().await.dead_letters.clone()
    }
}

impl Default for InMemoryFifoQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

#[async_trait]
impl MutationQueue for InMemoryFifoQueue {
    async fn send(&self, message: OutboundMessage) -> Result<SendReceipt> {
        if message.group_id.is_empty() {
            return Err(OrderError::Queue("message group id must not be empty".into()));
        }

        let now = Instant::now();
        let window = self.config.dedup_window;
        let mut state = self.state.lock().await;

        state.expire_dedup_ids(now, window);

        if let Some(message_id) = state.seen_dedup_ids.get(&message.dedup_id) {
            debug!(%message_id, dedup_id = %message.dedup_id, "Coalesced duplicate send");
            return Ok(SendReceipt {
                message_id: message_id.clone(),
                duplicate: true,
            });
        }

        let message_id = MessageId(Uuid::new_v4().to_string());
        state
            .seen_dedup_ids
            .insert(message.dedup_id.clone(), message_id.clone());
        state.dedup_expiry.push_back((now, message.dedup_id));

        if !state.groups.contains_key(&message.group_id) {
            state.group_order.push(message.group_id.clone());
        }
        state
            .groups
            .entry(message.group_id.clone())
            .or_default()
            .push_back(QueuedMessage {
                message_id: message_id.clone(),
                body: message.body,
                receive_count: 0,
                receipt: None,
            });

        debug!(%message_id, group_id = %message.group_id, "Enqueued message");
        Ok(SendReceipt {
            message_id,
            duplicate: false,
        })
    }
}

#[async_trait]
impl MutationSource for InMemoryFifoQueue {
    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>> {
        let mut state = self.state.lock().await;
        let QueueState {
            groups,
            group_order,
            receipts,
            ..
        } = &mut *state;

        let mut deliveries = Vec::new();
        for group_id in group_order.iter() {
            if deliveries.len() >= max_messages {
                break;
            }
            let Some(queue) = groups.get_mut(group_id) else {
                continue;
            };
            // Locked until every in-flight message of the group is resolved.
            if queue.iter().any(|m| m.receipt.is_some()) {
                continue;
            }

            for message in queue.iter_mut() {
                if deliveries.len() >= max_messages {
                    break;
                }
                let receipt = ReceiptHandle(Uuid::new_v4().to_string());
                message.receive_count += 1;
                message.receipt = Some(receipt.clone());
                receipts.insert(receipt.clone(), group_id.clone());

                deliveries.push(Delivery {
                    message_id: message.message_id.clone(),
                    receipt,
                    group_id: group_id.clone(),
                    body: message.body.clone(),
                    receive_count: message.receive_count,
                });
            }
        }

        Ok(deliveries)
    }

    async fn ack(&self, receipt: &ReceiptHandle) -> Result<()> {
        let mut state = self.state.lock().await;
        let group_id = state.group_for(receipt)?;

        if let Some(queue) = state.groups.get_mut(&group_id) {
            queue.retain(|m| m.receipt.as_ref() != Some(receipt));
        }
        state.drop_group_if_empty(&group_id);
        Ok(())
    }

    async fn release(&self, receipt: &ReceiptHandle) -> Result<()> {
        let max_receive_count = self.config.max_receive_count;
        let mut state = self.state.lock().await;
        let group_id = state.group_for(receipt)?;

        let Some(queue) = state.groups.get_mut(&group_id) else {
            return Ok(());
        };
        let Some(position) = queue
            .iter()
            .position(|m| m.receipt.as_ref() == Some(receipt))
        else {
            return Ok(());
        };

        queue[position].receipt = None;
        let exhausted = max_receive_count > 0 && queue[position].receive_count >= max_receive_count;
        if exhausted && let Some(message) = queue.remove(position) {
            warn!(
                message_id = %message.message_id,
                %group_id,
                receive_count = message.receive_count,
                "Message exhausted its receive budget; moved to dead letters"
            );
            state.dead_letters.push(DeadLetter {
                message_id: message.message_id,
                group_id: group_id.clone(),
                body: message.body,
                receive_count: message.receive_count,
            });
            state.drop_group_if_empty(&group_id);
        }
        Ok(())
    }
}
