use super::order::{Item, OrderId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Key-value persistence for orders, keyed by identifier.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, order_id: OrderId) -> Result<Option<Item>>;
    async fn put(&self, order_id: OrderId, item: Item) -> Result<()>;
    /// Writes only if the key is absent. Returns whether the write happened.
    async fn put_if_absent(&self, order_id: OrderId, item: Item) -> Result<bool>;
    /// Deleting an absent key is not an error.
    async fn delete(&self, order_id: OrderId) -> Result<()>;
    async fn all(&self) -> Result<Vec<Item>>;
}

pub type SharedOrderStore = Arc<dyn OrderStore>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptHandle(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message as submitted to the ordered, deduplicating queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: String,
    pub group_id: String,
    pub dedup_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: MessageId,
    /// The queue coalesced this send with an earlier one sharing its dedup id.
    pub duplicate: bool,
}

/// One delivery attempt of a queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: MessageId,
    pub receipt: ReceiptHandle,
    pub group_id: String,
    pub body: String,
    /// 1 on first delivery, incremented on every redelivery.
    pub receive_count: u32,
}

/// Producer side of the queue.
#[async_trait]
pub trait MutationQueue: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<SendReceipt>;
}

/// Consumer side of the queue.
#[async_trait]
pub trait MutationSource: Send + Sync {
    /// Returns up to `max_messages` deliveries, or none when nothing is ready.
    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>>;
    /// Removes a delivered message for good.
    async fn ack(&self, receipt: &ReceiptHandle) -> Result<()>;
    /// Hands a delivered message back for redelivery.
    async fn release(&self, receipt: &ReceiptHandle) -> Result<()>;
}

pub type SharedMutationQueue = Arc<dyn MutationQueue>;
pub type SharedMutationSource = Arc<dyn MutationSource>;
