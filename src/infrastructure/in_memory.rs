use crate::domain::order::{Item, OrderId};
use crate::domain::ports::OrderStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory order store.
///
/// Uses `Arc<RwLock<HashMap<OrderId, Item>>>` so clones share the same data.
/// Writes to one key serialize on the lock, giving last-write-wins.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    items: Arc<RwLock<HashMap<OrderId, Item>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_id: OrderId) -> Result<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(&order_id).cloned())
    }

    async fn put(&self, order_id: OrderId, item: Item) -> Result<()> {
        let mut items = self.items.write().await;
        items.insert(order_id, item);
        Ok(())
    }

    async fn put_if_absent(&self, order_id: OrderId, item: Item) -> Result<bool> {
        let mut items = self.items.write().await;
        if items.contains_key(&order_id) {
            return Ok(false);
        }
        items.insert(order_id, item);
        Ok(true)
    }

    async fn delete(&self, order_id: OrderId) -> Result<()> {
        let mut items = self.items.write().await;
        items.remove(&order_id);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Item>> {
        let items = self.items.read().await;
        Ok(items.values().cloned().collect())
    }
}
