use crate::domain::order::{Item, OrderId};
use crate::domain::ports::SharedOrderStore;
use crate::error::Result;

/// Point-read existence check against the store.
///
/// The answer is a snapshot taken at read time, not a lock: the record may be
/// created or deleted before any mutation based on it is applied.
#[derive(Clone)]
pub struct ExistenceOracle {
    store: SharedOrderStore,
}

impl ExistenceOracle {
    pub fn new(store: SharedOrderStore) -> Self {
        Self { store }
    }

    pub async fn exists(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.current(order_id).await?.is_some())
    }

    /// The stored record as of this read, if any.
    pub async fn current(&self, order_id: OrderId) -> Result<Option<Item>> {
        self.store.get(order_id).await
    }
}
