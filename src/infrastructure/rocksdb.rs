use crate::domain::order::{Item, OrderId};
use crate::domain::ports::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding order items.
pub const CF_ORDERS: &str = "orders";

/// A persistent order store backed by RocksDB.
///
/// Items are stored as JSON under the big-endian bytes of the identifier.
/// Single puts and deletes are atomic in RocksDB; `put_if_absent` additionally
/// serializes on an in-process lock, so it is only conditional with respect
/// to writers sharing this handle.
///
/// `Clone` shares the underlying `Arc<DB>` and the lock.
#[derive(Clone)]
pub struct RocksDBOrderStore {
    db: Arc<DB>,
    conditional_writes: Arc<Mutex<()>>,
}

impl RocksDBOrderStore {
    /// Opens or creates a RocksDB instance at `path`, creating the
    /// "orders" column family if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders])?;

        Ok(Self {
            db: Arc::new(db),
            conditional_writes: Arc::default(),
        })
    }

    fn orders(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_ORDERS)
            .ok_or_else(|| OrderError::store("Orders column family not found"))
    }

    fn key(order_id: OrderId) -> [u8; 8] {
        order_id.to_be_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Item> {
        serde_json::from_slice(bytes)
            .map_err(|e| OrderError::store(format!("Deserialization error: {e}")))
    }
}

#[async_trait]
impl OrderStore for RocksDBOrderStore {
    async fn get(&self, order_id: OrderId) -> Result<Option<Item>> {
        let cf = self.orders()?;
        match self.db.get_pinned_cf(cf, Self::key(order_id))? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, order_id: OrderId, item: Item) -> Result<()> {
        let cf = self.orders()?;
        let value = serde_json::to_vec(&item)?;
        self.db.put_cf(cf, Self::key(order_id), value)?;
        Ok(())
    }

    async fn put_if_absent(&self, order_id: OrderId, item: Item) -> Result<bool> {
        let _guard = self.conditional_writes.lock().await;
        let cf = self.orders()?;
        if self.db.get_pinned_cf(cf, Self::key(order_id))?.is_some() {
            return Ok(false);
        }
        let value = serde_json::to_vec(&item)?;
        self.db.put_cf(cf, Self::key(order_id), value)?;
        Ok(true)
    }

    async fn delete(&self, order_id: OrderId) -> Result<()> {
        let cf = self.orders()?;
        self.db.delete_cf(cf, Self::key(order_id))?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Item>> {
        let cf = self.orders()?;
        let mut items = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = entry?;
            items.push(Self::decode(&value)?);
        }
        Ok(items)
    }
}
