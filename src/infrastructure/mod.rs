//! Adapters implementing the domain ports.

pub mod fifo_queue;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
