#![allow(dead_code)]

use orderflow::application::coordinator::IngestionCoordinator;
use orderflow::application::worker::ConsumerWorker;
use orderflow::config::PipelineConfig;
use orderflow::domain::order::Order;
use orderflow::domain::ports::OrderStore;
use orderflow::infrastructure::fifo_queue::InMemoryFifoQueue;
use orderflow::infrastructure::in_memory::InMemoryOrderStore;
use rand::Rng;
use serde_json::{Value, json};
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use std::sync::Arc;

pub struct Pipeline {
    pub coordinator: IngestionCoordinator,
    pub worker: ConsumerWorker,
    pub store: InMemoryOrderStore,
    pub queue: InMemoryFifoQueue,
}

pub fn pipeline(config: PipelineConfig) -> Pipeline {
    let store = InMemoryOrderStore::new();
    let queue = InMemoryFifoQueue::new(config.queue.clone());
    Pipeline {
        coordinator: IngestionCoordinator::new(
            Arc::new(store.clone()),
            Arc::new(queue.clone()),
            config.ingestion,
        ),
        worker: ConsumerWorker::new(
            Arc::new(store.clone()),
            Arc::new(queue.clone()),
            config.worker,
        ),
        store,
        queue,
    }
}

/// Every stored record, decoded.
pub async fn stored_orders(store: &InMemoryOrderStore) -> Vec<Order> {
    store
        .all()
        .await
        .unwrap()
        .iter()
        .map(|item| Order::from_item(item).unwrap())
        .collect()
}

pub fn order(id: i64, product: &str, quantity: i64) -> Value {
    json!({
        "orderid": id,
        "product": product,
        "quantity": quantity,
        "customerName": "X",
        "shippingAddress": "Y"
    })
}

pub fn post(message: Value) -> Value {
    json!({ "httpMethod": "POST", "body": { "message": message } })
}

pub fn put(message: Value) -> Value {
    json!({ "httpMethod": "PUT", "body": { "message": message } })
}

pub fn get(id: i64) -> Value {
    json!({ "httpMethod": "GET", "queryStringParameters": { "orderid": id.to_string() } })
}

pub fn delete(id: i64) -> Value {
    json!({ "httpMethod": "DELETE", "queryStringParameters": { "orderid": id.to_string() } })
}

pub fn write_requests<W: Write>(mut sink: W, requests: &[Value]) -> Result<(), Error> {
    for request in requests {
        writeln!(sink, "{}", request)?;
    }
    sink.flush()
}

/// Writes `rows` create requests with distinct ids.
pub fn generate_requests(path: &Path, rows: usize) -> Result<(), Error> {
    let requests: Vec<Value> = (1..=rows as i64)
        .map(|id| post(order(id, "widget", 1)))
        .collect();
    write_requests(File::create(path)?, &requests)
}

/// Writes a random mix of creates, updates, deletes and reads over `ids`.
pub fn generate_random_requests(path: &Path, rows: usize, ids: i64) -> Result<(), Error> {
    let mut rng = rand::thread_rng();
    let requests: Vec<Value> = (0..rows)
        .map(|_| {
            let id = rng.gen_range(1..=ids);
            let quantity = rng.gen_range(1..100);
            match rng.gen_range(0..4) {
                0 => post(order(id, "widget", quantity)),
                1 => put(order(id, "widget", quantity)),
                2 => delete(id),
                _ => get(id),
            }
        })
        .collect();
    write_requests(File::create(path)?, &requests)
}
