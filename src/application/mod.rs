//! Application layer: the two halves of the asynchronous mutation pipeline.
//!
//! The [`coordinator::IngestionCoordinator`] validates requests and enqueues
//! envelopes; the [`worker::ConsumerWorker`] drains the queue and applies them
//! to the store. They share nothing but the injected store and queue handles.

pub mod coordinator;
pub mod oracle;
pub mod worker;
