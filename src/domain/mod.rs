//! Domain layer: the order record, the queue envelope, validation rules and the
//! ports through which the application reaches the store and the queue.

pub mod envelope;
pub mod order;
pub mod ports;
pub mod validation;
