use crate::domain::order::OrderId;
use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Which field check failed inside the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    WrongType,
    /// Present and well-typed, but not acceptable (e.g. id mismatch on update).
    Invalid,
}

/// The first schema check that failed for a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub field: &'static str,
    pub expected: &'static str,
    pub kind: ViolationKind,
}

impl SchemaViolation {
    pub fn missing(field: &'static str, expected: &'static str) -> Self {
        Self {
            field,
            expected,
            kind: ViolationKind::Missing,
        }
    }

    pub fn wrong_type(field: &'static str, expected: &'static str) -> Self {
        Self {
            field,
            expected,
            kind: ViolationKind::WrongType,
        }
    }

    pub fn invalid(field: &'static str, expected: &'static str) -> Self {
        Self {
            field,
            expected,
            kind: ViolationKind::Invalid,
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Missing => {
                write!(f, "Missing field '{}'. Expected {}.", self.field, self.expected)
            }
            ViolationKind::WrongType => write!(
                f,
                "Invalid data type for '{}'. Expected {}.",
                self.field, self.expected
            ),
            ViolationKind::Invalid => {
                write!(f, "Invalid value for '{}'. {}.", self.field, self.expected)
            }
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum OrderError {
    #[error("Schema error: {0}")]
    #[diagnostic(code(orderflow::schema))]
    Schema(SchemaViolation),

    #[error("Record with orderid '{0}' found in the database.")]
    #[diagnostic(code(orderflow::conflict))]
    Conflict(OrderId),

    #[error("Record with orderid '{0}' not found in the database.")]
    #[diagnostic(code(orderflow::not_found))]
    NotFound(OrderId),

    #[error("Bad request: {0}")]
    #[diagnostic(code(orderflow::bad_request))]
    BadRequest(String),

    #[error("Store error: {0}")]
    #[diagnostic(code(orderflow::store))]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Queue error: {0}")]
    #[diagnostic(code(orderflow::queue))]
    Queue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDB(#[from] rocksdb::Error),
}

impl From<SchemaViolation> for OrderError {
    fn from(violation: SchemaViolation) -> Self {
        Self::Schema(violation)
    }
}

impl OrderError {
    /// Client-input faults are reported synchronously and never retried.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::Schema(_) | Self::Conflict(_) | Self::NotFound(_) | Self::BadRequest(_)
        )
    }

    /// HTTP-equivalent status class for this error.
    pub fn status_code(&self) -> u16 {
        if self.is_client_fault() { 400 } else { 500 }
    }

    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Store(err.into())
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;
