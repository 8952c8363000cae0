use super::order::{Item, Order, OrderId};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Message group used when the caller supplies no grouping hint.
pub const DEFAULT_ORDERING_GROUP: &str = "orders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Identifier-only payload carried by delete envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderRef {
    #[serde(rename = "orderid")]
    pub order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    // Ref must come first: a bare `{"orderid": n}` would otherwise decode as a
    // defaulted order.
    Ref(OrderRef),
    Order(Order),
}

impl Payload {
    /// The full order, if this payload carries one.
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Order(order) => Some(order),
            Self::Ref(_) => None,
        }
    }

    /// The order to write, with every absent field defaulted.
    pub fn into_order(self) -> Order {
        match self {
            Self::Order(order) => order,
            Self::Ref(OrderRef { order_id }) => Order {
                order_id,
                product: String::new(),
                quantity: Default::default(),
                customer_name: String::new(),
                shipping_address: String::new(),
            },
        }
    }
}

/// The immutable unit placed on the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationEnvelope {
    pub operation: Operation,
    pub order_ref: OrderId,
    pub payload: Payload,
    pub ordering_key: String,
    pub dedup_token: String,
}

impl MutationEnvelope {
    pub fn create(
        order: Order,
        ordering: &OrderingStrategy,
        dedup: DedupStrategy,
        hint: Option<&str>,
    ) -> Result<Self> {
        let id = order.order_id;
        let payload = Payload::Order(order);
        Self::build(Operation::Create, id, payload, None, ordering, dedup, hint)
    }

    /// `current` is the stored record the update was checked against.
    pub fn update(
        order: Order,
        current: Option<&Item>,
        ordering: &OrderingStrategy,
        dedup: DedupStrategy,
        hint: Option<&str>,
    ) -> Result<Self> {
        let id = order.order_id;
        let payload = Payload::Order(order);
        Self::build(Operation::Update, id, payload, current, ordering, dedup, hint)
    }

    pub fn delete(
        order_id: OrderId,
        current: Option<&Item>,
        ordering: &OrderingStrategy,
        dedup: DedupStrategy,
        hint: Option<&str>,
    ) -> Result<Self> {
        let payload = Payload::Ref(OrderRef { order_id });
        Self::build(Operation::Delete, order_id, payload, current, ordering, dedup, hint)
    }

    fn build(
        operation: Operation,
        order_ref: OrderId,
        payload: Payload,
        current: Option<&Item>,
        ordering: &OrderingStrategy,
        dedup: DedupStrategy,
        hint: Option<&str>,
    ) -> Result<Self> {
        let dedup_token = dedup.token(operation, order_ref, &payload, current)?;
        Ok(Self {
            operation,
            order_ref,
            payload,
            ordering_key: ordering.ordering_key(order_ref, hint),
            dedup_token,
        })
    }

    pub fn to_body(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_body(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// How envelopes are partitioned into ordering groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingStrategy {
    /// One group for everything unless the caller names one: total order,
    /// sequential delivery.
    Global { default_group: String },
    /// One group per record: per-record order, parallel across records.
    /// Caller hints are ignored so a record never spans groups.
    PerRecord,
}

impl Default for OrderingStrategy {
    fn default() -> Self {
        Self::Global {
            default_group: DEFAULT_ORDERING_GROUP.to_string(),
        }
    }
}

impl OrderingStrategy {
    pub fn ordering_key(&self, order_id: OrderId, hint: Option<&str>) -> String {
        match self {
            Self::Global { default_group } => hint
                .filter(|h| !h.is_empty())
                .unwrap_or(default_group)
                .to_string(),
            Self::PerRecord => format!("order-{order_id}"),
        }
    }
}

/// How the queue deduplication token is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupStrategy {
    /// Fresh random token per send; never suppresses a resubmission.
    #[default]
    PerCall,
    /// SHA-256 of the normalized content plus the record snapshot the request
    /// was checked against; identical resubmissions against the same state
    /// collapse, while a later return to an earlier value does not.
    Content,
}

impl DedupStrategy {
    pub fn token(
        &self,
        operation: Operation,
        order_ref: OrderId,
        payload: &Payload,
        current: Option<&Item>,
    ) -> Result<String> {
        match self {
            Self::PerCall => Ok(Uuid::new_v4().to_string()),
            Self::Content => {
                #[derive(Serialize)]
                #[serde(rename_all = "camelCase")]
                struct Canonical<'a> {
                    operation: Operation,
                    order_ref: OrderId,
                    payload: Payload,
                    current: Option<&'a Item>,
                }

                // Same scale rule as the stored item, so 2 and 2.0 hash alike.
                let payload = match payload {
                    Payload::Order(order) => Payload::Order(Order {
                        quantity: order.quantity.normalize(),
                        ..order.clone()
                    }),
                    Payload::Ref(order_ref) => Payload::Ref(*order_ref),
                };
                let bytes = serde_json::to_vec(&Canonical {
                    operation,
                    order_ref,
                    payload,
                    current,
                })?;
                Ok(format!("{:x}", Sha256::digest(&bytes)))
            }
        }
    }
}
