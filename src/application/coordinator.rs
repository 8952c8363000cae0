use super::oracle::ExistenceOracle;
use crate::config::IngestionConfig;
use crate::domain::envelope::MutationEnvelope;
use crate::domain::order::{FIELD_ORDER_ID, Item, OrderId};
use crate::domain::ports::{MessageId, OutboundMessage, SharedMutationQueue, SharedOrderStore};
use crate::domain::validation::validate_order;
use crate::error::{OrderError, Result, SchemaViolation};
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Acknowledgment that a mutation was enqueued, not that it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub message_id: MessageId,
    pub ordering_key: String,
    pub dedup_token: String,
    /// The queue coalesced this submission with an earlier identical one.
    pub duplicate: bool,
}

/// Front half of the pipeline: validates requests, runs the advisory
/// existence check and enqueues one envelope per accepted mutation.
///
/// Holds no mutable state of its own, so one instance may serve concurrent
/// requests.
pub struct IngestionCoordinator {
    oracle: ExistenceOracle,
    store: SharedOrderStore,
    queue: SharedMutationQueue,
    config: IngestionConfig,
}

impl IngestionCoordinator {
    pub fn new(
        store: SharedOrderStore,
        queue: SharedMutationQueue,
        config: IngestionConfig,
    ) -> Self {
        Self {
            oracle: ExistenceOracle::new(store.clone()),
            store,
            queue,
            config,
        }
    }

    /// Enqueues a create if no record with the payload's id exists yet.
    #[instrument(skip_all)]
    pub async fn create(&self, payload: &Value, group_hint: Option<&str>) -> Result<Accepted> {
        let order = validate_order(payload)?;

        if self.oracle.exists(order.order_id).await? {
            debug!(order_id = order.order_id, "Create rejected, record exists");
            return Err(OrderError::Conflict(order.order_id));
        }

        let envelope = MutationEnvelope::create(
            order,
            &self.config.ordering,
            self.config.dedup,
            group_hint,
        )?;
        self.enqueue(envelope).await
    }

    /// Direct store lookup; never goes through the queue.
    pub async fn read(&self, order_id: OrderId) -> Result<Option<Item>> {
        self.store.get(order_id).await
    }

    /// Enqueues a full overwrite of an existing record.
    #[instrument(skip(self, payload, group_hint))]
    pub async fn update(
        &self,
        order_id: OrderId,
        payload: &Value,
        group_hint: Option<&str>,
    ) -> Result<Accepted> {
        let order = validate_order(payload)?;
        if order.order_id != order_id {
            return Err(SchemaViolation::invalid(
                FIELD_ORDER_ID,
                "The identifier of an existing order cannot change",
            )
            .into());
        }

        let Some(current) = self.oracle.current(order_id).await? else {
            debug!(order_id, "Update rejected, record missing");
            return Err(OrderError::NotFound(order_id));
        };

        let envelope = MutationEnvelope::update(
            order,
            Some(&current),
            &self.config.ordering,
            self.config.dedup,
            group_hint,
        )?;
        self.enqueue(envelope).await
    }

    /// Enqueues removal of an existing record.
    #[instrument(skip(self, group_hint))]
    pub async fn delete(&self, order_id: OrderId, group_hint: Option<&str>) -> Result<Accepted> {
        let Some(current) = self.oracle.current(order_id).await? else {
            debug!(order_id, "Delete rejected, record missing");
            return Err(OrderError::NotFound(order_id));
        };

        let envelope = MutationEnvelope::delete(
            order_id,
            Some(&current),
            &self.config.ordering,
            self.config.dedup,
            group_hint,
        )?;
        self.enqueue(envelope).await
    }

    async fn enqueue(&self, envelope: MutationEnvelope) -> Result<Accepted> {
        let message = OutboundMessage {
            body: envelope.to_body()?,
            group_id: envelope.ordering_key.clone(),
            dedup_id: envelope.dedup_token.clone(),
        };
        let receipt = self.queue.send(message).await?;

        info!(
            order_id = envelope.order_ref,
            operation = envelope.operation.as_str(),
            ordering_key = %envelope.ordering_key,
            message_id = %receipt.message_id,
            duplicate = receipt.duplicate,
            "Mutation enqueued"
        );

        Ok(Accepted {
            message_id: receipt.message_id,
            ordering_key: envelope.ordering_key,
            dedup_token: envelope.dedup_token,
            duplicate: receipt.duplicate,
        })
    }
}
