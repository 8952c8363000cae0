use crate::config::{CreatePolicy, WorkerConfig};
use crate::domain::envelope::{MutationEnvelope, Operation};
use crate::domain::ports::{Delivery, MessageId, SharedMutationSource, SharedOrderStore};
use crate::error::{OrderError, Result};
use std::collections::HashSet;
use std::fmt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Terminal result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Mutation applied; the delivery is acknowledged.
    Applied,
    /// Create refused by a conditional write; acknowledged since retrying
    /// cannot succeed.
    Discarded,
    /// Not applied; released for redelivery under the queue's policy.
    Failed,
}

/// Per-delivery state machine: `Received -> Applying -> Settled(_)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Received,
    Applying,
    Settled(Outcome),
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => f.write_str("received"),
            Self::Applying => f.write_str("applying"),
            Self::Settled(Outcome::Applied) => f.write_str("applied"),
            Self::Settled(Outcome::Discarded) => f.write_str("discarded"),
            Self::Settled(Outcome::Failed) => f.write_str("failed"),
        }
    }
}

/// Message ids by terminal outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub applied: Vec<MessageId>,
    pub discarded: Vec<MessageId>,
    pub failed: Vec<MessageId>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.applied.len() + self.discarded.len() + self.failed.len()
    }

    fn record(&mut self, message_id: MessageId, outcome: Outcome) {
        match outcome {
            Outcome::Applied => self.applied.push(message_id),
            Outcome::Discarded => self.discarded.push(message_id),
            Outcome::Failed => self.failed.push(message_id),
        }
    }

    fn merge(&mut self, other: BatchReport) {
        self.applied.extend(other.applied);
        self.discarded.extend(other.discarded);
        self.failed.extend(other.failed);
    }
}

/// Back half of the pipeline: drains deliveries and applies each envelope to
/// the store with a single store call.
///
/// Delivery is at-least-once, so every apply is idempotent: upserts rewrite
/// the same content and deletes of absent keys succeed. The worker never
/// re-enqueues; failed deliveries go back to the source.
pub struct ConsumerWorker {
    store: SharedOrderStore,
    source: SharedMutationSource,
    config: WorkerConfig,
}

impl ConsumerWorker {
    pub fn new(
        store: SharedOrderStore,
        source: SharedMutationSource,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            source,
            config,
        }
    }

    /// Applies one envelope to the store.
    pub async fn apply(&self, envelope: MutationEnvelope) -> Result<Outcome> {
        let order_id = envelope.order_ref;
        match envelope.operation {
            Operation::Create if self.config.create_policy == CreatePolicy::IfAbsent => {
                let item = envelope.payload.into_order().to_item();
                if self.store.put_if_absent(order_id, item.clone()).await? {
                    return Ok(Outcome::Applied);
                }
                // A redelivery of a create that already landed is still a success.
                match self.store.get(order_id).await? {
                    Some(existing) if existing == item => Ok(Outcome::Applied),
                    Some(_) => {
                        warn!(order_id, "Create conflicts with stored record; discarding");
                        Ok(Outcome::Discarded)
                    }
                    None => Err(OrderError::store("record removed during conditional create")),
                }
            }
            Operation::Create | Operation::Update => {
                let item = envelope.payload.into_order().to_item();
                self.store.put(order_id, item).await?;
                Ok(Outcome::Applied)
            }
            Operation::Delete => {
                self.store.delete(order_id).await?;
                Ok(Outcome::Applied)
            }
        }
    }

    /// Runs one delivery through the state machine and settles it with the
    /// source.
    pub async fn handle_delivery(&self, delivery: &Delivery) -> Outcome {
        let outcome = self.resolve(delivery).await;
        self.settle(delivery, outcome).await;
        debug!(message_id = %delivery.message_id, state = %DeliveryState::Settled(outcome));
        outcome
    }

    async fn resolve(&self, delivery: &Delivery) -> Outcome {
        let message_id = &delivery.message_id;
        debug!(
            %message_id,
            state = %DeliveryState::Received,
            receive_count = delivery.receive_count
        );

        match MutationEnvelope::from_body(&delivery.body) {
            Ok(envelope) => {
                debug!(
                    %message_id,
                    state = %DeliveryState::Applying,
                    order_id = envelope.order_ref,
                    operation = envelope.operation.as_str()
                );
                match self.apply(envelope).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(%message_id, error = %e, "Failed to apply mutation");
                        Outcome::Failed
                    }
                }
            }
            Err(e) => {
                error!(%message_id, error = %e, "Undecodable envelope");
                Outcome::Failed
            }
        }
    }

    /// Handles a batch in delivery order.
    ///
    /// Once a delivery of a group fails, later deliveries of that group are
    /// released unapplied so redelivery keeps the group's order.
    pub async fn process_batch(&self, deliveries: Vec<Delivery>) -> BatchReport {
        let mut held = Vec::new();
        let report = self
            .process_round(deliveries, &mut HashSet::new(), &mut held)
            .await;
        self.release_held(held).await;
        report
    }

    /// Receives and processes batches until the source has nothing ready.
    ///
    /// Failed deliveries stay in flight until the drain ends. That keeps their
    /// groups locked at the source, so later rounds only see groups that have
    /// not failed, and each failed message is attempted once per drain.
    pub async fn drain(&self) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut blocked_groups = HashSet::new();
        let mut held = Vec::new();

        loop {
            let batch = match self.source.receive(self.config.batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    self.release_held(held).await;
                    return Err(e);
                }
            };
            if batch.is_empty() {
                break;
            }
            let round = self
                .process_round(batch, &mut blocked_groups, &mut held)
                .await;
            report.merge(round);
        }
        self.release_held(held).await;

        if report.total() > 0 {
            info!(
                applied = report.applied.len(),
                discarded = report.discarded.len(),
                failed = report.failed.len(),
                blocked_groups = blocked_groups.len(),
                "Drained queue"
            );
        }
        Ok(report)
    }

    /// Polls the source until `shutdown` turns true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> BatchReport {
        let mut report = BatchReport::default();
        info!("Consumer worker started");

        while !*shutdown.borrow() {
            let batch = match self.source.receive(self.config.batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!(error = %e, "Failed to receive from queue");
                    Vec::new()
                }
            };

            if batch.is_empty() {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
                continue;
            }

            report.merge(self.process_batch(batch).await);
        }

        info!(processed = report.total(), "Consumer worker stopped");
        report
    }

    /// Settles applied and discarded deliveries; failed ones, and everything
    /// after them in the same group, are pushed onto `held` unsettled.
    async fn process_round(
        &self,
        deliveries: Vec<Delivery>,
        blocked_groups: &mut HashSet<String>,
        held: &mut Vec<Delivery>,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for delivery in deliveries {
            let outcome = if blocked_groups.contains(&delivery.group_id) {
                Outcome::Failed
            } else {
                self.resolve(&delivery).await
            };

            if outcome == Outcome::Failed {
                blocked_groups.insert(delivery.group_id.clone());
                report.record(delivery.message_id.clone(), outcome);
                held.push(delivery);
            } else {
                self.settle(&delivery, outcome).await;
                debug!(message_id = %delivery.message_id, state = %DeliveryState::Settled(outcome));
                report.record(delivery.message_id, outcome);
            }
        }

        report
    }

    async fn release_held(&self, held: Vec<Delivery>) {
        for delivery in &held {
            self.settle(delivery, Outcome::Failed).await;
            debug!(
                message_id = %delivery.message_id,
                state = %DeliveryState::Settled(Outcome::Failed)
            );
        }
    }

    async fn settle(&self, delivery: &Delivery, outcome: Outcome) {
        let result = match outcome {
            Outcome::Applied | Outcome::Discarded => self.source.ack(&delivery.receipt).await,
            Outcome::Failed => self.source.release(&delivery.receipt).await,
        };
        // An unsettled delivery is redelivered later; applies are idempotent.
        if let Err(e) = result {
            error!(message_id = %delivery.message_id, error = %e, "Failed to settle delivery");
        }
    }
}
