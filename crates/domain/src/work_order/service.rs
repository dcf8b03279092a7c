use std::time::Instant;

use chrono::Utc;
use common::{Customer, CustomerId, NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderStatus};
use event_stream::{EventSink, EventSinkExt};
use store::{Store, WorkOrderFilter};

use super::report::CompletionReport;
use super::{WORK_ORDER_COMPLETED_KEY, rules};
use crate::error::DomainError;

/// The work order lifecycle engine.
///
/// Validates new orders against their customer, drives the `new → done`
/// transition with its customer side effect, and publishes a completion
/// event for every successful transition.
///
/// The engine holds no locks: two concurrent completions of the same order
/// can both pass the status guard, and the second then re-applies the
/// customer change and publishes a second event. Writes are last-write-wins.
pub struct WorkOrderService<S: Store, K: EventSink> {
    store: S,
    sink: K,
    stream_name: String,
}

impl<S: Store, K: EventSink> WorkOrderService<S, K> {
    /// Creates a new engine publishing completions to `stream_name`.
    pub fn new(store: S, sink: K, stream_name: impl Into<String>) -> Self {
        Self {
            store,
            sink,
            stream_name: stream_name.into(),
        }
    }

    /// Returns a reference to the underlying gateway.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the underlying event sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Validates and persists a new work order in state `new`.
    ///
    /// Checks run in order and the first failure wins: the planned window,
    /// the customer's existence, then the customer's activation state.
    #[tracing::instrument(skip(self, new), fields(customer_id = %new.customer_id, kind = %new.kind))]
    pub async fn create(&self, new: NewWorkOrder) -> Result<WorkOrder, DomainError> {
        rules::check_planned_window(new.planned_date_begin, new.planned_date_end)?;

        let customer = self.load_customer(new.customer_id).await?;
        rules::check_customer_state(&customer, new.kind)?;

        let work_order = WorkOrder::new(new);
        self.store.create_work_order(&work_order).await?;

        metrics::counter!("work_orders_created_total").increment(1);
        tracing::info!(work_order_id = %work_order.id, "work order created");

        Ok(work_order)
    }

    /// Completes a `new` work order.
    ///
    /// Writes the customer, then the order, then appends the completed order
    /// to the stream. Nothing is rolled back: a failure after the customer
    /// write leaves the customer changed, and a [`DomainError::Publish`]
    /// means both records are already updated. Returns the completed order
    /// with the updated customer embedded.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, id: WorkOrderId) -> Result<WorkOrder, DomainError> {
        let started = Instant::now();
        let mut work_order = self.load_work_order(id).await?;

        match work_order.status {
            WorkOrderStatus::Done => return Err(DomainError::AlreadyDone(id)),
            WorkOrderStatus::Cancelled => return Err(DomainError::AlreadyCancelledTransition(id)),
            WorkOrderStatus::New => {}
        }

        let mut customer = self.load_customer(work_order.customer_id).await?;
        rules::apply_completion(&mut customer, work_order.kind, Utc::now());
        self.store.update_customer(&customer).await?;

        work_order.status = WorkOrderStatus::Done;
        if let Err(e) = self.store.update_work_order(&work_order).await {
            tracing::warn!(
                work_order_id = %id,
                customer_id = %customer.id,
                error = %e,
                "customer updated but work order is still new"
            );
            return Err(e.into());
        }
        work_order.customer = Some(customer);

        metrics::counter!("work_orders_completed_total").increment(1);
        tracing::info!(work_order_id = %id, kind = %work_order.kind, "work order completed");

        self.publish_completion(&work_order).await?;

        metrics::histogram!("work_order_completion_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(work_order)
    }

    /// Looks up a work order by id, with its customer embedded.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: WorkOrderId) -> Result<Option<WorkOrder>, DomainError> {
        Ok(self.store.find_work_order(id).await?)
    }

    /// Returns the work orders matching `filter`. An empty list is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_filter(
        &self,
        filter: &WorkOrderFilter,
    ) -> Result<Vec<WorkOrder>, DomainError> {
        Ok(self.store.find_work_orders(filter).await?)
    }

    /// Returns every work order of a customer.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<WorkOrder>, DomainError> {
        Ok(self.store.find_work_orders_by_customer(customer_id).await?)
    }

    /// Replaces a stored work order. No lifecycle rule is applied.
    #[tracing::instrument(skip(self, work_order), fields(work_order_id = %work_order.id))]
    pub async fn update(&self, work_order: WorkOrder) -> Result<(), DomainError> {
        if work_order.id.is_nil() {
            return Err(DomainError::MissingIdentifier {
                entity: "Work order",
            });
        }
        Ok(self.store.update_work_order(&work_order).await?)
    }

    /// Reports which effects of a completion are visible.
    #[tracing::instrument(skip(self))]
    pub async fn inspect_completion(
        &self,
        id: WorkOrderId,
    ) -> Result<CompletionReport, DomainError> {
        let work_order = self.load_work_order(id).await?;
        let customer = match work_order.customer.clone() {
            Some(customer) => customer,
            None => self.load_customer(work_order.customer_id).await?,
        };

        let published_events = self
            .sink
            .count_referencing(&self.stream_name, WORK_ORDER_COMPLETED_KEY, &id.to_string())
            .await?;

        let other_completed_orders = self
            .store
            .find_work_orders_by_customer(customer.id)
            .await?
            .iter()
            .filter(|other| {
                other.id != id
                    && other.kind == work_order.kind
                    && other.status == WorkOrderStatus::Done
            })
            .count();

        Ok(CompletionReport {
            work_order_id: id,
            status: work_order.status,
            kind: work_order.kind,
            customer_id: customer.id,
            customer_is_active: customer.is_active,
            customer_matches_target: customer.is_active == work_order.kind.target_activation(),
            other_completed_orders,
            published_events,
        })
    }

    /// Publishes the completion event of a `done` order again.
    ///
    /// Consumers already receive completions at least once; this lets a
    /// caller recover from a [`DomainError::Publish`].
    #[tracing::instrument(skip(self))]
    pub async fn republish_completion(&self, id: WorkOrderId) -> Result<WorkOrder, DomainError> {
        let work_order = self.load_work_order(id).await?;
        if work_order.status != WorkOrderStatus::Done {
            return Err(DomainError::NotCompleted(id));
        }

        self.publish_completion(&work_order).await?;
        tracing::info!(work_order_id = %id, "completion event republished");
        Ok(work_order)
    }

    async fn publish_completion(&self, work_order: &WorkOrder) -> Result<(), DomainError> {
        let payload = serde_json::to_string(work_order)?;

        match self
            .sink
            .append_field(&self.stream_name, WORK_ORDER_COMPLETED_KEY, payload)
            .await
        {
            Ok(entry_id) => {
                metrics::counter!("work_order_events_published_total").increment(1);
                tracing::debug!(work_order_id = %work_order.id, %entry_id, "completion event published");
                Ok(())
            }
            Err(source) => {
                metrics::counter!("work_order_event_publish_failures_total").increment(1);
                tracing::error!(
                    work_order_id = %work_order.id,
                    error = %source,
                    "completion committed but event publication failed"
                );
                Err(DomainError::Publish {
                    work_order_id: work_order.id,
                    source,
                })
            }
        }
    }

    async fn load_work_order(&self, id: WorkOrderId) -> Result<WorkOrder, DomainError> {
        self.store
            .find_work_order(id)
            .await?
            .ok_or_else(|| DomainError::work_order_not_found(id))
    }

    async fn load_customer(&self, id: CustomerId) -> Result<Customer, DomainError> {
        self.store
            .find_customer(id)
            .await?
            .ok_or_else(|| DomainError::customer_not_found(id))
    }
}
