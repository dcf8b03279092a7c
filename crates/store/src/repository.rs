use async_trait::async_trait;
use common::{Customer, CustomerId, WorkOrder, WorkOrderId};

use crate::{Result, WorkOrderFilter};

/// Durable storage for customer records.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Inserts a new customer record.
    ///
    /// Fails with `DuplicateId` if a customer with the same id exists.
    async fn create_customer(&self, customer: &Customer) -> Result<()>;

    /// Looks up a customer by id. Returns None if it doesn't exist.
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Returns every customer whose `is_active` flag is set.
    async fn find_active_customers(&self) -> Result<Vec<Customer>>;

    /// Returns every customer.
    async fn find_all_customers(&self) -> Result<Vec<Customer>>;

    /// Replaces the stored record with `customer` (last write wins).
    ///
    /// Fails with `MissingIdentifier` for the nil id and `NotFound` when no
    /// row matches. `created_at` is never rewritten.
    async fn update_customer(&self, customer: &Customer) -> Result<()>;
}

/// Durable storage for work order records.
///
/// Reads return orders with their customer embedded, ordered by creation
/// time (oldest first).
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// Inserts a new work order record.
    ///
    /// Fails with `DuplicateId` on an id collision and `UnknownCustomer`
    /// when the referenced customer row is missing.
    async fn create_work_order(&self, work_order: &WorkOrder) -> Result<()>;

    /// Looks up a work order by id. Returns None if it doesn't exist.
    async fn find_work_order(&self, id: WorkOrderId) -> Result<Option<WorkOrder>>;

    /// Returns the work orders matching every predicate of `filter`.
    async fn find_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>>;

    /// Returns every work order referencing `customer_id`.
    async fn find_work_orders_by_customer(&self, customer_id: CustomerId)
    -> Result<Vec<WorkOrder>>;

    /// Replaces the stored record with `work_order` (last write wins).
    ///
    /// The embedded customer, if any, is ignored.
    async fn update_work_order(&self, work_order: &WorkOrder) -> Result<()>;
}

/// A gateway serving both record families.
pub trait Store: CustomerRepository + WorkOrderRepository {}

// Blanket implementation for every type providing both repositories
impl<T: CustomerRepository + WorkOrderRepository + ?Sized> Store for T {}
