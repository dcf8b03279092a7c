use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{Customer, CustomerId, WorkOrder, WorkOrderId};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError, WorkOrderFilter,
    repository::{CustomerRepository, WorkOrderRepository},
};

#[derive(Default)]
struct Tables {
    customers: HashMap<CustomerId, Customer>,
    work_orders: HashMap<WorkOrderId, WorkOrder>,
}

#[derive(Default)]
struct Faults {
    customer_updates: AtomicBool,
    work_order_updates: AtomicBool,
}

/// In-memory gateway implementation for tests and local runs.
///
/// Provides the same interface and error behaviour as the PostgreSQL
/// implementation. Clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent customer update fail with `Unavailable`.
    pub fn set_fail_customer_updates(&self, fail: bool) {
        self.faults.customer_updates.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent work order update fail with `Unavailable`.
    pub fn set_fail_work_order_updates(&self, fail: bool) {
        self.faults.work_order_updates.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored customers.
    pub async fn customer_count(&self) -> usize {
        self.tables.read().await.customers.len()
    }

    /// Returns the number of stored work orders.
    pub async fn work_order_count(&self) -> usize {
        self.tables.read().await.work_orders.len()
    }

    fn with_customer(tables: &Tables, order: &WorkOrder) -> WorkOrder {
        let mut order = order.clone();
        order.customer = tables.customers.get(&order.customer_id).cloned();
        order
    }

    fn collect_orders<'a>(
        tables: &Tables,
        orders: impl Iterator<Item = &'a WorkOrder>,
    ) -> Vec<WorkOrder> {
        let mut orders: Vec<_> = orders.map(|o| Self::with_customer(tables, o)).collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        orders
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn create_customer(&self, customer: &Customer) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.customers.contains_key(&customer.id) {
            return Err(StoreError::DuplicateId {
                entity: "customer",
                id: customer.id.to_string(),
            });
        }
        tables.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn find_active_customers(&self) -> Result<Vec<Customer>> {
        let tables = self.tables.read().await;
        let mut customers: Vec<_> = tables
            .customers
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(customers)
    }

    async fn find_all_customers(&self) -> Result<Vec<Customer>> {
        let tables = self.tables.read().await;
        let mut customers: Vec<_> = tables.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(customers)
    }

    async fn update_customer(&self, customer: &Customer) -> Result<()> {
        if customer.id.is_nil() {
            return Err(StoreError::MissingIdentifier { entity: "customer" });
        }
        if self.faults.customer_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "customer updates are disabled".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        let stored = tables
            .customers
            .get_mut(&customer.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "customer",
                id: customer.id.to_string(),
            })?;

        let created_at = stored.created_at;
        *stored = customer.clone();
        stored.created_at = created_at;
        Ok(())
    }
}

#[async_trait]
impl WorkOrderRepository for InMemoryStore {
    async fn create_work_order(&self, work_order: &WorkOrder) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.work_orders.contains_key(&work_order.id) {
            return Err(StoreError::DuplicateId {
                entity: "work order",
                id: work_order.id.to_string(),
            });
        }
        // Foreign key simulation
        if !tables.customers.contains_key(&work_order.customer_id) {
            return Err(StoreError::UnknownCustomer(work_order.customer_id.to_string()));
        }
        tables
            .work_orders
            .insert(work_order.id, work_order.clone().detached());
        Ok(())
    }

    async fn find_work_order(&self, id: WorkOrderId) -> Result<Option<WorkOrder>> {
        let tables = self.tables.read().await;
        Ok(tables
            .work_orders
            .get(&id)
            .map(|o| Self::with_customer(&tables, o)))
    }

    async fn find_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>> {
        let tables = self.tables.read().await;
        Ok(Self::collect_orders(
            &tables,
            tables.work_orders.values().filter(|o| filter.matches(o)),
        ))
    }

    async fn find_work_orders_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<WorkOrder>> {
        let tables = self.tables.read().await;
        Ok(Self::collect_orders(
            &tables,
            tables
                .work_orders
                .values()
                .filter(|o| o.customer_id == customer_id),
        ))
    }

    async fn update_work_order(&self, work_order: &WorkOrder) -> Result<()> {
        if work_order.id.is_nil() {
            return Err(StoreError::MissingIdentifier {
                entity: "work order",
            });
        }
        if self.faults.work_order_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "work order updates are disabled".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&work_order.customer_id) {
            return Err(StoreError::UnknownCustomer(work_order.customer_id.to_string()));
        }
        let stored = tables
            .work_orders
            .get_mut(&work_order.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "work order",
                id: work_order.id.to_string(),
            })?;

        let created_at = stored.created_at;
        *stored = work_order.clone().detached();
        stored.created_at = created_at;
        Ok(())
    }
}
