//! Customer lifecycle service.

use common::{Customer, CustomerId, NewCustomer};
use store::Store;

use crate::error::DomainError;

/// Passthrough service over the customer gateway.
///
/// Activation state is changed by work order completion, not here.
pub struct CustomerService<S: Store> {
    store: S,
}

impl<S: Store> CustomerService<S> {
    /// Creates a new customer service with the given gateway.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying gateway.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persists a new, inactive customer.
    #[tracing::instrument(skip(self, new))]
    pub async fn create(&self, new: NewCustomer) -> Result<Customer, DomainError> {
        let customer = Customer::new(new);
        self.store.create_customer(&customer).await?;

        metrics::counter!("customers_created_total").increment(1);
        tracing::info!(customer_id = %customer.id, "customer created");

        Ok(customer)
    }

    /// Loads a customer by ID.
    ///
    /// Returns None if the customer doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DomainError> {
        Ok(self.store.find_customer(id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_active(&self) -> Result<Vec<Customer>, DomainError> {
        Ok(self.store.find_active_customers().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Customer>, DomainError> {
        Ok(self.store.find_all_customers().await?)
    }

    /// Replaces a stored customer record.
    #[tracing::instrument(skip(self, customer), fields(customer_id = %customer.id))]
    pub async fn update(&self, customer: Customer) -> Result<(), DomainError> {
        if customer.id.is_nil() {
            return Err(DomainError::MissingIdentifier { entity: "Customer" });
        }
        Ok(self.store.update_customer(&customer).await?)
    }
}
