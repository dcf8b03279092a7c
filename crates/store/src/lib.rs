//! Persistence gateway for customers and work orders.
//!
//! The gateway offers create / read / full-record update over two record
//! families. It carries no business rules; those live in the `domain` crate.

pub mod error;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use common::{Customer, CustomerId, WorkOrder, WorkOrderId, WorkOrderStatus};
pub use error::{Result, StoreError};
pub use filter::WorkOrderFilter;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use repository::{CustomerRepository, Store, WorkOrderRepository};
