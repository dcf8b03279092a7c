//! Shared record types for the work-order service.
//!
//! The persistence gateway, the event stream and the domain services all
//! exchange these types, so they live below every other crate.

mod customer;
mod ids;
mod work_order;

pub use customer::{Customer, NewCustomer};
pub use ids::{CustomerId, WorkOrderId};
pub use work_order::{NewWorkOrder, ParseError, WorkOrder, WorkOrderStatus, WorkOrderType};
