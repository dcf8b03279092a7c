//! Domain layer for the work-order service.
//!
//! This crate provides:
//! - `CustomerService`, a passthrough over the customer gateway
//! - `WorkOrderService`, the lifecycle engine that validates orders, completes
//!   them, applies their effect to the customer and publishes completion events
//! - `DomainError`, the business error taxonomy exposed to callers

pub mod customer;
pub mod error;
pub mod work_order;

pub use customer::CustomerService;
pub use error::{DomainError, ErrorKind};
pub use work_order::{
    CompletionReport, DEFAULT_STREAM_NAME, WORK_ORDER_COMPLETED_KEY, WorkOrderService, rules,
};
