//! Work order lifecycle engine.

mod report;
pub mod rules;
mod service;

pub use report::CompletionReport;
pub use service::WorkOrderService;

/// Field key under which a completed work order is appended to the stream.
pub const WORK_ORDER_COMPLETED_KEY: &str = "work_order_completed";

/// Stream used when none is configured.
pub const DEFAULT_STREAM_NAME: &str = "work_orders_stream";
