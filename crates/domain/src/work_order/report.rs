use common::{CustomerId, WorkOrderId, WorkOrderStatus, WorkOrderType};
use serde::Serialize;

/// Snapshot of how far a work order's completion got.
///
/// Completion writes the customer, then the order, then the stream entry,
/// without a transaction spanning them. The report lets a caller tell which
/// of those effects are visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub work_order_id: WorkOrderId,
    pub status: WorkOrderStatus,
    #[serde(rename = "type")]
    pub kind: WorkOrderType,
    pub customer_id: CustomerId,
    pub customer_is_active: bool,
    /// Whether the customer currently has the activation state the order
    /// type targets. A later order on the same customer can flip this.
    pub customer_matches_target: bool,
    /// Other `done` orders of the same customer and type. Any of them can
    /// account for the customer's current state.
    pub other_completed_orders: usize,
    /// Completion events on the stream that carry this order's id.
    pub published_events: usize,
}

impl CompletionReport {
    /// The order is done but no completion event reached the stream.
    pub fn needs_republish(&self) -> bool {
        self.status == WorkOrderStatus::Done && self.published_events == 0
    }

    /// The customer already carries the order's effect while the order is
    /// still `new`, the state left behind when the order update failed.
    ///
    /// Not reported when another completed order of the same type explains
    /// the customer's state. A half-applied order that has such a sibling
    /// goes undetected; order records carry no completion time to tell
    /// the two apart.
    pub fn is_half_applied(&self) -> bool {
        self.status == WorkOrderStatus::New
            && self.customer_matches_target
            && self.other_completed_orders == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: WorkOrderStatus, matches: bool, published: usize) -> CompletionReport {
        CompletionReport {
            work_order_id: WorkOrderId::new(),
            status,
            kind: WorkOrderType::ActivateCustomer,
            customer_id: CustomerId::new(),
            customer_is_active: matches,
            customer_matches_target: matches,
            other_completed_orders: 0,
            published_events: published,
        }
    }

    #[test]
    fn done_without_events_needs_republish() {
        assert!(report(WorkOrderStatus::Done, true, 0).needs_republish());
        assert!(!report(WorkOrderStatus::Done, true, 1).needs_republish());
        assert!(!report(WorkOrderStatus::New, true, 0).needs_republish());
    }

    #[test]
    fn half_applied_detection() {
        assert!(report(WorkOrderStatus::New, true, 0).is_half_applied());
        assert!(!report(WorkOrderStatus::New, false, 0).is_half_applied());
        assert!(!report(WorkOrderStatus::Done, true, 1).is_half_applied());
    }

    #[test]
    fn completed_sibling_explains_customer_state() {
        let mut pending = report(WorkOrderStatus::New, true, 0);
        pending.other_completed_orders = 1;
        assert!(!pending.is_half_applied());
    }
}
