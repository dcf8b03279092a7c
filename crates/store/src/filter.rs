use chrono::{DateTime, Utc};
use common::{WorkOrder, WorkOrderStatus};

/// Filter for work order queries.
///
/// Every supplied predicate must hold (logical AND); an empty filter
/// matches all orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderFilter {
    /// Orders whose planned begin is at or after this instant.
    pub since: Option<DateTime<Utc>>,

    /// Orders whose planned end is at or before this instant.
    pub until: Option<DateTime<Utc>>,

    /// Orders with exactly this status.
    pub status: Option<WorkOrderStatus>,
}

impl WorkOrderFilter {
    /// Creates a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter for orders in a given status.
    pub fn for_status(status: WorkOrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn status(mut self, status: WorkOrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.since.is_none() && self.until.is_none() && self.status.is_none()
    }

    /// Checks that the window is not inverted.
    ///
    /// The gateway runs inverted windows as given (they match nothing); the
    /// HTTP boundary calls this to reject them up front.
    pub fn validate(&self) -> Result<(), String> {
        match (self.since, self.until) {
            (Some(since), Some(until)) if since > until => Err(format!(
                "since ({}) must not be later than until ({})",
                since.to_rfc3339(),
                until.to_rfc3339()
            )),
            _ => Ok(()),
        }
    }

    /// Evaluates the filter against a single order.
    pub fn matches(&self, order: &WorkOrder) -> bool {
        if let Some(since) = self.since
            && order.planned_date_begin < since
        {
            return false;
        }
        if let Some(until) = self.until
            && order.planned_date_end > until
        {
            return false;
        }
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use common::{CustomerId, NewWorkOrder, WorkOrderType};

    use super::*;

    fn order_at(begin: DateTime<Utc>, minutes: i64, status: WorkOrderStatus) -> WorkOrder {
        let mut order = WorkOrder::new(NewWorkOrder::new(
            CustomerId::new(),
            "test",
            begin,
            begin + Duration::minutes(minutes),
            WorkOrderType::ActivateCustomer,
        ));
        order.status = status;
        order
    }

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = WorkOrderFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&order_at(ts(2024, 3, 1, 9), 60, WorkOrderStatus::Done)));
    }

    #[test]
    fn since_is_inclusive_on_planned_begin() {
        let filter = WorkOrderFilter::new().since(ts(2024, 3, 1, 9));
        assert!(filter.matches(&order_at(ts(2024, 3, 1, 9), 60, WorkOrderStatus::New)));
        assert!(!filter.matches(&order_at(ts(2024, 3, 1, 8), 60, WorkOrderStatus::New)));
    }

    #[test]
    fn until_is_inclusive_on_planned_end() {
        let filter = WorkOrderFilter::new().until(ts(2024, 3, 1, 10));
        assert!(filter.matches(&order_at(ts(2024, 3, 1, 9), 60, WorkOrderStatus::New)));
        assert!(!filter.matches(&order_at(ts(2024, 3, 1, 9), 61, WorkOrderStatus::New)));
    }

    #[test]
    fn predicates_are_combined_with_and() {
        let filter = WorkOrderFilter::for_status(WorkOrderStatus::New)
            .since(ts(2024, 1, 1, 0))
            .until(ts(2024, 12, 31, 23));
        assert!(filter.matches(&order_at(ts(2024, 6, 1, 9), 60, WorkOrderStatus::New)));
        assert!(!filter.matches(&order_at(ts(2024, 6, 1, 9), 60, WorkOrderStatus::Done)));
        assert!(!filter.matches(&order_at(ts(2025, 1, 2, 9), 60, WorkOrderStatus::New)));
    }

    #[test]
    fn inverted_window_fails_validation() {
        let filter = WorkOrderFilter::new()
            .since(ts(2024, 2, 1, 0))
            .until(ts(2024, 1, 1, 0));
        assert!(filter.validate().is_err());
        assert!(
            WorkOrderFilter::new()
                .since(ts(2024, 1, 1, 0))
                .until(ts(2024, 1, 1, 0))
                .validate()
                .is_ok()
        );
    }
}
