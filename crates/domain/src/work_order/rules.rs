//! Business rules of the work order lifecycle, free of I/O.

use chrono::{DateTime, Duration, Utc};
use common::{Customer, WorkOrderType};

use crate::error::DomainError;

/// Longest planned execution window accepted at creation, in minutes.
pub const MAX_PLANNED_WINDOW_MINUTES: i64 = 120;

/// Longest planned execution window accepted at creation.
pub fn max_planned_window() -> Duration {
    Duration::minutes(MAX_PLANNED_WINDOW_MINUTES)
}

/// Rejects planned windows longer than [`max_planned_window`].
///
/// Only the span is checked: an end before the begin yields a negative span
/// and passes.
pub fn check_planned_window(
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), DomainError> {
    let window = end - begin;
    if window > max_planned_window() {
        // Round up so a window a few seconds over still reads as over.
        let mut window_minutes = window.num_minutes();
        if window > Duration::minutes(window_minutes) {
            window_minutes += 1;
        }
        return Err(DomainError::DateInterval {
            window_minutes,
            max_minutes: MAX_PLANNED_WINDOW_MINUTES,
        });
    }
    Ok(())
}

/// Rejects orders whose effect the customer already has.
pub fn check_customer_state(customer: &Customer, kind: WorkOrderType) -> Result<(), DomainError> {
    match (kind, customer.is_active) {
        (WorkOrderType::ActivateCustomer, true) => Err(DomainError::AlreadyActive(customer.id)),
        (WorkOrderType::CancelCustomer, false) => Err(DomainError::AlreadyCancelled(customer.id)),
        (WorkOrderType::ActivateCustomer, false) | (WorkOrderType::CancelCustomer, true) => Ok(()),
    }
}

/// Applies the customer side effect of completing an order of type `kind`.
///
/// Activation clears `end_date`; cancellation leaves `start_date` untouched.
pub fn apply_completion(customer: &mut Customer, kind: WorkOrderType, now: DateTime<Utc>) {
    match kind {
        WorkOrderType::ActivateCustomer => {
            customer.is_active = true;
            customer.start_date = Some(now);
            customer.end_date = None;
        }
        WorkOrderType::CancelCustomer => {
            customer.is_active = false;
            customer.end_date = Some(now);
        }
    }
}
