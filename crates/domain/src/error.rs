//! Business error taxonomy.

use common::{CustomerId, WorkOrderId};
use event_stream::SinkError;
use store::StoreError;
use thiserror::Error;

/// Coarse classification of a [`DomainError`], used by callers to pick a
/// response without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected input, detected before any write.
    Validation,
    /// The requested transition is not allowed in the current state.
    Conflict,
    /// A referenced entity does not exist.
    NotFound,
    /// The gateway or the event sink failed.
    Infrastructure,
}

/// Errors that can occur during customer and work order operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The planned window is longer than the allowed maximum.
    #[error(
        "Planned window of {window_minutes} minutes exceeds the maximum of {max_minutes} minutes"
    )]
    DateInterval {
        window_minutes: i64,
        max_minutes: i64,
    },

    /// An activation order targets a customer that is already active.
    #[error("Customer {0} is already active")]
    AlreadyActive(CustomerId),

    /// A cancellation order targets a customer that is already inactive.
    #[error("Customer {0} is already cancelled")]
    AlreadyCancelled(CustomerId),

    /// The work order was completed before.
    #[error("Work order {0} is already done")]
    AlreadyDone(WorkOrderId),

    /// The work order was cancelled and can no longer be completed.
    #[error("Work order {0} is cancelled and cannot be completed")]
    AlreadyCancelledTransition(WorkOrderId),

    /// The operation requires a completed work order.
    #[error("Work order {0} has not been completed")]
    NotCompleted(WorkOrderId),

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A record without an identifier was passed to an update.
    #[error("{entity} has no identifier")]
    MissingIdentifier { entity: &'static str },

    /// An error occurred in the persistence gateway.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The completion was committed but the event could not be appended.
    ///
    /// The customer and the work order are already updated; only the
    /// notification is missing.
    #[error(
        "Work order {work_order_id} was completed but its completion event was not published: {source}"
    )]
    Publish {
        work_order_id: WorkOrderId,
        source: SinkError,
    },

    /// The event sink could not be read.
    #[error("Event sink error: {0}")]
    Sink(#[from] SinkError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub(crate) fn customer_not_found(id: CustomerId) -> Self {
        DomainError::NotFound {
            entity: "Customer",
            id: id.to_string(),
        }
    }

    pub(crate) fn work_order_not_found(id: WorkOrderId) -> Self {
        DomainError::NotFound {
            entity: "Work order",
            id: id.to_string(),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::DateInterval { .. } | DomainError::MissingIdentifier { .. } => {
                ErrorKind::Validation
            }
            DomainError::AlreadyActive(_)
            | DomainError::AlreadyCancelled(_)
            | DomainError::AlreadyDone(_)
            | DomainError::AlreadyCancelledTransition(_)
            | DomainError::NotCompleted(_) => ErrorKind::Conflict,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Store(err) => match err {
                StoreError::NotFound { .. } | StoreError::UnknownCustomer(_) => {
                    ErrorKind::NotFound
                }
                StoreError::MissingIdentifier { .. } => ErrorKind::Validation,
                StoreError::DuplicateId { .. } => ErrorKind::Conflict,
                _ => ErrorKind::Infrastructure,
            },
            DomainError::Publish { .. }
            | DomainError::Sink(_)
            | DomainError::Serialization(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns true when the state change behind this error was committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, DomainError::Publish { .. })
    }
}
