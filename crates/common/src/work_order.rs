use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Customer, CustomerId, WorkOrderId};

/// Rejected wire value for one of the closed work-order enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid work order status '{0}', expected one of: new, done, cancelled")]
    Status(String),

    #[error("invalid work order type '{0}', expected one of: activate-customer, cancel-customer")]
    Type(String),
}

/// The status of a work order.
///
/// ```text
/// New ──complete──► Done
///  │
///  └──(outside the engine)──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderStatus {
    /// Created and waiting to be completed.
    #[default]
    New,

    /// Completed, its effect applied to the customer (terminal state).
    Done,

    /// Cancelled before completion (terminal state).
    Cancelled,
}

impl WorkOrderStatus {
    /// Returns true if the order may transition to `Done`.
    pub fn can_complete(&self) -> bool {
        matches!(self, WorkOrderStatus::New)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Done | WorkOrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::New => "new",
            WorkOrderStatus::Done => "done",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(WorkOrderStatus::New),
            "done" => Ok(WorkOrderStatus::Done),
            "cancelled" => Ok(WorkOrderStatus::Cancelled),
            other => Err(ParseError::Status(other.to_string())),
        }
    }
}

/// The effect a work order applies to its customer on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkOrderType {
    ActivateCustomer,
    CancelCustomer,
}

impl WorkOrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderType::ActivateCustomer => "activate-customer",
            WorkOrderType::CancelCustomer => "cancel-customer",
        }
    }

    /// The customer activation state this order type leaves behind.
    pub fn target_activation(&self) -> bool {
        match self {
            WorkOrderType::ActivateCustomer => true,
            WorkOrderType::CancelCustomer => false,
        }
    }
}

impl std::fmt::Display for WorkOrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activate-customer" => Ok(WorkOrderType::ActivateCustomer),
            "cancel-customer" => Ok(WorkOrderType::CancelCustomer),
            other => Err(ParseError::Type(other.to_string())),
        }
    }
}

/// A unit of scheduled work tied to one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub customer_id: CustomerId,
    pub description: String,
    pub planned_date_begin: DateTime<Utc>,
    pub planned_date_end: DateTime<Utc>,
    pub status: WorkOrderStatus,
    #[serde(rename = "type")]
    pub kind: WorkOrderType,
    pub created_at: DateTime<Utc>,
    /// The owning customer, when the gateway loaded it alongside the order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

/// Input for creating a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkOrder {
    #[serde(default)]
    pub id: Option<WorkOrderId>,
    pub customer_id: CustomerId,
    pub description: String,
    pub planned_date_begin: DateTime<Utc>,
    pub planned_date_end: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: WorkOrderType,
}

impl NewWorkOrder {
    pub fn new(
        customer_id: CustomerId,
        description: impl Into<String>,
        planned_date_begin: DateTime<Utc>,
        planned_date_end: DateTime<Utc>,
        kind: WorkOrderType,
    ) -> Self {
        Self {
            id: None,
            customer_id,
            description: description.into(),
            planned_date_begin,
            planned_date_end,
            kind,
        }
    }

    pub fn with_id(mut self, id: WorkOrderId) -> Self {
        self.id = Some(id);
        self
    }
}

impl WorkOrder {
    /// Builds a `new` work order record, assigning an id when none was given.
    pub fn new(new: NewWorkOrder) -> Self {
        Self {
            id: new.id.filter(|id| !id.is_nil()).unwrap_or_default(),
            customer_id: new.customer_id,
            description: new.description,
            planned_date_begin: new.planned_date_begin,
            planned_date_end: new.planned_date_end,
            status: WorkOrderStatus::New,
            kind: new.kind,
            created_at: Utc::now(),
            customer: None,
        }
    }

    /// Returns the order without its embedded customer.
    pub fn detached(mut self) -> Self {
        self.customer = None;
        self
    }
}
