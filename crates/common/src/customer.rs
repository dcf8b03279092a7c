use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CustomerId;

/// A customer whose activation state is driven by completed work orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    /// Set when an activation order completes.
    pub start_date: Option<DateTime<Utc>>,
    /// Set when a cancellation order completes, cleared on re-activation.
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    #[serde(default)]
    pub id: Option<CustomerId>,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
}

impl NewCustomer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            address: address.into(),
        }
    }

    pub fn with_id(mut self, id: CustomerId) -> Self {
        self.id = Some(id);
        self
    }
}

impl Customer {
    /// Builds an inactive customer record, assigning an id when none was given.
    pub fn new(new: NewCustomer) -> Self {
        Self {
            id: new.id.filter(|id| !id.is_nil()).unwrap_or_default(),
            first_name: new.first_name,
            last_name: new.last_name,
            address: new.address,
            start_date: None,
            end_date: None,
            is_active: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_customer_starts_inactive() {
        let customer = Customer::new(NewCustomer::new("Ada", "Lovelace", "12 Analytical St"));
        assert!(!customer.is_active);
        assert!(customer.start_date.is_none());
        assert!(customer.end_date.is_none());
        assert!(!customer.id.is_nil());
    }

    #[test]
    fn supplied_id_is_kept() {
        let id = CustomerId::new();
        let customer = Customer::new(NewCustomer::new("A", "B", "C").with_id(id));
        assert_eq!(customer.id, id);
    }

    #[test]
    fn nil_id_is_replaced() {
        let customer = Customer::new(NewCustomer::new("A", "B", "C").with_id(CustomerId::nil()));
        assert!(!customer.id.is_nil());
    }

    #[test]
    fn json_uses_camel_case() {
        let customer = Customer::new(NewCustomer::new("A", "B", "C"));
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["firstName"], "A");
        assert_eq!(json["isActive"], false);
        assert!(json["startDate"].is_null());
        assert!(json.get("createdAt").is_some());
    }
}
