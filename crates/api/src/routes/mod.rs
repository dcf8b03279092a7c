//! HTTP handlers, one module per resource.

pub mod customers;
pub mod health;
pub mod metrics;
pub mod work_orders;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a UUID path or body field into one of the typed identifiers.
pub(crate) fn parse_id<T: From<uuid::Uuid>>(field: &str, raw: &str) -> Result<T, ApiError> {
    uuid::Uuid::from_str(raw)
        .map(T::from)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {field}: {e}")))
}
