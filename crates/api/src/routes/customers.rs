//! Customer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Customer, CustomerId, NewCustomer, WorkOrder};
use event_stream::EventSink;
use serde::Deserialize;
use store::Store;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
}

/// Fields a client may change on an existing customer. Activation state is
/// owned by work order completion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
}

/// POST /customers
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let mut new = NewCustomer::new(req.first_name, req.last_name, req.address);
    if let Some(raw) = req.id.as_deref() {
        new = new.with_id(parse_id("customer id", raw)?);
    }

    let customer = state.customers.create(new).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(state.customers.find_all().await?))
}

/// GET /customers/active
#[tracing::instrument(skip(state))]
pub async fn active<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(state.customers.find_active().await?))
}

/// GET /customers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let customer_id: CustomerId = parse_id("customer id", &id)?;
    let customer = state
        .customers
        .find_by_id(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer {id} not found")))?;

    Ok(Json(customer))
}

/// PUT /customers/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    let customer_id: CustomerId = parse_id("customer id", &id)?;
    let mut customer = state
        .customers
        .find_by_id(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer {id} not found")))?;

    customer.first_name = req.first_name;
    customer.last_name = req.last_name;
    customer.address = req.address;
    state.customers.update(customer.clone()).await?;

    Ok(Json(customer))
}

/// GET /customers/{id}/work-orders
#[tracing::instrument(skip(state))]
pub async fn work_orders<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<WorkOrder>>, ApiError> {
    let customer_id: CustomerId = parse_id("customer id", &id)?;
    Ok(Json(state.work_orders.find_by_customer_id(customer_id).await?))
}
