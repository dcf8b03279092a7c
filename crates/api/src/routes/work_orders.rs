//! Work order endpoints: creation, queries, completion and reconciliation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderStatus, WorkOrderType};
use domain::CompletionReport;
use event_stream::EventSink;
use serde::{Deserialize, Serialize};
use store::{Store, WorkOrderFilter};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

/// Body of `POST /work-orders`. Dates and enums arrive as strings so that a
/// malformed value is reported as a 400 naming the field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderRequest {
    pub id: Option<String>,
    #[serde(alias = "customerID")]
    pub customer_id: String,
    pub description: String,
    pub planned_date_begin: String,
    pub planned_date_end: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkOrderQuery {
    pub since: Option<String>,
    pub until: Option<String>,
    pub status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub message: &'static str,
    pub work_order: WorkOrder,
}

// -- Handlers --

/// POST /work-orders
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Json(req): Json<CreateWorkOrderRequest>,
) -> Result<(StatusCode, Json<WorkOrder>), ApiError> {
    let mut new = NewWorkOrder::new(
        parse_id("customerId", &req.customer_id)?,
        req.description,
        parse_timestamp("plannedDateBegin", &req.planned_date_begin)?,
        parse_timestamp("plannedDateEnd", &req.planned_date_end)?,
        req.kind
            .parse::<WorkOrderType>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    );
    if let Some(raw) = req.id.as_deref() {
        new = new.with_id(parse_id("work order id", raw)?);
    }

    let work_order = state.work_orders.create(new).await?;
    Ok((StatusCode::CREATED, Json(work_order)))
}

/// GET /work-orders?since=&until=&status=
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Query(query): Query<WorkOrderQuery>,
) -> Result<Json<Vec<WorkOrder>>, ApiError> {
    let filter = parse_filter(&query)?;
    Ok(Json(state.work_orders.find_by_filter(&filter).await?))
}

/// GET /work-orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Path(id): Path<String>,
) -> Result<Json<WorkOrder>, ApiError> {
    let work_order_id: WorkOrderId = parse_id("work order id", &id)?;
    let work_order = state
        .work_orders
        .find_by_id(work_order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Work order {id} not found")))?;

    Ok(Json(work_order))
}

/// PATCH /work-orders/{id}/complete
#[tracing::instrument(skip(state))]
pub async fn complete<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Path(id): Path<String>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let work_order_id: WorkOrderId = parse_id("work order id", &id)?;
    let work_order = state.work_orders.complete(work_order_id).await?;

    Ok(Json(CompletionResponse {
        message: "Work order completed",
        work_order,
    }))
}

/// GET /work-orders/{id}/completion
#[tracing::instrument(skip(state))]
pub async fn completion<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Path(id): Path<String>,
) -> Result<Json<CompletionReport>, ApiError> {
    let work_order_id: WorkOrderId = parse_id("work order id", &id)?;
    Ok(Json(
        state.work_orders.inspect_completion(work_order_id).await?,
    ))
}

/// POST /work-orders/{id}/republish
#[tracing::instrument(skip(state))]
pub async fn republish<S: Store + 'static, K: EventSink + 'static>(
    State(state): State<Arc<AppState<S, K>>>,
    Path(id): Path<String>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let work_order_id: WorkOrderId = parse_id("work order id", &id)?;
    let work_order = state.work_orders.republish_completion(work_order_id).await?;

    Ok(Json(CompletionResponse {
        message: "Completion event republished",
        work_order,
    }))
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            ApiError::BadRequest(format!(
                "Invalid '{field}', expected RFC 3339 (YYYY-MM-DDTHH:MM:SSZ)"
            ))
        })
}

fn parse_filter(query: &WorkOrderQuery) -> Result<WorkOrderFilter, ApiError> {
    let mut filter = WorkOrderFilter::new();

    if let Some(raw) = query.since.as_deref().filter(|s| !s.is_empty()) {
        filter = filter.since(parse_timestamp("since", raw)?);
    }
    if let Some(raw) = query.until.as_deref().filter(|s| !s.is_empty()) {
        filter = filter.until(parse_timestamp("until", raw)?);
    }
    if let Some(raw) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status = raw.parse::<WorkOrderStatus>().map_err(|_| {
            ApiError::BadRequest(
                "Invalid 'status', must be 'new', 'done' or 'cancelled'".to_string(),
            )
        })?;
        filter = filter.status(status);
    }

    filter.validate().map_err(ApiError::BadRequest)?;
    Ok(filter)
}
