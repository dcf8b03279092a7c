//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use event_stream::InMemoryEventSink;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            api::routes::metrics::install_recorder().expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: axum::Router,
    store: InMemoryStore,
    sink: InMemoryEventSink,
}

fn setup() -> TestApp {
    let store = InMemoryStore::new();
    let sink = InMemoryEventSink::new();
    let state = api::create_state(store.clone(), sink.clone(), domain::DEFAULT_STREAM_NAME);
    TestApp {
        router: api::create_app(state, get_metrics_handle(), None),
        store,
        sink,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn create_customer(&self) -> Value {
        let response = self
            .send(
                "POST",
                "/api/v1/customers",
                Some(json!({
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "address": "12 Analytical St"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    async fn create_work_order(&self, customer_id: &str, kind: &str, minutes: i64) -> Response {
        let begin = chrono::Utc::now();
        let end = begin + chrono::Duration::minutes(minutes);
        self.send(
            "POST",
            "/api/v1/work-orders",
            Some(json!({
                "customerId": customer_id,
                "description": "Install router",
                "plannedDateBegin": begin.to_rfc3339(),
                "plannedDateEnd": end.to_rfc3339(),
                "type": kind
            })),
        )
        .await
    }
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app.send("GET", "/api/v1/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app.send("GET", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}

#[tokio::test]
async fn test_create_and_get_customer() {
    let app = setup();
    let created = app.create_customer().await;
    assert_eq!(created["isActive"], false);
    assert!(created["startDate"].is_null());

    let response = app
        .send("GET", &format!("/api/v1/customers/{}", id_of(&created)), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["firstName"], "Ada");
    assert_eq!(fetched["id"], created["id"]);
}

#[tokio::test]
async fn test_list_customers_and_active() {
    let app = setup();
    app.create_customer().await;
    app.create_customer().await;

    let all = body_json(app.send("GET", "/api/v1/customers", None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let response = app.send("GET", "/api/v1/customers/active", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_customer_keeps_activation_fields() {
    let app = setup();
    let created = app.create_customer().await;
    let id = id_of(&created);

    let response = app
        .send(
            "PUT",
            &format!("/api/v1/customers/{id}"),
            Some(json!({
                "firstName": "Augusta",
                "lastName": "King",
                "address": "1 Ockham Park"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["firstName"], "Augusta");
    assert_eq!(updated["isActive"], false);
    assert_eq!(updated["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn test_get_nonexistent_customer() {
    let app = setup();
    let response = app
        .send(
            "GET",
            &format!("/api/v1/customers/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_customer_id_format() {
    let app = setup();
    let response = app.send("GET", "/api/v1/customers/not-a-uuid", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_work_order() {
    let app = setup();
    let customer = app.create_customer().await;

    let response = app
        .create_work_order(&id_of(&customer), "activate-customer", 90)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let order = body_json(response).await;
    assert_eq!(order["status"], "new");
    assert_eq!(order["type"], "activate-customer");
    assert_eq!(order["customerId"], customer["id"]);
    assert_eq!(app.store.work_order_count().await, 1);
}

#[tokio::test]
async fn test_create_work_order_window_too_long() {
    let app = setup();
    let customer = app.create_customer().await;

    let response = app
        .create_work_order(&id_of(&customer), "activate-customer", 150)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].as_str().is_some());
    assert_eq!(app.store.work_order_count().await, 0);
}

#[tokio::test]
async fn test_create_work_order_unknown_customer() {
    let app = setup();
    let response = app
        .create_work_order(&uuid::Uuid::new_v4().to_string(), "activate-customer", 60)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_cancellation_for_inactive_customer() {
    let app = setup();
    let customer = app.create_customer().await;

    let response = app
        .create_work_order(&id_of(&customer), "cancel-customer", 60)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_work_order_rejects_unknown_type_and_bad_dates() {
    let app = setup();
    let customer = app.create_customer().await;

    let response = app
        .create_work_order(&id_of(&customer), "suspend-customer", 60)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(
            "POST",
            "/api/v1/work-orders",
            Some(json!({
                "customerId": id_of(&customer),
                "description": "Install router",
                "plannedDateBegin": "tomorrow",
                "plannedDateEnd": "2024-07-30T10:00:00Z",
                "type": "activate-customer"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_work_order_requires_description() {
    let app = setup();
    let customer = app.create_customer().await;

    let response = app
        .send(
            "POST",
            "/api/v1/work-orders",
            Some(json!({
                "customerId": id_of(&customer),
                "plannedDateBegin": "2024-07-30T10:00:00Z",
                "plannedDateEnd": "2024-07-30T11:00:00Z",
                "type": "activate-customer"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.store.work_order_count().await, 0);
}

#[tokio::test]
async fn test_complete_work_order_activates_customer() {
    let app = setup();
    let customer = app.create_customer().await;
    let customer_id = id_of(&customer);
    let order = body_json(
        app.create_work_order(&customer_id, "activate-customer", 60)
            .await,
    )
    .await;
    let order_id = id_of(&order);

    let response = app
        .send(
            "PATCH",
            &format!("/api/v1/work-orders/{order_id}/complete"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["message"].as_str().is_some());
    assert_eq!(body["workOrder"]["status"], "done");
    assert_eq!(body["workOrder"]["customer"]["isActive"], true);
    assert_eq!(app.sink.entry_count().await, 1);

    let customer = body_json(
        app.send("GET", &format!("/api/v1/customers/{customer_id}"), None)
            .await,
    )
    .await;
    assert_eq!(customer["isActive"], true);
    assert!(customer["startDate"].is_string());
    assert!(customer["endDate"].is_null());

    let active = body_json(app.send("GET", "/api/v1/customers/active", None).await).await;
    assert_eq!(active.as_array().unwrap().len(), 1);

    let again = app
        .send(
            "PATCH",
            &format!("/api/v1/work-orders/{order_id}/complete"),
            None,
        )
        .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    assert_eq!(app.sink.entry_count().await, 1);
}

#[tokio::test]
async fn test_complete_nonexistent_work_order() {
    let app = setup();
    let response = app
        .send(
            "PATCH",
            &format!("/api/v1/work-orders/{}/complete", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_publish_failure_reports_committed_completion() {
    let app = setup();
    let customer = app.create_customer().await;
    let order = body_json(
        app.create_work_order(&id_of(&customer), "activate-customer", 60)
            .await,
    )
    .await;
    let order_id = id_of(&order);

    app.sink.set_fail_on_append(true).await;
    let response = app
        .send(
            "PATCH",
            &format!("/api/v1/work-orders/{order_id}/complete"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(response).await["error"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(error.contains("was completed"));

    let report = body_json(
        app.send(
            "GET",
            &format!("/api/v1/work-orders/{order_id}/completion"),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(report["status"], "done");
    assert_eq!(report["publishedEvents"], 0);

    app.sink.set_fail_on_append(false).await;
    let response = app
        .send(
            "POST",
            &format!("/api/v1/work-orders/{order_id}/republish"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.sink.entry_count().await, 1);
}

#[tokio::test]
async fn test_republish_new_work_order_conflicts() {
    let app = setup();
    let customer = app.create_customer().await;
    let order = body_json(
        app.create_work_order(&id_of(&customer), "activate-customer", 60)
            .await,
    )
    .await;

    let response = app
        .send(
            "POST",
            &format!("/api/v1/work-orders/{}/republish", id_of(&order)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_work_order_and_customer_orders() {
    let app = setup();
    let customer = app.create_customer().await;
    let customer_id = id_of(&customer);
    let order = body_json(
        app.create_work_order(&customer_id, "activate-customer", 60)
            .await,
    )
    .await;

    let response = app
        .send(
            "GET",
            &format!("/api/v1/work-orders/{}", id_of(&order)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["customer"]["id"], customer["id"]);

    let orders = body_json(
        app.send(
            "GET",
            &format!("/api/v1/customers/{customer_id}/work-orders"),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let missing = app
        .send(
            "GET",
            &format!("/api/v1/work-orders/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filter_work_orders() {
    let app = setup();
    let customer = app.create_customer().await;
    let customer_id = id_of(&customer);

    for (begin, end) in [
        ("2024-03-01T09:00:00Z", "2024-03-01T10:00:00Z"),
        ("2025-02-01T09:00:00Z", "2025-02-01T10:30:00Z"),
    ] {
        let response = app
            .send(
                "POST",
                "/api/v1/work-orders",
                Some(json!({
                    "customerId": customer_id,
                    "description": "Site survey",
                    "plannedDateBegin": begin,
                    "plannedDateEnd": end,
                    "type": "activate-customer"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .send(
            "GET",
            "/api/v1/work-orders?since=2024-01-01T00:00:00Z&until=2024-12-31T23:59:59Z&status=new",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let orders = body_json(response).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["plannedDateBegin"], "2024-03-01T09:00:00Z");

    let all = body_json(app.send("GET", "/api/v1/work-orders", None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let done = body_json(app.send("GET", "/api/v1/work-orders?status=done", None).await).await;
    assert!(done.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_filter_rejects_bad_parameters() {
    let app = setup();

    for uri in [
        "/api/v1/work-orders?since=2024-01-01",
        "/api/v1/work-orders?status=pending",
        "/api/v1/work-orders?since=2024-06-01T00:00:00Z&until=2024-01-01T00:00:00Z",
    ] {
        let response = app.send("GET", uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}
