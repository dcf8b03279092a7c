//! PostgreSQL event sink integration tests
//!
//! Run with:
//!
//! ```bash
//! cargo test -p event-stream --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use event_stream::{EventSink, EventSinkExt, Fields, PostgresEventSink, SinkError};
use serial_test::serial;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let pool = sqlx::PgPool::connect(&connection_string).await.unwrap();
            sqlx::migrate!("../../migrations").run(&pool).await.unwrap();
            pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_sink() -> PostgresEventSink {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE stream_entries")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventSink::new(pool)
}

#[tokio::test]
#[serial]
async fn append_and_read_back() {
    let sink = get_test_sink().await;

    let first = sink
        .append_field("work_orders_stream", "work_order_completed", "{}".to_string())
        .await
        .unwrap();
    let second = sink
        .append_field("work_orders_stream", "work_order_completed", "{\"a\":1}".to_string())
        .await
        .unwrap();
    assert!(second > first);

    let entries = sink.read("work_orders_stream").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, first);
    assert_eq!(entries[1].field("work_order_completed"), Some("{\"a\":1}"));
}

#[tokio::test]
#[serial]
async fn streams_are_isolated() {
    let sink = get_test_sink().await;

    sink.append_field("one", "k", "1".to_string()).await.unwrap();
    sink.append_field("two", "k", "2".to_string()).await.unwrap();

    let values = sink.read_field("two", "k").await.unwrap();
    assert_eq!(values, vec!["2".to_string()]);
    assert!(sink.read("three").await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn empty_entry_is_rejected() {
    let sink = get_test_sink().await;

    let result = sink.append("one", Fields::new()).await;
    assert!(matches!(result, Err(SinkError::EmptyEntry(_))));
}

#[tokio::test]
#[serial]
async fn count_referencing_filters_in_database() {
    let sink = get_test_sink().await;
    let key = "work_order_completed";

    for payload in [
        r#"{"id":"wo-1","customer":{"id":"c-1"}}"#,
        r#"{"id":"wo-2"}"#,
        r#"{"id":"wo-1"}"#,
        "plain text",
    ] {
        sink.append_field("work_orders_stream", key, payload.to_string())
            .await
            .unwrap();
    }
    sink.append_field("other_stream", key, r#"{"id":"wo-1"}"#.to_string())
        .await
        .unwrap();
    sink.append_field("work_orders_stream", "k", "v".to_string())
        .await
        .unwrap();

    for (id, expected) in [("wo-1", 2), ("wo-2", 1), ("c-1", 0)] {
        let count = sink
            .count_referencing("work_orders_stream", key, id)
            .await
            .unwrap();
        assert_eq!(count, expected, "{id}");
    }
}
