use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{EntryId, EventSink, Fields, Result, SinkError, StreamEntry};

/// PostgreSQL-backed event sink.
///
/// Entries live in the append-only `stream_entries` table created by the
/// workspace migrations; rows are never updated or deleted by this type.
#[derive(Clone)]
pub struct PostgresEventSink {
    pool: PgPool,
}

impl PostgresEventSink {
    /// Creates a new PostgreSQL event sink.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: PgRow) -> Result<StreamEntry> {
        let fields_json: serde_json::Value = row.try_get("fields")?;

        Ok(StreamEntry {
            id: EntryId::new(row.try_get("id")?),
            stream: row.try_get("stream")?,
            fields: serde_json::from_value(fields_json)?,
            appended_at: row.try_get("appended_at")?,
        })
    }
}

#[async_trait]
impl EventSink for PostgresEventSink {
    #[tracing::instrument(skip(self, fields))]
    async fn append(&self, stream: &str, fields: Fields) -> Result<EntryId> {
        if fields.is_empty() {
            return Err(SinkError::EmptyEntry(stream.to_string()));
        }

        let fields_json = serde_json::to_value(&fields)?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO stream_entries (stream, fields)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(stream)
        .bind(fields_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(EntryId::new(id))
    }

    async fn read(&self, stream: &str) -> Result<Vec<StreamEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, stream, fields, appended_at
            FROM stream_entries
            WHERE stream = $1
            ORDER BY id ASC
            "#,
        )
        .bind(stream)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn count_referencing(&self, stream: &str, key: &str, id: &str) -> Result<usize> {
        // The CASE keeps non-object values away from the jsonb cast.
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM stream_entries
            WHERE stream = $1
              AND fields ? $2
              AND CASE
                    WHEN fields->>$2 LIKE '{%' THEN (fields->>$2)::jsonb->>'id'
                  END = $3
            "#,
        )
        .bind(stream)
        .bind(key)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as usize)
    }
}
