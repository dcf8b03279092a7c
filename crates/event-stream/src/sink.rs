use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{EntryId, Result, StreamEntry};

/// Field → value payload of a stream entry.
pub type Fields = BTreeMap<String, String>;

/// Core trait for event sink implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Appends one entry to `stream`.
    ///
    /// Empty field maps are rejected with `EmptyEntry`. Returns the id
    /// assigned to the new entry.
    async fn append(&self, stream: &str, fields: Fields) -> Result<EntryId>;

    /// Returns every entry of `stream` in append order.
    async fn read(&self, stream: &str) -> Result<Vec<StreamEntry>>;

    /// Counts entries of `stream` whose `key` field holds a JSON object with
    /// `"id"` equal to `id`.
    ///
    /// The default scans [`read`](EventSink::read); backends that can filter
    /// server-side should override it.
    async fn count_referencing(&self, stream: &str, key: &str, id: &str) -> Result<usize> {
        Ok(self
            .read(stream)
            .await?
            .iter()
            .filter_map(|entry| entry.field(key))
            .filter(|payload| payload_id(payload).as_deref() == Some(id))
            .count())
    }
}

/// Extracts the top-level `"id"` string of a JSON object payload.
fn payload_id(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value.get("id")?.as_str().map(String::from)
}

/// Extension trait providing convenience methods for sinks.
#[async_trait]
pub trait EventSinkExt: EventSink {
    /// Appends an entry holding a single field.
    async fn append_field(&self, stream: &str, key: &str, value: String) -> Result<EntryId> {
        let mut fields = Fields::new();
        fields.insert(key.to_string(), value);
        self.append(stream, fields).await
    }

    /// Returns the values stored under `key` across a stream, oldest first.
    async fn read_field(&self, stream: &str, key: &str) -> Result<Vec<String>> {
        Ok(self
            .read(stream)
            .await?
            .into_iter()
            .filter_map(|mut entry| entry.fields.remove(key))
            .collect())
    }
}

// Blanket implementation for all EventSink implementations
impl<T: EventSink + ?Sized> EventSinkExt for T {}
