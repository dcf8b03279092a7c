use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{EntryId, EventSink, Fields, Result, SinkError, StreamEntry};

#[derive(Debug, Default)]
struct InMemorySinkState {
    entries: Vec<StreamEntry>,
    last_id: i64,
    fail_on_append: bool,
}

/// In-memory event sink for testing and local runs.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSink {
    state: Arc<RwLock<InMemorySinkState>>,
}

impl InMemoryEventSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to refuse appends.
    pub async fn set_fail_on_append(&self, fail: bool) {
        self.state.write().await.fail_on_append = fail;
    }

    /// Returns the number of entries across all streams.
    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn append(&self, stream: &str, fields: Fields) -> Result<EntryId> {
        if fields.is_empty() {
            return Err(SinkError::EmptyEntry(stream.to_string()));
        }

        let mut state = self.state.write().await;
        if state.fail_on_append {
            return Err(SinkError::Unavailable("append refused".to_string()));
        }

        state.last_id += 1;
        let id = EntryId::new(state.last_id);
        state.entries.push(StreamEntry {
            id,
            stream: stream.to_string(),
            fields,
            appended_at: Utc::now(),
        });

        Ok(id)
    }

    async fn read(&self, stream: &str) -> Result<Vec<StreamEntry>> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.stream == stream)
            .cloned()
            .collect())
    }
}
