//! Append-only, multi-consumer event stream.
//!
//! Entries are named streams of field → value maps. The sink only reports
//! whether an append succeeded; consumer acknowledgement is out of its reach.

pub mod entry;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod sink;

pub use entry::{EntryId, StreamEntry};
pub use error::{Result, SinkError};
pub use memory::InMemoryEventSink;
pub use postgres::PostgresEventSink;
pub use sink::{EventSink, EventSinkExt, Fields};
