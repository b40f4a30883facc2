use std::io;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::RawRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source was closed; no more records will arrive.
    #[error("event source closed")]
    Closed,
    /// A read failed but the source is still usable.
    #[error("event source read failed: {0}")]
    Transient(#[from] io::Error),
}

/// Stream of raw event records.
///
/// `read` is the only place a pipeline suspends. It waits as long as it
/// takes; bounding that wait is the source's business.
#[async_trait]
pub trait EventSource: Send {
    async fn read(&mut self) -> Result<RawRecord, SourceError>;

    /// Stop the source. A pending or later `read` returns `Closed`.
    fn close(&self);
}
