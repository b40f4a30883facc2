use std::io;
use std::os::fd::AsRawFd;

use aya::maps::{MapData, RingBuf};
use async_trait::async_trait;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio_util::sync::CancellationToken;

use crate::event::RawRecord;
use crate::source::{EventSource, SourceError};

/// `EventSource` over an aya ring buffer map.
///
/// Readiness is driven by the map's epoll fd, so an idle buffer costs
/// nothing. Each `read` returns one record copied out of the buffer.
pub struct RingBufSource {
    name: String,
    ring: AsyncFd<RingBuf<MapData>>,
    closed: CancellationToken,
}

impl RingBufSource {
    pub fn new(name: impl Into<String>, ring: RingBuf<MapData>) -> io::Result<Self> {
        Ok(Self {
            name: name.into(),
            ring: register(ring)?,
            closed: CancellationToken::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle that closes this source from another task.
    pub fn closer(&self) -> CancellationToken {
        self.closed.clone()
    }
}

/// Register `inner` with the reactor for read readiness only.
fn register<T: AsRawFd>(inner: T) -> io::Result<AsyncFd<T>> {
    AsyncFd::try_with_interest(inner, Interest::READABLE).map_err(|e| e.into_parts().1)
}

#[async_trait]
impl EventSource for RingBufSource {
    async fn read(&mut self) -> Result<RawRecord, SourceError> {
        loop {
            if self.closed.is_cancelled() {
                return Err(SourceError::Closed);
            }

            let mut guard = tokio::select! {
                _ = self.closed.cancelled() => return Err(SourceError::Closed),
                guard = self.ring.readable_mut() => guard?,
            };

            if let Some(item) = guard.get_inner_mut().next() {
                return Ok(item.to_vec());
            }
            guard.clear_ready();
        }
    }

    fn close(&self) {
        self.closed.cancel();
    }
}
