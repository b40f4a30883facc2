//! Read → decode → filter → enrich → emit loops, one per event kind.
//!
//! A [`Pipeline`] owns its event source and drives a [`Handler`] that knows
//! how to decode and dispose of one record kind. The loop never fails: read
//! errors and undecodable records are logged, counted and skipped. It stops
//! when its cancellation token fires (checked before each read) or when the
//! source reports that it is closed.

pub mod connect;
pub mod http;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use log::{info, warn, Level};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event::DecodeError;
use crate::metrics::{MetricSink, Outcome};
use crate::source::{EventSource, SourceError};

pub use connect::ConnectHandler;
pub use http::HttpHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Stopped(StopReason),
}

/// What a handler did with a successfully decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Counted,
    Filtered,
    Unmapped,
}

impl Decision {
    /// Level at which handlers log this decision. Only unmapped
    /// destinations show at the default `info` filter.
    pub fn level(self) -> Level {
        match self {
            Decision::Unmapped => Level::Info,
            Decision::Counted | Decision::Filtered => Level::Debug,
        }
    }
}

impl From<Decision> for Outcome {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Counted => Outcome::Counted,
            Decision::Filtered => Outcome::Filtered,
            Decision::Unmapped => Outcome::Unmapped,
        }
    }
}

/// Per-kind processing of one raw record.
pub trait Handler: Send + Sync {
    /// Short tag used in log lines and as the `pipeline` label.
    fn tag(&self) -> &'static str;

    /// Log the filter configuration once at startup.
    fn log_config(&self);

    fn handle(&self, raw: &[u8]) -> Result<Decision, DecodeError>;
}

pub struct Pipeline<S, H> {
    source: S,
    handler: H,
    outcomes: Arc<dyn MetricSink>,
    state: PipelineState,
}

impl<S: EventSource, H: Handler> Pipeline<S, H> {
    /// `outcomes` receives one `(pipeline, outcome)` increment per record.
    pub fn new(source: S, handler: H, outcomes: Arc<dyn MetricSink>) -> Self {
        Self {
            source,
            handler,
            outcomes,
            state: PipelineState::Running,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run until cancelled or until the source closes, then close the
    /// source.
    ///
    /// Cancellation is only observed between records; a record already
    /// read is processed to completion first.
    pub async fn run(&mut self, cancel: &CancellationToken) -> StopReason {
        let tag = self.handler.tag();
        info!("[{tag}] handler started; waiting for events");
        self.handler.log_config();

        let reason = loop {
            if cancel.is_cancelled() {
                info!("[{tag}] handler stopped");
                break StopReason::Cancelled;
            }

            let raw = match self.source.read().await {
                Ok(raw) => raw,
                Err(SourceError::Closed) => {
                    info!("[{tag}] ringbuf reader closed; exiting");
                    break StopReason::Closed;
                }
                Err(e) => {
                    warn!("[{tag}] ringbuf read error: {e}");
                    self.record(Outcome::ReadError);
                    continue;
                }
            };

            match self.handler.handle(&raw) {
                Ok(decision) => self.record(decision.into()),
                Err(e) => {
                    warn!("[{tag}] decode error: {e}");
                    self.record(Outcome::ShortRecord);
                }
            }
        };

        self.source.close();
        self.state = PipelineState::Stopped(reason);
        reason
    }

    fn record(&self, outcome: Outcome) {
        self.outcomes
            .increment(&[self.handler.tag(), outcome.as_str()]);
    }
}

impl<S, H> Pipeline<S, H>
where
    S: EventSource + 'static,
    H: Handler + 'static,
{
    /// Run on its own task with its own token. The task yields the final
    /// state.
    pub fn spawn(mut self, cancel: CancellationToken) -> JoinHandle<PipelineState> {
        tokio::spawn(async move {
            self.run(&cancel).await;
            self.state()
        })
    }
}
