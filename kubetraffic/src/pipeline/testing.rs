//! In-memory collaborators for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::event::RawRecord;
use crate::identity::{IdentityResolver, WorkloadIdentity};
use crate::metrics::MetricSink;
use crate::source::{EventSource, SourceError};

/// Replays a fixed script of read results, then reports `Closed`.
pub(crate) struct ScriptedSource {
    script: VecDeque<Result<RawRecord, SourceError>>,
    reads: Arc<AtomicUsize>,
    closed: AtomicBool,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedSource {
    pub(crate) fn new(script: Vec<Result<RawRecord, SourceError>>) -> Self {
        Self {
            script: script.into(),
            reads: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
            cancel_after: None,
        }
    }

    /// Cancel `token` while serving the `n`th read.
    pub(crate) fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub(crate) fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn read(&mut self) -> Result<RawRecord, SourceError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, token)) = &self.cancel_after {
            if n == *after {
                token.cancel();
            }
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(SourceError::Closed);
        }
        self.script.pop_front().unwrap_or(Err(SourceError::Closed))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Yields records as a test pushes them, and parks in `read` in between
/// like a ring buffer does. Dropping the sender closes the source.
pub(crate) struct ChannelSource {
    rx: mpsc::UnboundedReceiver<RawRecord>,
    closed: CancellationToken,
}

impl ChannelSource {
    pub(crate) fn new() -> (mpsc::UnboundedSender<RawRecord>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            rx,
            closed: CancellationToken::new(),
        };
        (tx, source)
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn read(&mut self) -> Result<RawRecord, SourceError> {
        if self.closed.is_cancelled() {
            return Err(SourceError::Closed);
        }
        tokio::select! {
            _ = self.closed.cancelled() => Err(SourceError::Closed),
            raw = self.rx.recv() => raw.ok_or(SourceError::Closed),
        }
    }

    fn close(&self) {
        self.closed.cancel();
    }
}

/// Records every label tuple it is asked to increment.
#[derive(Default)]
pub(crate) struct RecordingSink {
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingSink {
    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, labels: &[&str]) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.iter().map(String::as_str).eq(labels.iter().copied()))
            .count()
    }
}

impl MetricSink for RecordingSink {
    fn increment(&self, labels: &[&str]) {
        self.calls
            .lock()
            .unwrap()
            .push(labels.iter().map(|l| l.to_string()).collect());
    }
}

/// Fixed address table that remembers which addresses were asked for.
#[derive(Default)]
pub(crate) struct MapResolver {
    entries: HashMap<String, WorkloadIdentity>,
    lookups: Mutex<Vec<String>>,
}

impl MapResolver {
    pub(crate) fn with(mut self, addr: &str, identity: WorkloadIdentity) -> Self {
        self.entries.insert(addr.to_string(), identity);
        self
    }

    pub(crate) fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl IdentityResolver for MapResolver {
    fn lookup(&self, addr: &str) -> Option<WorkloadIdentity> {
        self.lookups.lock().unwrap().push(addr.to_string());
        self.entries.get(addr).cloned()
    }
}
