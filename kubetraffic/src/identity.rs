use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Label value used in place of any identity field that is not known.
pub const UNKNOWN: &str = "unknown";

/// Kubernetes workload behind an IP address. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadIdentity {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub pod: String,
}

impl WorkloadIdentity {
    pub fn new(
        namespace: impl Into<String>,
        service: impl Into<String>,
        pod: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
            pod: pod.into(),
        }
    }

    /// All three fields set to the sentinel.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, UNKNOWN)
    }

    /// Replace each empty field with the sentinel, independently.
    pub fn or_unknown(mut self) -> Self {
        for field in [&mut self.namespace, &mut self.service, &mut self.pod] {
            if field.is_empty() {
                *field = UNKNOWN.to_string();
            }
        }
        self
    }
}

/// Maps a dotted-quad IPv4 address to the workload that owns it.
///
/// Shared by both pipelines, so lookups must be safe from several tasks.
pub trait IdentityResolver: Send + Sync {
    fn lookup(&self, addr: &str) -> Option<WorkloadIdentity>;
}

/// Static address table loaded from config.
#[derive(Debug, Default)]
pub struct WorkloadTable {
    entries: HashMap<String, WorkloadIdentity>,
}

impl WorkloadTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(String, WorkloadIdentity)> for WorkloadTable {
    fn from_iter<I: IntoIterator<Item = (String, WorkloadIdentity)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IdentityResolver for WorkloadTable {
    fn lookup(&self, addr: &str) -> Option<WorkloadIdentity> {
        self.entries.get(addr).cloned()
    }
}
