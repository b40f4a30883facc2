use prometheus::{IntCounterVec, Opts, Registry};

const NAMESPACE: &str = "kubetraffic";

pub const L4_LABELS: &[&str] = &[
    "destination_namespace",
    "destination_service",
    "destination_pod",
    "process_comm",
];

pub const L7_LABELS: &[&str] = &[
    "source_ip",
    "destination_namespace",
    "destination_service",
    "destination_pod",
    "method",
    "path",
    "process_comm",
];

/// How a pipeline disposed of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Counted,
    Filtered,
    Unmapped,
    ShortRecord,
    ReadError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counted => "counted",
            Self::Filtered => "filtered",
            Self::Unmapped => "unmapped",
            Self::ShortRecord => "short_record",
            Self::ReadError => "read_error",
        }
    }
}

/// Every collector the agent exports, registered in one registry.
pub struct Metrics {
    pub registry: Registry,
    /// Outbound connections to mapped workloads.
    pub l4_connections: IntCounterVec,
    /// Inbound HTTP requests, including ones from unmapped peers.
    pub l7_requests: IntCounterVec,
    /// Per-pipeline record dispositions.
    pub pipeline_events: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let l4_connections = IntCounterVec::new(
            Opts::new(
                "connections_total",
                "Outbound TCP connections to in-cluster workloads",
            )
            .namespace(NAMESPACE)
            .subsystem("l4"),
            L4_LABELS,
        )?;
        let l7_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests observed by workload")
                .namespace(NAMESPACE)
                .subsystem("l7"),
            L7_LABELS,
        )?;
        let pipeline_events = IntCounterVec::new(
            Opts::new(
                "events_total",
                "Ring buffer records processed, by pipeline and outcome",
            )
            .namespace(NAMESPACE)
            .subsystem("pipeline"),
            &["pipeline", "outcome"],
        )?;

        registry.register(Box::new(l4_connections.clone()))?;
        registry.register(Box::new(l7_requests.clone()))?;
        registry.register(Box::new(pipeline_events.clone()))?;

        Ok(Self {
            registry,
            l4_connections,
            l7_requests,
            pipeline_events,
        })
    }

    /// Render all collectors in the Prometheus text format.
    pub fn encode(&self) -> prometheus::Result<String> {
        prometheus::TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
