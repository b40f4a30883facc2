use std::sync::Arc;

use log::{info, log};

use super::{Decision, Handler};
use crate::event::{decode_http_event, DecodeError};
use crate::filter::HealthCheckFilter;
use crate::identity::{IdentityResolver, WorkloadIdentity};
use crate::metrics::MetricSink;

/// Log tag and `pipeline` label value for this handler.
pub const TAG: &str = "L7";

/// L7 handler: counts HTTP requests per client and destination workload.
///
/// Unlike the L4 handler, a request whose destination cannot be resolved
/// is still counted, under `unknown` identity labels.
pub struct HttpHandler {
    filter: Arc<HealthCheckFilter>,
    resolver: Arc<dyn IdentityResolver>,
    counter: Arc<dyn MetricSink>,
}

impl HttpHandler {
    /// `counter` takes `(source_ip, namespace, service, pod, method, path, comm)`.
    pub fn new(
        filter: Arc<HealthCheckFilter>,
        resolver: Arc<dyn IdentityResolver>,
        counter: Arc<dyn MetricSink>,
    ) -> Self {
        Self {
            filter,
            resolver,
            counter,
        }
    }
}

impl Handler for HttpHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn log_config(&self) {
        if self.filter.is_enabled() {
            info!(
                "[L7] health check filter enabled, patterns={:?}",
                self.filter.patterns()
            );
        } else {
            info!("[L7] health check filter disabled");
        }
    }

    fn handle(&self, raw: &[u8]) -> Result<Decision, DecodeError> {
        let event = decode_http_event(raw)?;
        let src = event.source_ip().to_string();
        let (method, path, comm) = (&event.method, &event.path, &event.comm);

        if self.filter.is_health_check(path) {
            log!(
                Decision::Filtered.level(),
                "[L7][HEALTHCHECK] src={src} method={method} path={path} comm={comm} (excluded)"
            );
            return Ok(Decision::Filtered);
        }

        // The probe leaves daddr at zero when it cannot see the local
        // address; a successful lookup replaces the fields as-is.
        let mut identity = WorkloadIdentity::unknown();
        if event.daddr != 0 {
            if let Some(found) = self.resolver.lookup(&event.destination_ip().to_string()) {
                identity = found;
            }
        }

        self.counter.increment(&[
            src.as_str(),
            identity.namespace.as_str(),
            identity.service.as_str(),
            identity.pod.as_str(),
            method.as_str(),
            path.as_str(),
            comm.as_str(),
        ]);
        log!(
            Decision::Counted.level(),
            "[L7][COUNTED] {src}:{} -> {}:{} ns={} svc={} pod={} {method} {path} {comm}/{}",
            event.sport,
            event.destination_ip(),
            event.dport,
            identity.namespace,
            identity.service,
            identity.pod,
            event.pid
        );
        Ok(Decision::Counted)
    }
}
