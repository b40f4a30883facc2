use std::sync::Arc;

use log::{info, log};

use super::{Decision, Handler};
use crate::event::{decode_connection_event, DecodeError};
use crate::filter::ExclusionFilter;
use crate::identity::IdentityResolver;
use crate::metrics::MetricSink;

/// Log tag and `pipeline` label value for this handler.
pub const TAG: &str = "L4";

/// L4 handler: counts outbound connections per destination workload.
///
/// Connections whose destination does not resolve to a workload are not
/// counted at all.
pub struct ConnectHandler {
    filter: Arc<ExclusionFilter>,
    resolver: Arc<dyn IdentityResolver>,
    counter: Arc<dyn MetricSink>,
}

impl ConnectHandler {
    /// `counter` takes `(namespace, service, pod, comm)`.
    pub fn new(
        filter: Arc<ExclusionFilter>,
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

impl Handler for ConnectHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn log_config(&self) {
        let prefixes = self.filter.prefixes();
        info!("[L4] excludeComms={prefixes:?} (count={})", prefixes.len());
    }

    fn handle(&self, raw: &[u8]) -> Result<Decision, DecodeError> {
        let event = decode_connection_event(raw)?;
        let dest = event.destination.to_string();
        let comm = event.comm.as_str();

        if let Some(matched) = self.filter.should_exclude(comm) {
            log!(
                Decision::Filtered.level(),
                "[L4][FILTERED] dest={dest} comm={comm} matched={matched}"
            );
            return Ok(Decision::Filtered);
        }

        let Some(identity) = self.resolver.lookup(&dest) else {
            log!(
                Decision::Unmapped.level(),
                "[L4][UNMAPPED] dest={dest} comm={comm}"
            );
            return Ok(Decision::Unmapped);
        };
        let identity = identity.or_unknown();

        self.counter.increment(&[
            identity.namespace.as_str(),
            identity.service.as_str(),
            identity.pod.as_str(),
            comm,
        ]);
        log!(
            Decision::Counted.level(),
            "[L4][COUNTED] dest={dest} ns={} svc={} pod={} comm={comm}",
            identity.namespace, identity.service, identity.pod
        );
        Ok(Decision::Counted)
    }
}
