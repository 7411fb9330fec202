//! Point-in-time capture of one service's placement.

use tracing::debug;

use svcaudit_reconcile::{ProbeFailure, ServiceDesired, ServiceObserved};

use crate::{ObserveError, Observer, ServiceRef};

/// Everything the reconciliation engine needs for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub desired: ServiceDesired,
    pub observed: ServiceObserved,
}

/// Capture desired and observed placement for a service.
///
/// Health is probed only for preferred instances that are not running the
/// service. Probe failures are recorded in the snapshot instead of failing
/// the capture, so the engine can report them per instance.
pub async fn capture<O>(observer: &O, service: &ServiceRef) -> Result<Snapshot, ObserveError>
where
    O: Observer + ?Sized,
{
    let desired = observer.desired(service).await?;
    let mut observed = observer.observed(service).await?;

    for candidate in observed.probe_candidates(&desired) {
        let health = observer
            .probe_instance(&service.database, candidate)
            .await
            .map_err(|e| ProbeFailure::new(e.reason()));
        debug!(service = %service, instance = %candidate, health = ?health, "Probed instance");
        observed.instance_health.insert(candidate.clone(), health);
    }

    Ok(Snapshot { desired, observed })
}
