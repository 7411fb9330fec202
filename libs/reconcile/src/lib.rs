//! Placement reconciliation primitives.
//!
//! This library decides whether a clustered service runs where its operator
//! wants it, and if not, which corrective commands would move it there.
//! Key concepts:
//!
//! - **Desired placement**: ordered preferred instances plus ordered fallback
//!   (available) instances, from cluster configuration.
//! - **Observed placement**: the instances currently hosting the service, plus
//!   health for the preferred instances that are not.
//! - **Plan**: ordered start/relocate actions. The plan is only ever proposed;
//!   nothing here executes it.
//!
//! # Invariants
//!
//! - Evaluation is pure: the same snapshot always yields the same result
//! - Compliance is set equality; list order only affects display and
//!   tie-breaking between relocation sources
//! - A plan never targets an instance reported down, and never uses the same
//!   relocation source twice

mod compliance;
mod model;
mod synth;

use thiserror::Error;
use tracing::debug;

use svcaudit_names::{DatabaseName, ServiceName};

pub use compliance::evaluate;
pub use model::{
    Action, ActionPlan, InstanceHealth, ProbeFailure, ReconciliationResult, RelocationSource,
    ServiceDesired, ServiceObserved, Warning,
};
pub use synth::{synthesize, HealthProbe, SourceMode};

/// Reconciliation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The service has no preferred instances configured.
    #[error("service {service} in database {database} has no preferred instances")]
    EmptyPreference {
        database: DatabaseName,
        service: ServiceName,
    },

    /// Desired and observed records describe different services.
    #[error("snapshot mismatch: desired is {desired}, observed is {observed}")]
    SnapshotMismatch { desired: String, observed: String },
}

impl ReconcileError {
    /// Returns true if the error is a configuration problem with the service.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::EmptyPreference { .. })
    }
}

/// Evaluate one service and, when it has drifted, synthesize its plan.
///
/// The probe is consulted only for preferred instances that are not running
/// the service, and only when the service is up but non-compliant.
pub fn reconcile<P>(
    desired: &ServiceDesired,
    observed: &ServiceObserved,
    probe: &P,
    mode: SourceMode,
) -> Result<ReconciliationResult, ReconcileError>
where
    P: HealthProbe + ?Sized,
{
    if desired.database != observed.database || desired.service != observed.service {
        return Err(ReconcileError::SnapshotMismatch {
            desired: format!("{}/{}", desired.database, desired.service),
            observed: format!("{}/{}", observed.database, observed.service),
        });
    }

    if desired.preferred.is_empty() {
        return Err(ReconcileError::EmptyPreference {
            database: desired.database.clone(),
            service: desired.service.clone(),
        });
    }

    if evaluate(desired, observed) {
        debug!(
            database = %desired.database,
            service = %desired.service,
            "Service placement is compliant"
        );
        return Ok(ReconciliationResult::compliant());
    }

    let plan = synthesize(desired, observed, probe, mode);
    Ok(ReconciliationResult {
        compliant: false,
        plan,
    })
}
