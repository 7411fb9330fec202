//! The audit run: observe, reconcile, and collect one outcome per service.
//!
//! Services are audited one at a time. A failure while listing one database
//! or while observing or evaluating one service is recorded and the run
//! moves on; only failing to list databases stops the audit.

use serde::Serialize;
use tracing::{debug, info, warn};

use svcaudit_names::InstanceName;
use svcaudit_observe::{capture, ObserveError, Observer, ServiceRef};
use svcaudit_reconcile::{reconcile, ReconcileError, ReconciliationResult, SourceMode};

/// Exit status when every service is compliant.
pub const EXIT_COMPLIANT: i32 = 0;

/// Exit status when at least one service could not be audited.
pub const EXIT_FAILED: i32 = 1;

/// Exit status when at least one service has drifted.
pub const EXIT_DRIFT: i32 = 2;

/// Result of auditing one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The service was observed and evaluated.
    Evaluated {
        preferred: Vec<InstanceName>,
        available: Vec<InstanceName>,
        running: Vec<InstanceName>,
        #[serde(flatten)]
        result: ReconciliationResult,
    },

    /// The service was skipped.
    Failed { kind: &'static str, message: String },
}

impl Outcome {
    fn from_observe_error(err: &ObserveError) -> Self {
        Self::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    fn from_reconcile_error(err: &ReconcileError) -> Self {
        let kind = if err.is_config_error() {
            "empty_preference"
        } else {
            "invalid_snapshot"
        };
        Self::Failed {
            kind,
            message: err.to_string(),
        }
    }

    /// The evaluation result, when the service was evaluated.
    pub fn result(&self) -> Option<&ReconciliationResult> {
        match self {
            Self::Evaluated { result, .. } => Some(result),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One audited service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceAudit {
    #[serde(flatten)]
    pub service: ServiceRef,
    pub outcome: Outcome,
}

/// A database whose services could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingFailure {
    pub kind: &'static str,
    pub message: String,
}

impl From<&ObserveError> for ListingFailure {
    fn from(err: &ObserveError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcomes for every service in the run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub services: Vec<ServiceAudit>,
    pub listing_failures: Vec<ListingFailure>,
}

impl AuditReport {
    /// Number of services and databases that could not be audited.
    pub fn failed(&self) -> usize {
        let services = self.services.iter().filter(|s| s.outcome.is_failed()).count();
        self.listing_failures.len() + services
    }

    /// Number of evaluated services that are not compliant.
    pub fn drifted(&self) -> usize {
        self.services
            .iter()
            .filter_map(|s| s.outcome.result())
            .filter(|r| !r.compliant)
            .count()
    }

    /// Process exit status for this report. Failures outrank drift.
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 {
            EXIT_FAILED
        } else if self.drifted() > 0 {
            EXIT_DRIFT
        } else {
            EXIT_COMPLIANT
        }
    }
}

/// Runs audits against an observer.
pub struct Auditor<'a> {
    observer: &'a dyn Observer,
    mode: SourceMode,
}

impl<'a> Auditor<'a> {
    /// Create a new auditor.
    pub fn new(observer: &'a dyn Observer, mode: SourceMode) -> Self {
        Self { observer, mode }
    }

    /// Audit every service, optionally restricted to one database.
    ///
    /// Fails only if the databases themselves cannot be enumerated.
    pub async fn run(&self, database_filter: Option<&str>) -> Result<AuditReport, ObserveError> {
        let listing = self.observer.list_services(database_filter).await?;
        info!(
            count = listing.services.len(),
            failed_databases = listing.failures.len(),
            database_filter = database_filter.unwrap_or("*"),
            "Starting audit"
        );

        let mut report = AuditReport {
            listing_failures: listing.failures.iter().map(ListingFailure::from).collect(),
            ..AuditReport::default()
        };
        for service in listing.services {
            let outcome = self.audit_service(&service).await;
            report.services.push(ServiceAudit { service, outcome });
        }

        info!(
            services = report.services.len(),
            drifted = report.drifted(),
            failed = report.failed(),
            "Audit complete"
        );
        Ok(report)
    }

    /// Audit a single service.
    pub async fn audit_service(&self, service: &ServiceRef) -> Outcome {
        let snapshot = match capture(self.observer, service).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(service = %service, error = %e, "Skipping service");
                return Outcome::from_observe_error(&e);
            }
        };

        match reconcile(
            &snapshot.desired,
            &snapshot.observed,
            &snapshot.observed,
            self.mode,
        ) {
            Ok(result) => {
                debug!(
                    service = %service,
                    compliant = result.compliant,
                    actions = result.plan.actions.len(),
                    warnings = result.plan.warnings.len(),
                    "Service evaluated"
                );
                Outcome::Evaluated {
                    preferred: snapshot.desired.preferred,
                    available: snapshot.desired.available,
                    running: snapshot.observed.running,
                    result,
                }
            }
            Err(e) => {
                warn!(service = %service, error = %e, "Service cannot be evaluated");
                Outcome::from_reconcile_error(&e)
            }
        }
    }
}
