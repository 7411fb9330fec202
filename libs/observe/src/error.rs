//! Observation errors.

use thiserror::Error;

use svcaudit_names::{DatabaseName, InstanceName};

use crate::ServiceRef;

/// Acquisition failures from the cluster.
///
/// Only [`ObserveError::RegistryUnavailable`] stops an audit; every other
/// variant is scoped to one database, one service, or one instance probe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// The service list could not be produced.
    #[error("cannot list services: {reason}")]
    RegistryUnavailable { reason: String },

    /// The services of one database could not be listed.
    #[error("cannot list services of database {database}: {reason}")]
    ServiceListUnavailable {
        database: DatabaseName,
        reason: String,
    },

    /// Preferred/available instances could not be retrieved.
    #[error("configuration unavailable for {service}: {reason}")]
    ConfigUnavailable { service: ServiceRef, reason: String },

    /// Runtime status could not be retrieved.
    #[error("status unavailable for {service}: {reason}")]
    StatusUnavailable { service: ServiceRef, reason: String },

    /// Status was retrieved but could not be understood.
    #[error("ambiguous status for {service}: {reason}")]
    AmbiguousObservation { service: ServiceRef, reason: String },

    /// Instance health could not be determined.
    #[error("health probe failed for instance {instance} of {database}: {reason}")]
    ProbeFailed {
        database: DatabaseName,
        instance: InstanceName,
        reason: String,
    },
}

impl ObserveError {
    /// Returns true if the whole audit must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RegistryUnavailable { .. })
    }

    /// Returns true if the failure means runtime status is missing.
    ///
    /// Unparsable status counts as missing status.
    pub fn is_status_unavailable(&self) -> bool {
        matches!(
            self,
            Self::StatusUnavailable { .. } | Self::AmbiguousObservation { .. }
        )
    }

    /// Stable identifier for the failure class, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegistryUnavailable { .. } => "registry_unavailable",
            Self::ServiceListUnavailable { .. } => "service_list_unavailable",
            Self::ConfigUnavailable { .. } => "config_unavailable",
            Self::StatusUnavailable { .. } | Self::AmbiguousObservation { .. } => {
                "status_unavailable"
            }
            Self::ProbeFailed { .. } => "probe_failed",
        }
    }

    /// The underlying reason without the variant prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::RegistryUnavailable { reason }
            | Self::ServiceListUnavailable { reason, .. }
            | Self::ConfigUnavailable { reason, .. }
            | Self::StatusUnavailable { reason, .. }
            | Self::AmbiguousObservation { reason, .. }
            | Self::ProbeFailed { reason, .. } => reason,
        }
    }
}
