//! Cluster observation for placement audits.
//!
//! The observation layer answers four questions about a cluster:
//! - **Registry**: which (database, service) pairs exist
//! - **Configuration**: where each service is supposed to run
//! - **Status**: where each service is running right now
//! - **Health**: whether a given instance is up
//!
//! Two implementations are provided: [`SrvctlObserver`], which shells out to
//! the cluster's `srvctl` tool, and [`FixtureObserver`], which serves a
//! recorded topology from memory for tests and dry runs.
//!
//! Observers return structured values only. Text parsing stays inside the
//! `srvctl` adapter.

mod error;
mod fixture;
mod snapshot;
pub mod srvctl;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use svcaudit_names::{DatabaseName, InstanceName, ServiceName};
use svcaudit_reconcile::{InstanceHealth, ServiceDesired, ServiceObserved};

pub use error::ObserveError;
pub use fixture::{Fixture, FixtureFailure, FixtureHealth, FixtureInstance, FixtureObserver, FixtureService};
pub use snapshot::{capture, Snapshot};
pub use srvctl::{SrvctlConfig, SrvctlObserver};

/// A (database, service) pair discovered in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ServiceRef {
    pub database: DatabaseName,
    pub service: ServiceName,
}

impl ServiceRef {
    pub fn new(database: DatabaseName, service: ServiceName) -> Self {
        Self { database, service }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.database, self.service)
    }
}

/// Services found in the registry.
///
/// A database whose service list cannot be read contributes no services and
/// one [`ObserveError::ServiceListUnavailable`] entry in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceListing {
    pub services: Vec<ServiceRef>,
    pub failures: Vec<ObserveError>,
}

/// Source of cluster placement data.
///
/// Every per-service call returns a complete answer or fails; observers never
/// hand back partial data.
#[async_trait]
pub trait Observer: Send + Sync {
    /// List services, optionally restricted to one database.
    ///
    /// The filter matches database names case-insensitively. Fails only when
    /// the databases themselves cannot be enumerated.
    async fn list_services(&self, database_filter: Option<&str>)
        -> Result<ServiceListing, ObserveError>;

    /// Preferred and available instances for a service.
    async fn desired(&self, service: &ServiceRef) -> Result<ServiceDesired, ObserveError>;

    /// Current placement of a service, without instance health.
    async fn observed(&self, service: &ServiceRef) -> Result<ServiceObserved, ObserveError>;

    /// Health of a single instance of a database.
    async fn probe_instance(
        &self,
        database: &DatabaseName,
        instance: &InstanceName,
    ) -> Result<InstanceHealth, ObserveError>;
}
