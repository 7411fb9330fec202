//! In-memory observer for tests and dry runs.
//!
//! A fixture is a recorded topology: services with their desired and running
//! placement, instance health, and optional injected failures. It can be
//! built in code or loaded from JSON.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use svcaudit_names::{DatabaseName, InstanceName, ServiceName};
use svcaudit_reconcile::{InstanceHealth, ServiceDesired, ServiceObserved};

use crate::{ObserveError, Observer, ServiceListing, ServiceRef};

/// Failure to inject for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureFailure {
    Config,
    Status,
    Ambiguous,
}

/// Recorded health of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureHealth {
    Up,
    Down,
    Unreachable,
}

/// One recorded service.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureService {
    pub database: DatabaseName,
    pub service: ServiceName,
    pub preferred: Vec<InstanceName>,
    #[serde(default)]
    pub available: Vec<InstanceName>,
    /// Running instances; empty means the service is down.
    #[serde(default)]
    pub running: Vec<InstanceName>,
    #[serde(default)]
    pub fail: Option<FixtureFailure>,
}

/// One recorded instance.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureInstance {
    pub database: DatabaseName,
    pub instance: InstanceName,
    pub health: FixtureHealth,
}

/// A recorded topology.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub services: Vec<FixtureService>,
    #[serde(default)]
    pub instances: Vec<FixtureInstance>,
    /// Databases whose service list cannot be read.
    #[serde(default)]
    pub unlisted: Vec<DatabaseName>,
}

impl Fixture {
    /// Add a service to the fixture.
    pub fn service(mut self, service: FixtureService) -> Self {
        self.services.push(service);
        self
    }

    /// Add an instance health record to the fixture.
    ///
    /// Panics on invalid names; intended for tests.
    pub fn instance(mut self, database: &str, instance: &str, health: FixtureHealth) -> Self {
        self.instances.push(FixtureInstance {
            database: database.parse().expect("valid database name"),
            instance: instance.parse().expect("valid instance name"),
            health,
        });
        self
    }

    /// Make listing the services of a database fail.
    ///
    /// Panics on an invalid name; intended for tests.
    pub fn unlisted(mut self, database: &str) -> Self {
        self.unlisted.push(database.parse().expect("valid database name"));
        self
    }
}

impl FixtureService {
    /// Build a service record from raw names.
    ///
    /// Panics on invalid names; intended for tests.
    pub fn new(database: &str, service: &str, preferred: &[&str], available: &[&str]) -> Self {
        Self {
            database: database.parse().expect("valid database name"),
            service: service.parse().expect("valid service name"),
            preferred: names(preferred),
            available: names(available),
            running: Vec::new(),
            fail: None,
        }
    }

    /// Set the running instances.
    pub fn running(mut self, running: &[&str]) -> Self {
        self.running = names(running);
        self
    }

    /// Inject a failure.
    pub fn failing(mut self, failure: FixtureFailure) -> Self {
        self.fail = Some(failure);
        self
    }

    fn service_ref(&self) -> ServiceRef {
        ServiceRef::new(self.database.clone(), self.service.clone())
    }
}

fn names(raw: &[&str]) -> Vec<InstanceName> {
    raw.iter()
        .map(|s| s.parse().expect("valid instance name"))
        .collect()
}

/// Observer serving a [`Fixture`].
pub struct FixtureObserver {
    fixture: Fixture,

    /// Instances probed so far, in call order.
    probes: Mutex<Vec<InstanceName>>,
}

impl FixtureObserver {
    /// Create a new fixture observer.
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            probes: Mutex::new(Vec::new()),
        }
    }

    /// Load a fixture from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Instances probed so far, in call order.
    pub fn probes(&self) -> Vec<InstanceName> {
        self.probes
            .lock()
            .map(|probes| probes.clone())
            .unwrap_or_default()
    }

    fn find(&self, service: &ServiceRef) -> Option<&FixtureService> {
        self.fixture
            .services
            .iter()
            .find(|s| s.database == service.database && s.service == service.service)
    }
}

#[async_trait]
impl Observer for FixtureObserver {
    async fn list_services(
        &self,
        database_filter: Option<&str>,
    ) -> Result<ServiceListing, ObserveError> {
        let selected =
            |database: &DatabaseName| database_filter.is_none_or(|f| database.matches_filter(f));

        let services = self
            .fixture
            .services
            .iter()
            .filter(|s| selected(&s.database) && !self.fixture.unlisted.contains(&s.database))
            .map(FixtureService::service_ref)
            .collect();

        let failures = self
            .fixture
            .unlisted
            .iter()
            .filter(|&database| selected(database))
            .map(|database| ObserveError::ServiceListUnavailable {
                database: database.clone(),
                reason: "service list query failed".to_string(),
            })
            .collect();

        Ok(ServiceListing { services, failures })
    }

    async fn desired(&self, service: &ServiceRef) -> Result<ServiceDesired, ObserveError> {
        let record = self
            .find(service)
            .filter(|s| s.fail != Some(FixtureFailure::Config))
            .ok_or_else(|| ObserveError::ConfigUnavailable {
                service: service.clone(),
                reason: "no configuration recorded".to_string(),
            })?;

        Ok(ServiceDesired::new(
            record.database.clone(),
            record.service.clone(),
            record.preferred.clone(),
            record.available.clone(),
        ))
    }

    async fn observed(&self, service: &ServiceRef) -> Result<ServiceObserved, ObserveError> {
        let record = self
            .find(service)
            .ok_or_else(|| ObserveError::StatusUnavailable {
                service: service.clone(),
                reason: "no status recorded".to_string(),
            })?;

        match record.fail {
            Some(FixtureFailure::Status) => Err(ObserveError::StatusUnavailable {
                service: service.clone(),
                reason: "status query failed".to_string(),
            }),
            Some(FixtureFailure::Ambiguous) => Err(ObserveError::AmbiguousObservation {
                service: service.clone(),
                reason: "unrecognized status output".to_string(),
            }),
            _ => Ok(ServiceObserved::running(
                record.database.clone(),
                record.service.clone(),
                record.running.clone(),
            )),
        }
    }

    async fn probe_instance(
        &self,
        database: &DatabaseName,
        instance: &InstanceName,
    ) -> Result<InstanceHealth, ObserveError> {
        if let Ok(mut probes) = self.probes.lock() {
            probes.push(instance.clone());
        }
        debug!(database = %database, instance = %instance, "[FIXTURE] Probing instance");

        let probe_error = |reason: &str| ObserveError::ProbeFailed {
            database: database.clone(),
            instance: instance.clone(),
            reason: reason.to_string(),
        };

        let record = self
            .fixture
            .instances
            .iter()
            .find(|i| &i.database == database && &i.instance == instance)
            .ok_or_else(|| probe_error("instance not recorded"))?;

        match record.health {
            FixtureHealth::Up => Ok(InstanceHealth::Up),
            FixtureHealth::Down => Ok(InstanceHealth::Down),
            FixtureHealth::Unreachable => Err(probe_error("instance unreachable")),
        }
    }
}
