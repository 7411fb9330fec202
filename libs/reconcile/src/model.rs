//! Placement snapshots and reconciliation outputs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use svcaudit_names::{join_list, DatabaseName, InstanceName, ServiceName};

/// Health of a single instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceHealth {
    Up,
    Down,
}

/// Reason a health probe could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ProbeFailure {
    pub reason: String,
}

impl ProbeFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Operator-declared placement for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDesired {
    pub database: DatabaseName,
    pub service: ServiceName,

    /// Priority order, first is highest. Kept verbatim for display.
    pub preferred: Vec<InstanceName>,

    /// Fallback instances, also in priority order. May be empty.
    pub available: Vec<InstanceName>,
}

impl ServiceDesired {
    pub fn new(
        database: DatabaseName,
        service: ServiceName,
        preferred: Vec<InstanceName>,
        available: Vec<InstanceName>,
    ) -> Self {
        Self {
            database,
            service,
            preferred,
            available,
        }
    }
}

/// Runtime placement captured for one service.
///
/// `instance_health` only holds entries for the instances the engine will
/// ask about: preferred instances that are not running the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceObserved {
    pub database: DatabaseName,
    pub service: ServiceName,
    pub down: bool,

    /// Instances hosting the service, in the order the cluster reported them.
    pub running: Vec<InstanceName>,

    pub instance_health: BTreeMap<InstanceName, Result<InstanceHealth, ProbeFailure>>,
}

impl ServiceObserved {
    /// A service with no running instances.
    pub fn down(database: DatabaseName, service: ServiceName) -> Self {
        Self {
            database,
            service,
            down: true,
            running: Vec::new(),
            instance_health: BTreeMap::new(),
        }
    }

    /// A service running on the given instances.
    ///
    /// An empty list is the same as [`ServiceObserved::down`].
    pub fn running(database: DatabaseName, service: ServiceName, running: Vec<InstanceName>) -> Self {
        Self {
            database,
            service,
            down: running.is_empty(),
            running,
            instance_health: BTreeMap::new(),
        }
    }

    /// Record a probe result for an instance.
    pub fn with_health(
        mut self,
        instance: InstanceName,
        health: Result<InstanceHealth, ProbeFailure>,
    ) -> Self {
        self.instance_health.insert(instance, health);
        self
    }

    /// Preferred instances not currently running the service.
    ///
    /// These are exactly the instances whose health the synthesizer may need.
    /// Empty when the service is down, since a down service is started
    /// without per-instance targeting.
    pub fn probe_candidates<'a>(&self, desired: &'a ServiceDesired) -> Vec<&'a InstanceName> {
        if self.down {
            return Vec::new();
        }

        desired
            .preferred
            .iter()
            .filter(|p| !self.running.contains(p))
            .collect()
    }
}

/// Where a relocation moves the service from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationSource {
    /// A single available instance currently hosting the service.
    Instance(InstanceName),

    /// The whole running list, handed to one combined relocate command.
    RunningList(Vec<InstanceName>),
}

impl fmt::Display for RelocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(instance) => write!(f, "{}", instance),
            Self::RunningList(instances) => f.write_str(&join_list(instances)),
        }
    }
}

impl Serialize for RelocationSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A corrective action. Proposed, never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Start the service on its preferred set.
    StartService,

    /// Start the service directly on one preferred instance.
    StartOnInstance { target: InstanceName },

    /// Move the service from a fallback instance to a preferred one.
    RelocateService {
        source: RelocationSource,
        target: InstanceName,
    },
}

impl Action {
    /// The instance this action places the service on, if any.
    pub fn target(&self) -> Option<&InstanceName> {
        match self {
            Self::StartService => None,
            Self::StartOnInstance { target } | Self::RelocateService { target, .. } => Some(target),
        }
    }

    /// The relocation source, for relocate actions.
    pub fn source(&self) -> Option<&RelocationSource> {
        match self {
            Self::RelocateService { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Why a preferred instance got no action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    /// The preferred instance is down.
    TargetDown { target: InstanceName },

    /// The preferred instance's health could not be determined.
    ProbeFailed { target: InstanceName, reason: String },
}

impl Warning {
    pub fn target(&self) -> &InstanceName {
        match self {
            Self::TargetDown { target } | Self::ProbeFailed { target, .. } => target,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetDown { target } => write!(
                f,
                "instance {} is down; cannot start or relocate the service there",
                target
            ),
            Self::ProbeFailed { target, reason } => write!(
                f,
                "health of instance {} is unknown ({}); no action proposed for it",
                target, reason
            ),
        }
    }
}

/// Ordered actions plus the warnings explaining skipped targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionPlan {
    pub actions: Vec<Action>,
    pub warnings: Vec<Warning>,
}

impl ActionPlan {
    /// True when there is nothing to run. Warnings may still be present.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }
}

/// Verdict and plan for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub compliant: bool,
    pub plan: ActionPlan,
}

impl ReconciliationResult {
    pub fn compliant() -> Self {
        Self {
            compliant: true,
            plan: ActionPlan::default(),
        }
    }
}
