//! Corrective action synthesis.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use svcaudit_names::InstanceName;

use crate::model::{
    Action, ActionPlan, InstanceHealth, ProbeFailure, RelocationSource, ServiceDesired,
    ServiceObserved, Warning,
};

/// Health lookup for candidate relocation targets.
///
/// Injected so the synthesizer never reaches out to the cluster itself.
pub trait HealthProbe {
    fn probe(&self, instance: &InstanceName) -> Result<InstanceHealth, ProbeFailure>;
}

impl<F> HealthProbe for F
where
    F: Fn(&InstanceName) -> Result<InstanceHealth, ProbeFailure>,
{
    fn probe(&self, instance: &InstanceName) -> Result<InstanceHealth, ProbeFailure> {
        self(instance)
    }
}

/// A captured snapshot answers from its recorded health map.
impl HealthProbe for ServiceObserved {
    fn probe(&self, instance: &InstanceName) -> Result<InstanceHealth, ProbeFailure> {
        match self.instance_health.get(instance) {
            Some(result) => result.clone(),
            None => Err(ProbeFailure::new(format!(
                "health of {} was not captured",
                instance
            ))),
        }
    }
}

/// How the relocation source is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Each relocation moves the service off one available instance.
    #[default]
    Instance,

    /// A single relocation hands over the whole running list at once.
    RunningList,
}

/// Build the corrective plan for a non-compliant service.
///
/// A down service gets exactly `[StartService]`. Otherwise each preferred
/// instance not yet running the service is probed in priority order:
/// down or unprobeable targets produce a warning, up targets get a relocation
/// from a running available instance when one is left, else a direct start.
///
/// Called on a compliant snapshot this returns an empty plan.
pub fn synthesize<P>(
    desired: &ServiceDesired,
    observed: &ServiceObserved,
    probe: &P,
    mode: SourceMode,
) -> ActionPlan
where
    P: HealthProbe + ?Sized,
{
    let mut plan = ActionPlan::default();

    if observed.down {
        debug!(
            database = %desired.database,
            service = %desired.service,
            "Service is down, proposing a full start"
        );
        plan.actions.push(Action::StartService);
        return plan;
    }

    let running: BTreeSet<&InstanceName> = observed.running.iter().collect();
    let mut used_sources: BTreeSet<&InstanceName> = BTreeSet::new();
    let mut running_list_consumed = false;

    for target in &desired.preferred {
        if running.contains(target) {
            continue;
        }

        match probe.probe(target) {
            Ok(InstanceHealth::Up) => {}
            Ok(InstanceHealth::Down) => {
                debug!(service = %desired.service, target = %target, "Preferred instance is down");
                plan.warnings.push(Warning::TargetDown {
                    target: target.clone(),
                });
                continue;
            }
            Err(failure) => {
                debug!(
                    service = %desired.service,
                    target = %target,
                    reason = %failure,
                    "Preferred instance could not be probed"
                );
                plan.warnings.push(Warning::ProbeFailed {
                    target: target.clone(),
                    reason: failure.reason,
                });
                continue;
            }
        }

        let source = match mode {
            SourceMode::Instance => {
                // Whole reverse scan; the last hit wins.
                let found = desired
                    .available
                    .iter()
                    .rev()
                    .filter(|a| running.contains(a) && !used_sources.contains(a))
                    .last();
                found.map(|a| {
                    used_sources.insert(a);
                    RelocationSource::Instance(a.clone())
                })
            }
            SourceMode::RunningList => {
                let any_available = desired.available.iter().any(|a| running.contains(a));
                if any_available && !running_list_consumed {
                    running_list_consumed = true;
                    Some(RelocationSource::RunningList(observed.running.clone()))
                } else {
                    None
                }
            }
        };

        let action = match source {
            Some(source) => Action::RelocateService {
                source,
                target: target.clone(),
            },
            None => Action::StartOnInstance {
                target: target.clone(),
            },
        };
        debug!(service = %desired.service, action = ?action, "Proposed action");
        plan.actions.push(action);
    }

    plan
}
