//! Compliance evaluation.

use std::collections::BTreeSet;

use crate::model::{ServiceDesired, ServiceObserved};

/// Returns true iff the service runs on exactly its preferred instances.
///
/// A down service is never compliant. Otherwise this is set equality between
/// the running and preferred instances; list order is ignored.
pub fn evaluate(desired: &ServiceDesired, observed: &ServiceObserved) -> bool {
    if observed.down {
        return false;
    }

    let running: BTreeSet<_> = observed.running.iter().collect();
    let preferred: BTreeSet<_> = desired.preferred.iter().collect();
    running == preferred
}

#[cfg(test)]
mod tests {
    use super::*;
    use svcaudit_names::InstanceName;

    fn parse(raw: &[&str]) -> Vec<InstanceName> {
        raw.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn pair(preferred: &[&str], running: &[&str]) -> (ServiceDesired, ServiceObserved) {
        let desired = ServiceDesired::new(
            "ORCL".parse().unwrap(),
            "oltp".parse().unwrap(),
            parse(preferred),
            vec![],
        );
        let observed = ServiceObserved::running(
            desired.database.clone(),
            desired.service.clone(),
            parse(running),
        );
        (desired, observed)
    }

    #[test]
    fn test_same_set_different_order() {
        let (desired, observed) = pair(&["A", "B"], &["B", "A"]);
        assert!(evaluate(&desired, &observed));
    }

    #[test]
    fn test_subset_is_not_compliant() {
        let (desired, observed) = pair(&["A", "B"], &["A"]);
        assert!(!evaluate(&desired, &observed));
    }

    #[test]
    fn test_superset_is_not_compliant() {
        let (desired, observed) = pair(&["A"], &["A", "C"]);
        assert!(!evaluate(&desired, &observed));
    }

    #[test]
    fn test_down_is_not_compliant() {
        let (desired, observed) = pair(&["A"], &[]);
        assert!(observed.down);
        assert!(!evaluate(&desired, &observed));
    }
}
