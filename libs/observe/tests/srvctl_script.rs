//! Drive `SrvctlObserver` against a scripted stand-in for `srvctl`.

#![cfg(unix)]

use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use svcaudit_names::InstanceName;
use svcaudit_observe::{capture, ObserveError, Observer, ServiceRef, SrvctlConfig, SrvctlObserver};
use svcaudit_reconcile::{InstanceHealth, ProbeFailure};
use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
if [ "$ORACLE_HOME" != "/opt/oracle/19c" ]; then
    echo "ORACLE_HOME not set" >&2
    exit 3
fi
case "$*" in
    "config database")
        printf 'ORCL\nHR\nDWH\n' ;;
    "config service -d ORCL")
        printf 'Service name: oltp\nPreferred instances: ORCL1,ORCL2\nService name: batch\nService name: slow\n' ;;
    "config service -d HR")
        echo "PRCD-1120 : The resource for database HR could not be found."
        exit 1 ;;
    "config service -d DWH")
        printf 'Service name: etl\n' ;;
    "config service -d ORCL -s oltp")
        printf 'Service name: oltp\nPreferred instances: ORCL1,ORCL2,ORCL4\nAvailable instances: ORCL3\n' ;;
    "config service -d ORCL -s slow")
        sleep 5 ;;
    "status service -d ORCL -s oltp")
        echo "Service oltp is running on instance(s) ORCL3" ;;
    "status service -d ORCL -s batch")
        echo "PRCR-1001 : Resource ora.orcl.batch.svc does not exist"
        exit 1 ;;
    "status instance -d ORCL -i ORCL1")
        echo "Instance ORCL1 is running on node rac1" ;;
    "status instance -d ORCL -i ORCL2")
        echo "Instance ORCL2 is $ORCL2_STATE on node rac2" ;;
    *)
        echo "unexpected arguments: $*" >&2
        exit 2 ;;
esac
"#;

struct FakeSrvctl {
    _dir: TempDir,
    path: PathBuf,
}

fn fake_srvctl() -> FakeSrvctl {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("srvctl");
    std::fs::write(&path, SCRIPT).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    FakeSrvctl { _dir: dir, path }
}

fn observer(fake: &FakeSrvctl) -> SrvctlObserver {
    let mut env = BTreeMap::new();
    env.insert("ORCL2_STATE".to_string(), "not running".to_string());
    SrvctlObserver::new(SrvctlConfig {
        program: fake.path.clone(),
        oracle_home: Some(PathBuf::from("/opt/oracle/19c")),
        env,
        timeout: Duration::from_millis(500),
    })
}

fn svc(database: &str, service: &str) -> ServiceRef {
    ServiceRef::new(database.parse().unwrap(), service.parse().unwrap())
}

fn inst(s: &str) -> InstanceName {
    s.parse().unwrap()
}

#[tokio::test]
async fn lists_services_across_databases() {
    let fake = fake_srvctl();
    let observer = observer(&fake);

    let listing = observer.list_services(None).await.unwrap();
    let listed: Vec<String> = listing.services.iter().map(ToString::to_string).collect();
    assert_eq!(listed, vec!["ORCL/oltp", "ORCL/batch", "ORCL/slow", "DWH/etl"]);

    let listing = observer.list_services(Some("dwh")).await.unwrap();
    assert_eq!(listing.services, vec![svc("DWH", "etl")]);
    assert!(listing.failures.is_empty());
}

#[tokio::test]
async fn unreadable_database_does_not_hide_others() {
    let fake = fake_srvctl();
    let observer = observer(&fake);

    let listing = observer.list_services(None).await.unwrap();
    assert_eq!(listing.failures.len(), 1);
    let failure = &listing.failures[0];
    assert!(matches!(
        failure,
        ObserveError::ServiceListUnavailable { database, .. } if database.as_str() == "HR"
    ));
    assert!(!failure.is_fatal());
    assert!(failure.reason().contains("PRCD-1120"));

    // Services of the healthy databases are still audited.
    assert!(listing.services.contains(&svc("ORCL", "oltp")));
    assert!(listing.services.contains(&svc("DWH", "etl")));
    let snapshot = capture(&observer, &svc("ORCL", "oltp")).await.unwrap();
    assert_eq!(snapshot.observed.running, vec![inst("ORCL3")]);
}

#[tokio::test]
async fn captures_snapshot_with_probes() {
    let fake = fake_srvctl();
    let observer = observer(&fake);

    let snapshot = capture(&observer, &svc("ORCL", "oltp")).await.unwrap();
    assert_eq!(
        snapshot.desired.preferred,
        vec![inst("ORCL1"), inst("ORCL2"), inst("ORCL4")]
    );
    assert_eq!(snapshot.desired.available, vec![inst("ORCL3")]);
    assert_eq!(snapshot.observed.running, vec![inst("ORCL3")]);
    assert!(!snapshot.observed.down);

    let health = &snapshot.observed.instance_health;
    assert_eq!(health[&inst("ORCL1")], Ok(InstanceHealth::Up));
    assert_eq!(health[&inst("ORCL2")], Ok(InstanceHealth::Down));
    // ORCL4 is unknown to the script, so srvctl exits non-zero.
    assert!(matches!(health[&inst("ORCL4")], Err(ProbeFailure { .. })));
}

#[tokio::test]
async fn failed_status_is_scoped_to_the_service() {
    let fake = fake_srvctl();
    let observer = observer(&fake);

    let err = observer.observed(&svc("ORCL", "batch")).await.unwrap_err();
    assert!(err.is_status_unavailable());
    assert!(!err.is_fatal());
    assert!(err.reason().contains("PRCR-1001"));
}

#[tokio::test]
async fn slow_command_times_out() {
    let fake = fake_srvctl();
    let observer = observer(&fake);

    let err = observer.desired(&svc("ORCL", "slow")).await.unwrap_err();
    assert_eq!(err.kind(), "config_unavailable");
    assert!(err.reason().contains("timed out"));
}

#[tokio::test]
async fn missing_oracle_home_fails_registry() {
    let fake = fake_srvctl();
    let observer = SrvctlObserver::new(SrvctlConfig {
        program: fake.path.clone(),
        ..SrvctlConfig::default()
    });

    let err = observer.list_services(None).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(err.reason().contains("ORACLE_HOME not set"));
}
