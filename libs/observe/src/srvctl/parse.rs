//! Parsers for `srvctl` text output.

use thiserror::Error;

use svcaudit_names::{parse_list, DatabaseName, InstanceName, NameError, ServiceName};
use svcaudit_reconcile::InstanceHealth;

const SERVICE_NAME: &str = "Service name:";
const PREFERRED_INSTANCES: &str = "Preferred instances:";
const AVAILABLE_INSTANCES: &str = "Available instances:";

/// Output did not have the expected shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A line or field required for the answer was absent.
    #[error("missing '{0}' in srvctl output")]
    Missing(&'static str),

    /// No line matched any known form.
    #[error("unrecognized srvctl output: {0}")]
    Unrecognized(String),

    /// A name in the output failed validation.
    #[error("invalid name in srvctl output: {0}")]
    InvalidName(#[from] NameError),
}

/// Placement configuration of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub preferred: Vec<InstanceName>,
    pub available: Vec<InstanceName>,
}

/// Runtime status of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    NotRunning,
    Running(Vec<InstanceName>),
}

fn lines(out: &str) -> impl Iterator<Item = &str> {
    out.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// `srvctl config database`: one database name per line.
pub fn parse_databases(out: &str) -> Result<Vec<DatabaseName>, ParseError> {
    lines(out)
        .map(|line| line.parse::<DatabaseName>().map_err(ParseError::from))
        .collect()
}

/// `srvctl config service -d <db>`: every `Service name:` line.
pub fn parse_service_names(out: &str) -> Result<Vec<ServiceName>, ParseError> {
    lines(out)
        .filter_map(|line| line.strip_prefix(SERVICE_NAME))
        .map(|name| name.parse::<ServiceName>().map_err(ParseError::from))
        .collect()
}

/// `srvctl config service -d <db> -s <svc>`.
///
/// The preferred line is required (its value may be empty); the available
/// line is optional.
pub fn parse_service_config(out: &str) -> Result<ServiceConfig, ParseError> {
    let mut preferred: Option<Vec<InstanceName>> = None;
    let mut available: Vec<InstanceName> = Vec::new();

    for line in lines(out) {
        if let Some(value) = line.strip_prefix(PREFERRED_INSTANCES) {
            preferred = Some(parse_list(value)?);
        } else if let Some(value) = line.strip_prefix(AVAILABLE_INSTANCES) {
            available = parse_list(value)?;
        }
    }

    Ok(ServiceConfig {
        preferred: preferred.ok_or(ParseError::Missing(PREFERRED_INSTANCES))?,
        available,
    })
}

/// `srvctl status service -d <db> -s <svc>`.
///
/// Recognizes `Service <svc> is running on instance(s) a,b` and
/// `Service <svc> is not running.`
pub fn parse_service_status(out: &str, service: &ServiceName) -> Result<ServiceStatus, ParseError> {
    let prefix = format!("Service {} ", service);

    for line in lines(out) {
        let Some(rest) = line.strip_prefix(&prefix) else {
            continue;
        };

        if rest.trim_end_matches('.') == "is not running" {
            return Ok(ServiceStatus::NotRunning);
        }

        if let Some(list) = rest.strip_prefix("is running on instance(s)") {
            let instances: Vec<InstanceName> = parse_list(list.trim_end_matches('.'))?;
            if instances.is_empty() {
                return Err(ParseError::Missing("running instance list"));
            }
            return Ok(ServiceStatus::Running(instances));
        }

        return Err(ParseError::Unrecognized(line.to_string()));
    }

    Err(ParseError::Unrecognized(out.trim().to_string()))
}

/// `srvctl status instance -d <db> -i <inst>`.
///
/// Recognizes `Instance <inst> is running on node <n>` and
/// `Instance <inst> is not running on node <n>`.
pub fn parse_instance_status(
    out: &str,
    instance: &InstanceName,
) -> Result<InstanceHealth, ParseError> {
    let prefix = format!("Instance {} ", instance);

    for line in lines(out) {
        let Some(rest) = line.strip_prefix(&prefix) else {
            continue;
        };

        if rest.starts_with("is not running") {
            return Ok(InstanceHealth::Down);
        }
        if rest.starts_with("is running") {
            return Ok(InstanceHealth::Up);
        }

        return Err(ParseError::Unrecognized(line.to_string()));
    }

    Err(ParseError::Unrecognized(out.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_CONFIG: &str = "\
Service name: oltp
Server pool: ORCL_oltp
Cardinality: 2
Service role: PRIMARY
Preferred instances: ORCL2,ORCL1
Available instances: ORCL4,ORCL3
";

    fn inst(s: &str) -> InstanceName {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_databases() {
        let dbs = parse_databases("ORCL\n\nDWH\n").unwrap();
        let raw: Vec<&str> = dbs.iter().map(DatabaseName::as_str).collect();
        assert_eq!(raw, vec!["ORCL", "DWH"]);
    }

    #[test]
    fn test_parse_databases_rejects_sentences() {
        let err = parse_databases("PRCD-1027 : Failed to retrieve database").unwrap_err();
        assert!(matches!(err, ParseError::InvalidName(_)));
    }

    #[test]
    fn test_parse_service_names() {
        let out = format!("{}\nService name: batch\nPreferred instances: ORCL1\n", SERVICE_CONFIG);
        let names = parse_service_names(&out).unwrap();
        let raw: Vec<&str> = names.iter().map(ServiceName::as_str).collect();
        assert_eq!(raw, vec!["oltp", "batch"]);
    }

    #[test]
    fn test_parse_service_config_keeps_order() {
        let config = parse_service_config(SERVICE_CONFIG).unwrap();
        assert_eq!(config.preferred, vec![inst("ORCL2"), inst("ORCL1")]);
        assert_eq!(config.available, vec![inst("ORCL4"), inst("ORCL3")]);
    }

    #[test]
    fn test_parse_service_config_empty_lists() {
        let config =
            parse_service_config("Preferred instances: \nAvailable instances: \n").unwrap();
        assert!(config.preferred.is_empty());
        assert!(config.available.is_empty());
    }

    #[test]
    fn test_parse_service_config_requires_preferred() {
        let err = parse_service_config("Service name: oltp\n").unwrap_err();
        assert_eq!(err, ParseError::Missing(PREFERRED_INSTANCES));
    }

    #[test]
    fn test_parse_service_status_running() {
        let service: ServiceName = "oltp".parse().unwrap();
        let status =
            parse_service_status("Service oltp is running on instance(s) ORCL3,ORCL1\n", &service)
                .unwrap();
        assert_eq!(status, ServiceStatus::Running(vec![inst("ORCL3"), inst("ORCL1")]));
    }

    #[test]
    fn test_parse_service_status_not_running() {
        let service: ServiceName = "oltp".parse().unwrap();
        let status = parse_service_status("Service oltp is not running.\n", &service).unwrap();
        assert_eq!(status, ServiceStatus::NotRunning);
    }

    #[test]
    fn test_parse_service_status_other_service_is_ambiguous() {
        let service: ServiceName = "oltp".parse().unwrap();
        let err = parse_service_status("Service batch is not running.\n", &service).unwrap_err();
        assert!(matches!(err, ParseError::Unrecognized(_)));
    }

    #[test]
    fn test_parse_service_status_garbled_list() {
        let service: ServiceName = "oltp".parse().unwrap();
        let err = parse_service_status(
            "Service oltp is running on instance(s) ORCL1 ORCL2\n",
            &service,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidName(_)));
    }

    #[test]
    fn test_parse_instance_status() {
        let instance = inst("ORCL1");
        assert_eq!(
            parse_instance_status("Instance ORCL1 is running on node rac1\n", &instance).unwrap(),
            InstanceHealth::Up
        );
        assert_eq!(
            parse_instance_status("Instance ORCL1 is not running on node rac1\n", &instance)
                .unwrap(),
            InstanceHealth::Down
        );
        assert!(parse_instance_status("", &instance).is_err());
    }
}
