//! Observer backed by the cluster's `srvctl` tool.
//!
//! Each query runs one `srvctl` invocation under a timeout and parses its
//! output into structured values:
//! - `srvctl config database`: database names
//! - `srvctl config service -d <db>`: service names
//! - `srvctl config service -d <db> -s <svc>`: preferred/available instances
//! - `srvctl status service -d <db> -s <svc>`: running instances
//! - `srvctl status instance -d <db> -i <inst>`: instance health

mod parse;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use svcaudit_names::{DatabaseName, InstanceName, ServiceName};
use svcaudit_reconcile::{InstanceHealth, ServiceDesired, ServiceObserved};

use crate::{ObserveError, Observer, ServiceListing, ServiceRef};

pub use parse::{
    parse_databases, parse_instance_status, parse_service_config, parse_service_names,
    parse_service_status, ParseError, ServiceConfig, ServiceStatus,
};

/// Default timeout for a single `srvctl` invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment and location of the `srvctl` tool.
///
/// Everything the child process needs is carried here; the observer does not
/// consult its own process environment.
#[derive(Debug, Clone)]
pub struct SrvctlConfig {
    /// Program to run.
    pub program: PathBuf,

    /// Exported as `ORACLE_HOME` to every invocation. When unset, an inherited
    /// `ORACLE_HOME` is removed.
    pub oracle_home: Option<PathBuf>,

    /// Extra environment variables for every invocation.
    pub env: BTreeMap<String, String>,

    /// Per-invocation timeout.
    pub timeout: Duration,
}

impl Default for SrvctlConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("srvctl"),
            oracle_home: None,
            env: BTreeMap::new(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl SrvctlConfig {
    /// Command that starts a service on its preferred instances.
    pub fn start_command(&self, service: &ServiceRef) -> String {
        format!(
            "{} start service -d {} -s {}",
            self.program.display(),
            service.database,
            service.service
        )
    }

    /// Command prefix for relocating a service; callers append `-i`/`-t`.
    pub fn relocate_command(&self, service: &ServiceRef) -> String {
        format!(
            "{} relocate service -d {} -s {}",
            self.program.display(),
            service.database,
            service.service
        )
    }
}

/// Failure running a single `srvctl` invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program did not finish in time.
    #[error("srvctl {args} timed out after {elapsed:?}")]
    Timeout { args: String, elapsed: Duration },

    /// The program exited unsuccessfully.
    #[error("srvctl {args} failed ({status}): {stderr}")]
    Failed {
        args: String,
        status: String,
        stderr: String,
    },
}

/// Observer that shells out to `srvctl`.
pub struct SrvctlObserver {
    config: SrvctlConfig,
}

impl SrvctlObserver {
    /// Create a new observer.
    pub fn new(config: SrvctlConfig) -> Self {
        Self { config }
    }

    /// Run `srvctl` with the given arguments and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, CommandError> {
        let joined = args.join(" ");
        debug!(program = %self.config.program.display(), args = %joined, "Running srvctl");

        let mut cmd = Command::new(&self.config.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match &self.config.oracle_home {
            Some(home) => cmd.env("ORACLE_HOME", home),
            None => cmd.env_remove("ORACLE_HOME"),
        };
        cmd.envs(&self.config.env);

        let output = match tokio::time::timeout(self.config.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                program: self.config.program.display().to_string(),
                source,
            })?,
            Err(_) => {
                return Err(CommandError::Timeout {
                    args: joined,
                    elapsed: self.config.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            // srvctl reports most problems on stdout.
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(CommandError::Failed {
                args: joined,
                status: output.status.to_string(),
                stderr: detail,
            });
        }

        Ok(stdout)
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseName>, ObserveError> {
        let out = self
            .run(&["config", "database"])
            .await
            .map_err(|e| registry_error(&e))?;
        parse_databases(&out).map_err(|e| registry_error(&e))
    }

    async fn list_database_services(
        &self,
        database: &DatabaseName,
    ) -> Result<Vec<ServiceName>, ObserveError> {
        let list_error = |reason: String| ObserveError::ServiceListUnavailable {
            database: database.clone(),
            reason,
        };

        let out = self
            .run(&["config", "service", "-d", database.as_str()])
            .await
            .map_err(|e| list_error(e.to_string()))?;
        parse_service_names(&out).map_err(|e| list_error(e.to_string()))
    }
}

fn registry_error(err: &dyn std::error::Error) -> ObserveError {
    ObserveError::RegistryUnavailable {
        reason: err.to_string(),
    }
}

#[async_trait]
impl Observer for SrvctlObserver {
    async fn list_services(
        &self,
        database_filter: Option<&str>,
    ) -> Result<ServiceListing, ObserveError> {
        let databases: Vec<DatabaseName> = self
            .list_databases()
            .await?
            .into_iter()
            .filter(|db| database_filter.is_none_or(|filter| db.matches_filter(filter)))
            .collect();

        let mut listing = ServiceListing::default();
        for database in databases {
            match self.list_database_services(&database).await {
                Ok(services) => listing.services.extend(
                    services
                        .into_iter()
                        .map(|service| ServiceRef::new(database.clone(), service)),
                ),
                Err(e) => {
                    warn!(database = %database, error = %e, "Skipping database");
                    listing.failures.push(e);
                }
            }
        }

        info!(
            count = listing.services.len(),
            failed_databases = listing.failures.len(),
            "Discovered services"
        );
        Ok(listing)
    }

    async fn desired(&self, service: &ServiceRef) -> Result<ServiceDesired, ObserveError> {
        let config_error = |reason: String| ObserveError::ConfigUnavailable {
            service: service.clone(),
            reason,
        };

        let out = self
            .run(&[
                "config",
                "service",
                "-d",
                service.database.as_str(),
                "-s",
                service.service.as_str(),
            ])
            .await
            .map_err(|e| config_error(e.to_string()))?;
        let config = parse_service_config(&out).map_err(|e| config_error(e.to_string()))?;

        Ok(ServiceDesired::new(
            service.database.clone(),
            service.service.clone(),
            config.preferred,
            config.available,
        ))
    }

    async fn observed(&self, service: &ServiceRef) -> Result<ServiceObserved, ObserveError> {
        let out = self
            .run(&[
                "status",
                "service",
                "-d",
                service.database.as_str(),
                "-s",
                service.service.as_str(),
            ])
            .await
            .map_err(|e| ObserveError::StatusUnavailable {
                service: service.clone(),
                reason: e.to_string(),
            })?;

        let status = parse_service_status(&out, &service.service).map_err(|e| {
            ObserveError::AmbiguousObservation {
                service: service.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(match status {
            ServiceStatus::NotRunning => {
                ServiceObserved::down(service.database.clone(), service.service.clone())
            }
            ServiceStatus::Running(instances) => ServiceObserved::running(
                service.database.clone(),
                service.service.clone(),
                instances,
            ),
        })
    }

    async fn probe_instance(
        &self,
        database: &DatabaseName,
        instance: &InstanceName,
    ) -> Result<InstanceHealth, ObserveError> {
        let probe_error = |reason: String| ObserveError::ProbeFailed {
            database: database.clone(),
            instance: instance.clone(),
            reason,
        };

        let out = self
            .run(&[
                "status",
                "instance",
                "-d",
                database.as_str(),
                "-i",
                instance.as_str(),
            ])
            .await
            .map_err(|e| probe_error(e.to_string()))?;
        parse_instance_status(&out, instance).map_err(|e| probe_error(e.to_string()))
    }
}
