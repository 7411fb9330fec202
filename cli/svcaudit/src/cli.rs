//! Command-line interface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use svcaudit_observe::{FixtureObserver, Observer, SrvctlObserver};
use svcaudit_reconcile::SourceMode;

use crate::audit::Auditor;
use crate::config::Config;
use crate::error::CliError;
use crate::logging;
use crate::output::{print_report, OutputFormat, TextOptions};

/// svcaudit - Audit service placement against preferred instances.
///
/// Reports every service that is not running exactly on its preferred
/// instances and, with --plan, prints the srvctl commands that would move it
/// back. Nothing is executed.
#[derive(Debug, Parser)]
#[command(name = "svcaudit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Only audit this database (case-insensitive).
    #[arg(short = 'd', long = "db", env = "SVCAUDIT_DB")]
    db: Option<String>,

    /// Print corrective commands.
    #[arg(long)]
    plan: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text or json).
    #[arg(long, default_value = "text")]
    format: String,

    /// Config file path.
    #[arg(long, env = "SVCAUDIT_CONFIG")]
    config: Option<PathBuf>,

    /// Audit a recorded topology instead of the live cluster.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// How relocation sources are chosen. Overrides the config file.
    #[arg(long, value_enum)]
    source_mode: Option<SourceModeArg>,

    /// Print a per-service summary table after the findings.
    #[arg(long)]
    summary: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceModeArg {
    /// Relocate from one available instance per target.
    Instance,
    /// Relocate from the full running list.
    RunningList,
}

impl From<SourceModeArg> for SourceMode {
    fn from(arg: SourceModeArg) -> Self {
        match arg {
            SourceModeArg::Instance => SourceMode::Instance,
            SourceModeArg::RunningList => SourceMode::RunningList,
        }
    }
}

fn parse_format(format: &str) -> Result<OutputFormat, CliError> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(CliError::InvalidFormat(other.to_string())),
    }
}

impl Cli {
    /// Run an audit and return the process exit status.
    pub async fn run(self) -> Result<i32> {
        logging::init(self.verbose, self.log_json);

        let format = parse_format(&self.format)?;

        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        let mode = self
            .source_mode
            .map(SourceMode::from)
            .unwrap_or(config.source_mode);
        let srvctl = config.srvctl_config();

        let observer: Box<dyn Observer> = match &self.fixture {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read fixture from {:?}", path))?;
                let observer = FixtureObserver::from_json(&json)
                    .with_context(|| format!("Failed to parse fixture from {:?}", path))?;
                info!(fixture = %path.display(), "Using recorded topology");
                Box::new(observer)
            }
            None => {
                info!(
                    program = %srvctl.program.display(),
                    timeout_secs = srvctl.timeout.as_secs(),
                    "Using srvctl"
                );
                Box::new(SrvctlObserver::new(srvctl.clone()))
            }
        };

        let report = Auditor::new(observer.as_ref(), mode)
            .run(self.db.as_deref())
            .await
            .map_err(CliError::from)?;

        print_report(
            &report,
            format,
            &srvctl,
            TextOptions {
                plan: self.plan,
                summary: self.summary,
            },
        );

        Ok(report.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("text", Some(OutputFormat::Text))]
    #[case("json", Some(OutputFormat::Json))]
    #[case("yaml", None)]
    fn test_parse_format(#[case] raw: &str, #[case] expected: Option<OutputFormat>) {
        assert_eq!(parse_format(raw).ok(), expected);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "svcaudit",
            "--db",
            "orcl",
            "--plan",
            "--source-mode",
            "running-list",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.db.as_deref(), Some("orcl"));
        assert!(cli.plan);
        assert_eq!(cli.source_mode, Some(SourceModeArg::RunningList));
        assert_eq!(cli.format, "json");
        assert!(!cli.summary);
    }

    #[test]
    fn test_unknown_source_mode_is_rejected() {
        assert!(Cli::try_parse_from(["svcaudit", "--source-mode", "nearest"]).is_err());
    }
}
