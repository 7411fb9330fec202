//! Output formatting for audit reports.
//!
//! Text output is one line per finding, plus the literal corrective commands
//! when requested. Command lines carry no prefix or color so they can be
//! copied or piped as-is.

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use svcaudit_names::{join_list, InstanceName};
use svcaudit_observe::{ServiceRef, SrvctlConfig};
use svcaudit_reconcile::Action;

use crate::audit::{AuditReport, Outcome, ServiceAudit};

const REPORT_SCHEMA_VERSION: &str = "svcaudit.report.v1";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// JSON document.
    Json,
}

/// What to include in text output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOptions {
    /// Print corrective commands.
    pub plan: bool,
    /// Print a per-service summary table.
    pub summary: bool,
}

/// Severity of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Warning,
    Error,
    Command,
}

/// One line of text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub kind: LineKind,
    pub text: String,
}

impl ReportLine {
    fn warning(text: String) -> Self {
        Self {
            kind: LineKind::Warning,
            text,
        }
    }

    fn error(text: String) -> Self {
        Self {
            kind: LineKind::Error,
            text,
        }
    }

    fn command(text: String) -> Self {
        Self {
            kind: LineKind::Command,
            text,
        }
    }
}

/// Print a report in the requested format.
pub fn print_report(
    report: &AuditReport,
    format: OutputFormat,
    commands: &SrvctlConfig,
    options: TextOptions,
) {
    match format {
        OutputFormat::Text => {
            for line in render_lines(report, commands, options.plan) {
                match line.kind {
                    LineKind::Warning => println!("{} {}", "Warning:".yellow().bold(), line.text),
                    LineKind::Error => println!("{} {}", "Error:".red().bold(), line.text),
                    LineKind::Command => println!("{}", line.text),
                }
            }
            if options.summary {
                print_summary(report);
            }
        }
        OutputFormat::Json => println!("{}", format_json(report)),
    }
}

/// Render the text lines for a report.
pub fn render_lines(report: &AuditReport, commands: &SrvctlConfig, plan: bool) -> Vec<ReportLine> {
    let mut lines: Vec<ReportLine> = report
        .listing_failures
        .iter()
        .map(|failure| ReportLine::error(failure.message.clone()))
        .collect();
    for audit in &report.services {
        render_service(audit, commands, plan, &mut lines);
    }
    lines
}

fn render_service(
    audit: &ServiceAudit,
    commands: &SrvctlConfig,
    plan: bool,
    lines: &mut Vec<ReportLine>,
) {
    let service = &audit.service;
    match &audit.outcome {
        Outcome::Failed { message, .. } => {
            lines.push(ReportLine::error(format!(
                "Service {} of database {} skipped: {}",
                service.service, service.database, message
            )));
        }
        Outcome::Evaluated {
            preferred,
            running,
            result,
            ..
        } => {
            if result.compliant {
                return;
            }

            lines.push(ReportLine::warning(format!(
                "Service {} of database {} is not on its preferred instances (current: {}, preferred: {})",
                service.service,
                service.database,
                display_list(running),
                display_list(preferred)
            )));

            for warning in &result.plan.warnings {
                lines.push(ReportLine::warning(format!(
                    "Service {} of database {}: {}",
                    service.service, service.database, warning
                )));
            }

            if plan {
                for action in result.plan.iter() {
                    lines.push(ReportLine::command(command_line(action, service, commands)));
                }
            }
        }
    }
}

fn display_list(instances: &[InstanceName]) -> String {
    if instances.is_empty() {
        "not running".to_string()
    } else {
        join_list(instances)
    }
}

/// Literal command line for one action.
pub fn command_line(action: &Action, service: &ServiceRef, commands: &SrvctlConfig) -> String {
    match action {
        Action::StartService => format!(
            "Start {} USING: {}",
            service.service,
            commands.start_command(service)
        ),
        Action::StartOnInstance { target } => format!(
            "Start {} on {} USING: {} -i {}",
            service.service,
            target,
            commands.start_command(service),
            target
        ),
        Action::RelocateService { source, target } => format!(
            "Relocate {} from {} to {} USING: {} -i {} -t {}",
            service.service,
            source,
            target,
            commands.relocate_command(service),
            source,
            target
        ),
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "DATABASE")]
    database: String,
    #[tabled(rename = "SERVICE")]
    service: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "RUNNING")]
    running: String,
    #[tabled(rename = "PREFERRED")]
    preferred: String,
    #[tabled(rename = "ACTIONS")]
    actions: usize,
}

impl From<&ServiceAudit> for SummaryRow {
    fn from(audit: &ServiceAudit) -> Self {
        let (status, running, preferred, actions) = match &audit.outcome {
            Outcome::Failed { kind, .. } => (kind.to_string(), "-".to_string(), "-".to_string(), 0),
            Outcome::Evaluated {
                preferred,
                running,
                result,
                ..
            } => (
                if result.compliant {
                    "compliant".to_string()
                } else {
                    "drifted".to_string()
                },
                display_list(running),
                join_list(preferred),
                result.plan.actions.len(),
            ),
        };

        Self {
            database: audit.service.database.to_string(),
            service: audit.service.service.to_string(),
            status,
            running,
            preferred,
            actions,
        }
    }
}

fn print_summary(report: &AuditReport) {
    if report.services.is_empty() && report.listing_failures.is_empty() {
        println!("{}", "No services found.".dimmed());
        return;
    }

    if !report.services.is_empty() {
        let rows: Vec<SummaryRow> = report.services.iter().map(SummaryRow::from).collect();
        println!("{}", Table::new(rows));
    }
    println!(
        "{} services, {} drifted, {} failed, {} databases unlisted",
        report.services.len(),
        report.drifted(),
        report.failed() - report.listing_failures.len(),
        report.listing_failures.len()
    );
}

/// Render a report as a schema-versioned JSON document.
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> String {
    let value = serde_json::to_value(data).unwrap_or_else(|_| serde_json::json!({}));
    let wrapped = serde_json::json!({
        "schemaVersion": REPORT_SCHEMA_VERSION,
        "data": value
    });
    serde_json::to_string_pretty(&sort_json_value(wrapped)).unwrap_or_else(|_| "{}".to_string())
}

fn sort_json_value(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Array(values) => {
            serde_json::Value::Array(values.into_iter().map(sort_json_value).collect())
        }
        serde_json::Value::Object(entries) => {
            let mut pairs: Vec<_> = entries.into_iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let mut mapped = serde_json::Map::new();
            for (key, value) in pairs {
                mapped.insert(key, sort_json_value(value));
            }
            serde_json::Value::Object(mapped)
        }
        other => other,
    }
}
