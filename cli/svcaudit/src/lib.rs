//! svcaudit - service placement audit.
//!
//! Walks every clustered service, compares where it runs with where it is
//! supposed to run, and reports the drift along with the `srvctl` commands
//! that would correct it. The binary only prints those commands.

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use audit::{AuditReport, Auditor, Outcome, ServiceAudit};
pub use cli::Cli;
