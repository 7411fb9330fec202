//! # svcaudit-names
//!
//! Validated names for the objects a cluster audit talks about.
//!
//! ## Design Principles
//!
//! - Names are operator-controlled labels copied from cluster configuration
//! - Every name type validates on construction, so downstream code never
//!   re-checks for empty or malformed tokens
//! - Names are typed to prevent passing an instance where a service is expected
//!
//! ## Name Format
//!
//! A name is a single non-empty token: no whitespace and no commas. Commas
//! separate list entries in cluster tool output, so a name containing one
//! always means the output was split incorrectly.
//!
//! Examples:
//! - `ORCL` (database)
//! - `oltp_svc` (service)
//! - `ORCL1` (instance)

mod error;
mod macros;
mod types;

pub use error::NameError;
pub use types::*;
