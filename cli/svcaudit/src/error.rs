//! Error handling and display for the CLI.

use colored::Colorize;
use thiserror::Error;

use svcaudit_observe::ObserveError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Registry(#[from] ObserveError),

    #[error("Invalid output format '{0}' (expected 'text' or 'json')")]
    InvalidFormat(String),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::Registry(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check that ORACLE_HOME is set and srvctl is runnable by this user."
                        .yellow()
                );
            }
            CliError::InvalidFormat(_) => {
                eprintln!("\n{}", "Hint: Use --format text or --format json.".yellow());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_message() {
        let err = CliError::from(ObserveError::RegistryUnavailable {
            reason: "srvctl not found".to_string(),
        });
        assert_eq!(err.to_string(), "cannot list services: srvctl not found");
    }

    #[test]
    fn test_print_error_handles_every_variant() {
        print_error(&anyhow::Error::from(CliError::InvalidFormat("yaml".to_string())));
        print_error(&anyhow::Error::from(CliError::Registry(
            ObserveError::RegistryUnavailable {
                reason: "srvctl not found".to_string(),
            },
        )));
        print_error(&anyhow::anyhow!("Failed to read config"));
    }

    #[test]
    fn test_downcast_from_anyhow() {
        let err = anyhow::Error::from(CliError::InvalidFormat("yaml".to_string()));
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidFormat(format)) if format == "yaml"
        ));
    }
}
