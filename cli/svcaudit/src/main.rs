//! svcaudit - audit service placement against preferred instances.

use anyhow::Result;
use clap::Parser;

use svcaudit::error;
use svcaudit::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.run().await {
        Ok(code) if code != 0 => std::process::exit(code),
        Ok(_) => Ok(()),
        Err(e) => {
            error::print_error(&e);
            std::process::exit(1);
        }
    }
}
