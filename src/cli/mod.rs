//! CLI module for distsync.
//!
//! - Argument parsing
//! - Version display
//! - Network commands (watch, list, providers, history, mutations)
//!
//! # Usage
//!
//! ```ignore
//! use distsync::cli::{parse_args, run_cli_command};
//!
//! let args = parse_args(std::env::args());
//! let config = args.apply(ClientConfig::from_env());
//! runtime.block_on(run_cli_command(args.command, config))?;
//! ```

pub mod args;
pub mod commands;
pub mod output;
pub mod version;

pub use args::{parse_args, CliArgs, CliCommand, USAGE};
pub use commands::run_command;
pub use version::{handle_version_command, VERSION};

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::ClientConfig;

/// Run any parsed command.
///
/// `Version` never returns as it calls `std::process::exit(0)`.
pub async fn run_cli_command(command: CliCommand, config: ClientConfig) -> Result<()> {
    match command {
        CliCommand::Version => handle_version_command(),
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Invalid(reason) => Err(eyre!("{}\n\n{}", reason, USAGE)),
        command => run_command(command, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_command_reports_usage() {
        let err = run_cli_command(CliCommand::Invalid("bad".into()), ClientConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("bad"));
        assert!(err.to_string().contains("Usage: distsync"));
    }

    #[tokio::test]
    async fn test_help_succeeds() {
        assert!(run_cli_command(CliCommand::Help, ClientConfig::default())
            .await
            .is_ok());
    }
}
