use color_eyre::Result;

use distsync::cli::{handle_version_command, parse_args, run_cli_command, CliCommand};
use distsync::config::ClientConfig;
use distsync::logging::{init_tracing, DEFAULT_DIRECTIVE};

fn main() -> Result<()> {
    let args = parse_args(std::env::args());

    // Handle --version before any initialization
    if args.command == CliCommand::Version {
        handle_version_command();
    }

    color_eyre::install()?;
    init_tracing(DEFAULT_DIRECTIVE);

    let config = args.apply(ClientConfig::from_env());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_cli_command(args.command, config))
}
