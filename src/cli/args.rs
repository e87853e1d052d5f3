//! Command-line argument parsing for distsync.

use std::time::Duration;

use crate::config::ClientConfig;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Keep the instance list in sync and print it on every change (default)
    Watch,
    /// Print the instance list once
    List,
    /// Print the provider kinds
    Providers,
    /// Print preheat history, optionally filtered
    History { keyword: Option<String> },
    Enable(String),
    Disable(String),
    Delete(String),
    Preheat(Vec<String>),
    /// Arguments could not be understood
    Invalid(String),
}

/// Command plus global options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: CliCommand,
    pub base_url: Option<String>,
    pub interval_secs: Option<u64>,
}

impl CliArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(secs) = self.interval_secs {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        config
    }
}

pub const USAGE: &str = "\
Usage: distsync [--base-url <url>] [--interval <secs>] [command]

Commands:
  watch               keep the instance list in sync (default)
  list                print provider instances
  providers           print provider kinds
  history [keyword]   print preheat history
  enable <id>         enable an instance
  disable <id>        disable an instance
  delete <id>         delete an instance
  preheat <image>...  request preheating of images

Options:
  --base-url <url>    registry address (env: DISTSYNC_BASE_URL)
  --interval <secs>   refresh interval for watch (env: DISTSYNC_POLL_INTERVAL_SECS)
  -V, --version       print version
  -h, --help          print this help";

/// Parse command-line arguments. The first item is the program name.
///
/// ```
/// use distsync::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["distsync".to_string(), "disable".to_string(), "7".to_string()];
/// assert_eq!(parse_args(args.into_iter()).command, CliCommand::Disable("7".to_string()));
/// ```
pub fn parse_args<I>(args: I) -> CliArgs
where
    I: Iterator<Item = String>,
{
    let mut parsed = CliArgs {
        command: CliCommand::Watch,
        base_url: None,
        interval_secs: None,
    };
    let mut positional = Vec::new();
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                parsed.command = CliCommand::Version;
                return parsed;
            }
            "--help" | "-h" => {
                parsed.command = CliCommand::Help;
                return parsed;
            }
            "--base-url" => match args.next() {
                Some(url) => parsed.base_url = Some(url),
                None => return invalid(parsed, "--base-url needs a value"),
            },
            "--interval" => match args.next().map(|v| v.parse::<u64>()) {
                Some(Ok(secs)) if secs > 0 => parsed.interval_secs = Some(secs),
                _ => return invalid(parsed, "--interval needs a positive number of seconds"),
            },
            flag if flag.starts_with("--") => {
                return invalid(parsed, &format!("unknown option {}", flag))
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None | Some("watch") => CliCommand::Watch,
        Some("help") => CliCommand::Help,
        Some("list") => CliCommand::List,
        Some("providers") => CliCommand::Providers,
        Some("history") => CliCommand::History {
            keyword: positional.next(),
        },
        Some(verb @ ("enable" | "disable" | "delete")) => match positional.next() {
            Some(id) if verb == "enable" => CliCommand::Enable(id),
            Some(id) if verb == "disable" => CliCommand::Disable(id),
            Some(id) => CliCommand::Delete(id),
            None => return invalid(parsed, &format!("{} needs an instance id", verb)),
        },
        Some("preheat") => {
            let images: Vec<String> = positional.collect();
            if images.is_empty() {
                return invalid(parsed, "preheat needs at least one image");
            }
            CliCommand::Preheat(images)
        }
        Some(other) => return invalid(parsed, &format!("unknown command {}", other)),
    };
    parsed.command = command;
    parsed
}

fn invalid(mut parsed: CliArgs, reason: &str) -> CliArgs {
    parsed.command = CliCommand::Invalid(reason.to_string());
    parsed
}
