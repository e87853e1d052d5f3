//! Version command for distsync.

/// The current version of distsync, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Handle the --version command.
///
/// Prints the version string and exits successfully.
pub fn handle_version_command() -> ! {
    println!("distsync {}", VERSION);
    std::process::exit(0)
}
