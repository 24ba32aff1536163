//! Core library for the `tracktools` CLI: tool dispatch and response
//! normalization over an issue tracker backend.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod interactive;
pub mod normalize;
pub mod ports;
pub mod project;
pub mod tools;
pub mod transport;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub async fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command).await
}
