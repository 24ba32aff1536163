//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `tracktools`.
#[derive(Debug, Parser)]
#[command(name = "tracktools", version, about = "Issue tracker tools and interactive client")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the interactive client.
    Interactive {
        /// Run each tool call through a spawned tool-runner process
        /// instead of in-process dispatch.
        #[arg(long)]
        subprocess: bool,
        /// Tool-runner executable for subprocess mode. Defaults to this
        /// binary's own `call` subcommand.
        #[arg(long)]
        runner: Option<PathBuf>,
    },
    /// Invoke one tool and print its JSON result.
    Call {
        /// Tool identifier.
        #[arg(long)]
        tool: String,
        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// List the registered tool identifiers.
    Tools,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_interactive_subcommand() {
        let cli = Cli::parse_from(["tracktools", "interactive"]);
        assert!(matches!(
            cli.command,
            Command::Interactive { subprocess: false, runner: None }
        ));
    }

    #[test]
    fn parses_subprocess_flags() {
        let cli = Cli::parse_from([
            "tracktools",
            "interactive",
            "--subprocess",
            "--runner",
            "/usr/local/bin/runner",
        ]);
        match cli.command {
            Command::Interactive { subprocess, runner } => {
                assert!(subprocess);
                assert_eq!(runner.unwrap().to_str(), Some("/usr/local/bin/runner"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_call_with_default_args() {
        let cli = Cli::parse_from(["tracktools", "call", "--tool", "get_issues"]);
        match cli.command {
            Command::Call { tool, args } => {
                assert_eq!(tool, "get_issues");
                assert_eq!(args, "{}");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_tools_subcommand() {
        let cli = Cli::parse_from(["tracktools", "tools"]);
        assert!(matches!(cli.command, Command::Tools));
    }
}
