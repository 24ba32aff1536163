//! `interactive` command: run the line-oriented client session.

use std::io;
use std::path::Path;

use tracing::info;

use crate::interactive::SessionLoop;
use crate::transport::{InProcessTransport, SubprocessTransport, ToolTransport};

/// Starts an interactive session on stdin/stdout.
///
/// In subprocess mode every tool call spawns a runner process; by default
/// that runner is this binary's own `call` subcommand, overridable with
/// `--runner`.
///
/// # Errors
///
/// Returns an error string when the gateway is not configured (direct
/// mode), the runner path cannot be resolved (subprocess mode), or the
/// session's own I/O fails.
pub async fn run(subprocess: bool, runner: Option<&Path>) -> Result<(), String> {
    let transport: Box<dyn ToolTransport> = if subprocess {
        let program = match runner {
            Some(path) => path.to_path_buf(),
            None => std::env::current_exe()
                .map_err(|e| format!("failed to resolve tool runner: {e}"))?,
        };
        let prefix = if runner.is_some() { Vec::new() } else { vec!["call".to_string()] };
        info!(runner = %program.display(), "starting session in subprocess mode");
        println!("Running in subprocess mode (runner: {}).", program.display());
        Box::new(SubprocessTransport::new(program, prefix))
    } else {
        info!("starting session in direct mode");
        println!("Running in direct mode.");
        Box::new(InProcessTransport::new(super::live_dispatcher()?))
    };

    spawn_interrupt_watcher();
    SessionLoop::new(transport, io::stdin().lock(), io::stdout()).run().await
}

/// Turns an interrupt into a graceful session exit instead of abrupt
/// process death. Runs as a task so it fires even while the session
/// thread is blocked reading stdin.
fn spawn_interrupt_watcher() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nExiting interactive client...");
            std::process::exit(0);
        }
    });
}
