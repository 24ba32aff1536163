//! Command dispatch and handlers.

pub mod call;
pub mod interactive;
pub mod tools;

use std::sync::Arc;

use crate::cli::Command;
use crate::config::GatewayConfig;
use crate::tools::ToolDispatcher;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub async fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Interactive { subprocess, runner } => {
            interactive::run(*subprocess, runner.as_deref()).await
        }
        Command::Call { tool, args } => call::run(tool, args).await,
        Command::Tools => tools::run(),
    }
}

/// Builds a dispatcher over the live gateway from the environment.
///
/// Fails fast when the connection settings are absent; the degraded
/// no-gateway dispatcher is reserved for embedding, not for the CLI.
pub(crate) fn live_dispatcher() -> Result<ToolDispatcher, String> {
    let config = GatewayConfig::from_env()
        .ok_or("YOUTRACK_URL and YOUTRACK_TOKEN must be set (directly or via .env)")?;
    let gateway = crate::adapters::LiveGateway::new(&config).map_err(|e| e.to_string())?;
    Ok(ToolDispatcher::new(Some(Arc::new(gateway))))
}
