//! Transports that carry tool calls from a client to a dispatcher.
//!
//! The interactive session talks to tools through [`ToolTransport`], so
//! the same loop runs against an in-process dispatcher or a tool runner
//! spawned per call as a subprocess.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::tools::ToolDispatcher;

/// Boxed future type for transport results.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, String>> + Send + 'a>>;

/// A channel over which tool calls reach a dispatcher.
pub trait ToolTransport: Send + Sync {
    /// Invokes a tool by name with a JSON argument object.
    fn call_tool<'a>(&'a self, name: &str, args: &Value) -> TransportFuture<'a>;
}

/// Transport that calls the dispatcher directly in this process.
pub struct InProcessTransport {
    dispatcher: ToolDispatcher,
}

impl InProcessTransport {
    /// Wraps a dispatcher.
    #[must_use]
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }
}

impl ToolTransport for InProcessTransport {
    fn call_tool<'a>(&'a self, name: &str, args: &Value) -> TransportFuture<'a> {
        let name = name.to_string();
        let args = args.clone();
        Box::pin(async move { self.dispatcher.call_tool(&name, &args).await })
    }
}

/// Default wall-clock limit for one tool-runner invocation.
pub const RUNNER_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport that spawns a tool-runner process per call.
///
/// The runner is invoked as `<program> <prefix..> --tool <name> --args
/// <json>` and must print the tool result as JSON on stdout. A nonzero
/// exit reports the runner's stderr; empty output maps to JSON null.
pub struct SubprocessTransport {
    program: PathBuf,
    prefix_args: Vec<String>,
    timeout: Duration,
}

impl SubprocessTransport {
    /// Creates a transport for the given runner invocation.
    #[must_use]
    pub fn new(program: PathBuf, prefix_args: Vec<String>) -> Self {
        Self { program, prefix_args, timeout: RUNNER_TIMEOUT }
    }

    /// Overrides the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_once(&self, name: &str, args: &Value) -> Result<Value, String> {
        debug!(tool = name, runner = %self.program.display(), "spawning tool runner");
        let invocation = Command::new(&self.program)
            .args(&self.prefix_args)
            .arg("--tool")
            .arg(name)
            .arg("--args")
            .arg(args.to_string())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, invocation)
            .await
            .map_err(|_| "tool runner timed out".to_string())?
            .map_err(|e| format!("failed to run tool runner: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("tool runner failed ({}): {}", output.status, stderr.trim()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(trimmed)
            .map_err(|e| format!("unparsable tool output ({e}); raw output: {trimmed}"))
    }
}

impl ToolTransport for SubprocessTransport {
    fn call_tool<'a>(&'a self, name: &str, args: &Value) -> TransportFuture<'a> {
        let name = name.to_string();
        let args = args.clone();
        Box::pin(async move { self.run_once(&name, &args).await })
    }
}
