//! Binary entrypoint for the `tracktools` CLI.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

// Multi-thread runtime: the interactive session blocks its thread on
// stdin, and the interrupt watcher must still get polled.
#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `call` keeps stdout as pure JSON for the
    // subprocess transport.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    match tracktools::run(std::env::args()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
