//! `call` command: invoke one tool and print its JSON result.

use serde_json::Value;

/// Runs the named tool against the live gateway and prints the result as
/// pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error string when the arguments are not valid JSON, the
/// gateway is not configured, or the tool itself fails.
pub async fn run(tool: &str, args: &str) -> Result<(), String> {
    let args: Value = serde_json::from_str(args).map_err(|e| format!("invalid --args JSON: {e}"))?;
    let dispatcher = super::live_dispatcher()?;
    let result = dispatcher.call_tool(tool, &args).await?;
    let rendered =
        serde_json::to_string_pretty(&result).map_err(|e| format!("failed to render result: {e}"))?;
    println!("{rendered}");
    Ok(())
}
