//! `tools` command: list the registered tool identifiers.

use crate::tools::TOOL_NAMES;

/// Prints one tool identifier per line.
///
/// # Errors
///
/// Currently infallible; the signature matches the other handlers.
pub fn run() -> Result<(), String> {
    for name in TOOL_NAMES {
        println!("{name}");
    }
    Ok(())
}
