//! CLI command implementations

pub mod export;
pub mod init;
pub mod send;
pub mod validate;

use crate::core::response::InvocationResponse;

/// Print an invocation response as pretty JSON on stdout
pub(crate) fn print_response(response: &InvocationResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
