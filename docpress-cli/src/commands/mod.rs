//! Subcommand implementations.

pub mod completion;
pub mod config;
pub mod export;
pub mod files;
pub mod manual;
pub mod navigate;
pub mod projects;
pub mod session;

use anyhow::Result;
use serde::Serialize;

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
