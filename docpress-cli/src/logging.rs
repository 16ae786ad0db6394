//! Tracing setup for the CLI.

use shared::config::{ClientConfig, LogFormat};
use std::io;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt};

/// Installs the global subscriber and returns the effective default level.
///
/// Logs go to stderr so command output on stdout stays pipeable.
pub fn initialize_tracing(config: &ClientConfig) -> String {
    let fmt_builder = fmt::fmt()
        .with_env_filter(build_env_filter(config))
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stderr);

    let installed = if matches!(config.log_format, LogFormat::Json) {
        fmt_builder.json().with_ansi(false).try_init()
    } else {
        fmt_builder.with_ansi(true).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }

    config.log_level.clone()
}

fn build_env_filter(config: &ClientConfig) -> EnvFilter {
    let default_level = config
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}
