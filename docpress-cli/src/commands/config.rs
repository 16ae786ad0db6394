use anyhow::{Context, Result, bail};
use shared::config::ClientConfig;
use std::fs;

/// Writes a default configuration file into the current directory.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str) -> Result<()> {
    let config = ClientConfig::with_defaults();
    let (file_name, serialized) = match format {
        "yaml" => ("config.yaml", serde_yml::to_string(&config)?),
        "json" => ("config.json", serde_json::to_string_pretty(&config)?),
        _ => bail!("Unsupported format. Use 'yaml' or 'json'."),
    };

    fs::write(file_name, serialized.as_bytes())
        .with_context(|| format!("failed to write {file_name}"))?;

    println!("Configuration file '{file_name}' generated successfully.");
    Ok(())
}
