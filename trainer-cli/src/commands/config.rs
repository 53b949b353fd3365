use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use shared::config::{ClientConfig, ConfigFormat};

/// Generates a configuration file in the specified format.
///
/// # Arguments
/// * `format` - "yaml", "json" or "toml".
/// * `output` - Target path; `trainer.<format>` in the current directory when absent.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str, output: Option<PathBuf>) -> Result<()> {
    let format: ConfigFormat = format.parse()?;
    let config = ClientConfig::with_defaults();
    let serialized = config.render(format)?;

    let path = output.unwrap_or_else(|| PathBuf::from(format.file_name()));
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(&path, serialized)
        .with_context(|| format!("failed to write configuration file {}", path.display()))?;

    println!("Configuration file '{}' generated successfully.", path.display());
    Ok(())
}
