// FILE: src/cli/config.rs

use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub include_directories: Option<Vec<String>>,
    pub default_extension: Option<String>,
    pub pretty: Option<bool>,
    pub output: Option<String>,
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    let config_content = fs::read_to_string(config_path).map_err(|e| {
        ExtractError::Io(std::io::Error::new(
            e.kind(),
            format!("Config file {}: {}", config_path, e),
        ))
    })?;

    let config = if config_path.ends_with(".json") {
        serde_json::from_str(&config_content)
            .map_err(|e| ExtractError::invalid_format(format!("Invalid JSON config: {}", e)))?
    } else if config_path.ends_with(".toml") {
        toml::from_str(&config_content)
            .map_err(|e| ExtractError::invalid_format(format!("Invalid TOML config: {}", e)))?
    } else {
        return Err(ExtractError::invalid_format(
            "Config file must be .json or .toml format",
        ));
    };

    log::info!("Loaded configuration from {}", config_path);
    Ok(config)
}
