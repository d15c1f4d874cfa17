//! Parameter preset management
//!
//! Presets persist one [`EffectParams`] record per TOML file in a
//! preset directory, named `<preset>.toml`. The engine itself never
//! embeds filesystem paths; the preset directory is always supplied by
//! the caller.

use crate::domain::pipeline::EffectParams;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during preset operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Invalid preset: {0}")]
    Invalid(String),
}

/// Preset manager over a caller-supplied directory
pub struct PresetManager {
    preset_dir: PathBuf,
}

impl PresetManager {
    pub fn new(preset_dir: PathBuf) -> Self {
        Self { preset_dir }
    }

    fn preset_path(&self, name: &str) -> PathBuf {
        self.preset_dir.join(format!("{name}.toml"))
    }

    /// List all available presets, sorted by name
    #[instrument(skip(self))]
    pub fn list_presets(&self) -> Result<Vec<String>> {
        let mut presets = Vec::new();

        for entry in fs::read_dir(&self.preset_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "toml").unwrap_or(false) {
                if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                    presets.push(name.to_string());
                }
            }
        }

        presets.sort();
        debug!(count = presets.len(), "Listed presets");
        Ok(presets)
    }

    /// Load a preset by name
    #[instrument(skip(self))]
    pub fn load_preset(&self, name: &str) -> Result<EffectParams> {
        let path = self.preset_path(name);
        if !path.exists() {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }

        let contents = fs::read_to_string(&path)?;
        let params: EffectParams = toml::from_str(&contents)?;
        params
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        info!(name, "Preset loaded");
        Ok(params)
    }

    /// Save a preset by name, creating the preset directory if needed
    #[instrument(skip(self, params))]
    pub fn save_preset(&self, name: &str, params: &EffectParams) -> Result<()> {
        fs::create_dir_all(&self.preset_dir)?;

        let toml_str = toml::to_string_pretty(params)?;
        fs::write(self.preset_path(name), toml_str)?;

        info!(name, "Preset saved");
        Ok(())
    }

    /// Delete a preset by name
    #[instrument(skip(self))]
    pub fn delete_preset(&self, name: &str) -> Result<()> {
        let path = self.preset_path(name);
        if !path.exists() {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }

        fs::remove_file(path)?;
        info!(name, "Preset deleted");
        Ok(())
    }

    /// Check whether a preset exists
    pub fn preset_exists(&self, name: &str) -> bool {
        self.preset_path(name).exists()
    }

    pub fn preset_dir(&self) -> &Path {
        &self.preset_dir
    }
}
