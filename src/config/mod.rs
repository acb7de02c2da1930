// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Application configuration.
//!
//! One flat YAML file holding the generation defaults and playback
//! setup. Every field is optional; anything missing takes its default,
//! so an empty file is a valid configuration.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Generation and playback defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Key to generate in (e.g. "C", "F#/Gb").
    #[serde(default = "default_key")]
    pub key: String,
    /// Scale identifier (e.g. "major", "harmonic-minor").
    #[serde(default = "default_scale")]
    pub scale: String,
    /// Progression template name.
    #[serde(default = "default_template")]
    pub template: String,
    /// Rhythm pattern name for playback.
    #[serde(default = "default_rhythm_pattern")]
    pub rhythm_pattern: String,
    /// Instrument identifier for playback.
    #[serde(default = "default_instrument")]
    pub instrument: String,
    /// Playback tempo in BPM.
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Master volume (0.0 - 1.0).
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,
    /// Whether generation may attach chord extensions.
    #[serde(default)]
    pub add_extensions: bool,
    /// Whether generation also writes a melody line.
    #[serde(default)]
    pub generate_melody: bool,
    /// Location of the saved-idea library file.
    #[serde(default = "default_library_path")]
    pub library_path: String,
}

fn default_key() -> String {
    "C".to_string()
}
fn default_scale() -> String {
    "major".to_string()
}
fn default_template() -> String {
    "I-V-vi-IV".to_string()
}
fn default_rhythm_pattern() -> String {
    "Block Chord".to_string()
}
fn default_instrument() -> String {
    "sine".to_string()
}
fn default_tempo() -> f64 {
    120.0
}
fn default_master_volume() -> f32 {
    0.7
}
fn default_library_path() -> String {
    "cadence-ideas.yaml".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            scale: default_scale(),
            template: default_template(),
            rhythm_pattern: default_rhythm_pattern(),
            instrument: default_instrument(),
            tempo: default_tempo(),
            master_volume: default_master_volume(),
            add_extensions: false,
            generate_melody: false,
            library_path: default_library_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Load the file if it exists, falling back to defaults.
    ///
    /// A missing file is the normal no-config case. An unreadable or
    /// malformed file logs a warning and still yields defaults, so a
    /// broken config never blocks startup.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        if !path.as_ref().exists() {
            return Self::default();
        }
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = ?path.as_ref(), %err, "config unreadable, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.key, "C");
        assert_eq!(config.scale, "major");
        assert_eq!(config.template, "I-V-vi-IV");
        assert_eq!(config.rhythm_pattern, "Block Chord");
        assert_eq!(config.instrument, "sine");
        assert_eq!(config.tempo, 120.0);
        assert_eq!(config.master_volume, 0.7);
        assert!(!config.add_extensions);
        assert!(!config.generate_melody);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
key: "A"
scale: "dorian"
tempo: 96
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.key, "A");
        assert_eq!(config.scale, "dorian");
        assert_eq!(config.tempo, 96.0);
        assert_eq!(config.template, "I-V-vi-IV");
        assert_eq!(config.instrument, "sine");
    }

    #[test]
    fn test_empty_yaml_is_all_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let mut original = AppConfig::default();
        original.key = "F#/Gb".to_string();
        original.generate_melody = true;
        original.master_volume = 0.5;

        let yaml = original.to_yaml().unwrap();
        let parsed = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.yaml"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_or_default_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, ":: not yaml ::").unwrap();
        let config = AppConfig::load_or_default(&path);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.tempo = 84.0;
        config.rhythm_pattern = "Waltz".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
