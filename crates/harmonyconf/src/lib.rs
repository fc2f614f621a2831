//! Layered configuration for the harmony tools.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/harmony/config.toml` (system)
//! 2. `~/.config/harmony/config.toml` (user)
//! 3. `./harmony.toml`, or the path passed on the command line
//! 4. Environment variables (`HARMONY_*`, `RUST_LOG`)
//!
//! A file only sets the keys it names; everything else keeps the value from
//! earlier layers.
//!
//! # Example Config
//!
//! ```toml
//! log_level = "info"
//!
//! [voicing]
//! base_octave = 3
//! max_voices = 4
//! min_note = 36
//! max_note = 84
//! tone_priority = ["root", "3", "7", "9", "11", "13", "5"]
//! bass_strategy = "minimal_motion"
//! keep_common_tones = true
//! voicing = "drop2"
//!
//! [performance]
//! velocity = 96
//! channel = 1
//! duration = 4.0
//! ```

pub mod loader;
pub mod performance;
pub mod voicing;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use performance::PerformanceConfig;
pub use voicing::VoicingConfig;

use harmony::midi::{MIDI_MAX, OCTAVES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Complete harmony configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonyConfig {
    /// `tracing` filter directive for the CLI.
    /// Default: "warn"
    #[serde(default = "HarmonyConfig::default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub voicing: VoicingConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl Default for HarmonyConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            voicing: VoicingConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

impl HarmonyConfig {
    fn default_log_level() -> String {
        "warn".to_string()
    }

    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` standing in for `./harmony.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        Self::load_files(&files)
    }

    /// Load exactly the given files in order, then apply env overrides.
    pub fn load_files(files: &[PathBuf]) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in files {
            let table = loader::load_from_file(path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path.clone());
        }

        let mut config = loader::into_config(merged, Path::new("<merged>"))?;
        loader::apply_env_overrides(&mut config, &mut sources);
        config.validate()?;

        Ok((config, sources))
    }

    /// Reject values no rendering could honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.voicing;
        if v.max_note > MIDI_MAX {
            return Err(ConfigError::Invalid {
                field: "voicing.max_note",
                message: format!("{} is above {}", v.max_note, MIDI_MAX),
            });
        }
        if v.min_note > v.max_note {
            return Err(ConfigError::Invalid {
                field: "voicing.min_note",
                message: format!("{} is above max_note {}", v.min_note, v.max_note),
            });
        }
        if !OCTAVES.contains(&v.base_octave) {
            return Err(ConfigError::Invalid {
                field: "voicing.base_octave",
                message: format!("{} is outside {:?}", v.base_octave, OCTAVES),
            });
        }
        if let Some(octave) = v.bass_octave.filter(|o| !OCTAVES.contains(o)) {
            return Err(ConfigError::Invalid {
                field: "voicing.bass_octave",
                message: format!("{} is outside {:?}", octave, OCTAVES),
            });
        }
        if v.max_voices == 0 {
            return Err(ConfigError::Invalid {
                field: "voicing.max_voices",
                message: "need at least one voice".to_string(),
            });
        }

        let p = &self.performance;
        if !(1..=16).contains(&p.channel) {
            return Err(ConfigError::Invalid {
                field: "performance.channel",
                message: format!("{} is outside 1-16", p.channel),
            });
        }
        if !(1..=MIDI_MAX).contains(&p.velocity) {
            return Err(ConfigError::Invalid {
                field: "performance.velocity",
                message: format!("{} is outside 1-{}", p.velocity, MIDI_MAX),
            });
        }
        Ok(())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let v = &self.voicing;
        let p = &self.performance;
        let mut output = String::new();

        output.push_str("# Harmony Configuration\n\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.log_level));

        output.push_str("\n[voicing]\n");
        output.push_str(&format!("base_octave = {}\n", v.base_octave));
        if let Some(bass_octave) = v.bass_octave {
            output.push_str(&format!("bass_octave = {}\n", bass_octave));
        }
        output.push_str(&format!("max_voices = {}\n", v.max_voices));
        output.push_str(&format!("min_note = {}\n", v.min_note));
        output.push_str(&format!("max_note = {}\n", v.max_note));
        let priority: Vec<String> = v
            .tone_priority
            .iter()
            .map(|d| format!("\"{}\"", d.name()))
            .collect();
        output.push_str(&format!("tone_priority = [{}]\n", priority.join(", ")));
        output.push_str(&format!("bass_strategy = \"{}\"\n", bass_strategy_name(v.bass_strategy)));
        output.push_str(&format!("keep_common_tones = {}\n", v.keep_common_tones));
        output.push_str(&format!("allow_voice_crossing = {}\n", v.allow_voice_crossing));
        output.push_str(&format!("voicing = \"{}\"\n", voicing_name(v.voicing)));

        output.push_str("\n[performance]\n");
        output.push_str(&format!("velocity = {}\n", p.velocity));
        output.push_str(&format!("channel = {}\n", p.channel));
        if let Some(duration) = p.duration {
            output.push_str(&format!("duration = {:?}\n", duration));
        }

        output
    }
}

fn bass_strategy_name(strategy: harmony::BassStrategy) -> &'static str {
    match strategy {
        harmony::BassStrategy::FollowRoot => "follow_root",
        harmony::BassStrategy::MinimalMotion => "minimal_motion",
    }
}

fn voicing_name(voicing: harmony::Voicing) -> &'static str {
    match voicing {
        harmony::Voicing::Close => "close",
        harmony::Voicing::Drop2 => "drop2",
        harmony::Voicing::Drop3 => "drop3",
    }
}
