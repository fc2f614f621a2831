//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, HarmonyConfig};
use harmony::BassStrategy;
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local `./harmony.toml`. It is
/// returned even when missing so that loading reports the bad path.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/harmony/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("harmony/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("harmony.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read and check one config file.
pub fn load_from_file(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse a TOML document, keeping it as a raw table so that merging only
/// touches the keys the file actually sets.
pub(crate) fn parse_toml(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Type-check here so errors name the file they came from.
    into_config(table.clone(), path)?;

    Ok(table)
}

pub(crate) fn into_config(table: toml::Table, path: &Path) -> Result<HarmonyConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Merge `overlay` into `base`, recursing into tables. Overlay keys win.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut HarmonyConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from any key lookup. Values that fail to parse are skipped.
pub fn apply_overrides_from(
    config: &mut HarmonyConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let voicing = &mut config.voicing;

    if let Some(v) = lookup("HARMONY_BASE_OCTAVE").and_then(|v| v.parse().ok()) {
        voicing.base_octave = v;
        sources.env_overrides.push("HARMONY_BASE_OCTAVE".to_string());
    }
    if let Some(v) = lookup("HARMONY_BASS_OCTAVE").and_then(|v| v.parse().ok()) {
        voicing.bass_octave = Some(v);
        sources.env_overrides.push("HARMONY_BASS_OCTAVE".to_string());
    }
    if let Some(v) = lookup("HARMONY_MAX_VOICES").and_then(|v| v.parse().ok()) {
        voicing.max_voices = v;
        sources.env_overrides.push("HARMONY_MAX_VOICES".to_string());
    }
    if let Some(v) = lookup("HARMONY_MIN_NOTE").and_then(|v| v.parse().ok()) {
        voicing.min_note = v;
        sources.env_overrides.push("HARMONY_MIN_NOTE".to_string());
    }
    if let Some(v) = lookup("HARMONY_MAX_NOTE").and_then(|v| v.parse().ok()) {
        voicing.max_note = v;
        sources.env_overrides.push("HARMONY_MAX_NOTE".to_string());
    }
    if let Some(v) = lookup("HARMONY_KEEP_COMMON_TONES").and_then(|v| parse_bool(&v)) {
        voicing.keep_common_tones = v;
        sources.env_overrides.push("HARMONY_KEEP_COMMON_TONES".to_string());
    }
    if let Some(v) = lookup("HARMONY_BASS_STRATEGY").and_then(|v| parse_bass_strategy(&v)) {
        voicing.bass_strategy = v;
        sources.env_overrides.push("HARMONY_BASS_STRATEGY".to_string());
    }

    if let Some(v) = lookup("HARMONY_LOG_LEVEL") {
        config.log_level = v;
        sources.env_overrides.push("HARMONY_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bass_strategy(value: &str) -> Option<BassStrategy> {
    match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "follow_root" => Some(BassStrategy::FollowRoot),
        "minimal_motion" => Some(BassStrategy::MinimalMotion),
        _ => None,
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(stripped) => directories::BaseDirs::new()
            .map(|d| d.home_dir().join(stripped))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn table(toml: &str) -> toml::Table {
        parse_toml(toml, Path::new("test.toml")).unwrap()
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/music/harmony.toml");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().ends_with("music/harmony.toml"));
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/etc/harmony.toml"), PathBuf::from("/etc/harmony.toml"));
    }

    #[test]
    fn test_cli_path_replaces_local() {
        let files = discover_config_files_with_override(Some(Path::new("/nonexistent/voicer.toml")));
        assert_eq!(files.last(), Some(&PathBuf::from("/nonexistent/voicer.toml")));
        assert!(!files.contains(&PathBuf::from("harmony.toml")));
    }

    #[test]
    fn test_parse_partial_toml() {
        let t = table(
            r#"
[voicing]
max_voices = 3
"#,
        );
        let config = into_config(t, Path::new("test.toml")).unwrap();
        assert_eq!(config.voicing.max_voices, 3);
        assert_eq!(config.voicing.base_octave, 4);
        assert_eq!(config.performance.velocity, 100);
    }

    #[test]
    fn test_parse_full_toml() {
        let t = table(
            r#"
log_level = "debug"

[voicing]
base_octave = 3
bass_octave = 1
max_voices = 5
min_note = 36
max_note = 96
tone_priority = ["3", "7", "root", "9", "5"]
bass_strategy = "minimal_motion"
keep_common_tones = true
voicing = "drop2"

[performance]
velocity = 90
channel = 10
duration = 2.0
"#,
        );
        let config = into_config(t, Path::new("test.toml")).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.voicing.bass_octave, Some(1));
        assert_eq!(config.voicing.tone_priority.len(), 5);
        assert_eq!(config.voicing.bass_strategy, BassStrategy::MinimalMotion);
        assert_eq!(config.voicing.voicing, harmony::Voicing::Drop2);
        assert!(config.voicing.keep_common_tones);
        assert_eq!(config.performance.channel, 10);
        assert_eq!(config.performance.duration, Some(2.0));
    }

    #[test]
    fn test_bad_types_name_the_file() {
        let err = parse_toml("[voicing]\nmax_voices = \"four\"\n", Path::new("bad.toml")).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, PathBuf::from("bad.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_only_touches_named_keys() {
        let mut base = table("[voicing]\nmax_voices = 3\nbase_octave = 5\n");
        merge_tables(&mut base, table("[voicing]\nbase_octave = 2\n[performance]\nchannel = 4\n"));

        let config = into_config(base, Path::new("merged")).unwrap();
        assert_eq!(config.voicing.max_voices, 3);
        assert_eq!(config.voicing.base_octave, 2);
        assert_eq!(config.performance.channel, 4);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HARMONY_MAX_VOICES", "3"),
            ("HARMONY_KEEP_COMMON_TONES", "yes"),
            ("HARMONY_BASS_STRATEGY", "minimal-motion"),
            ("HARMONY_MIN_NOTE", "not a number"),
            ("RUST_LOG", "harmony=trace"),
        ]
        .into_iter()
        .collect();

        let mut config = HarmonyConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(&mut config, &mut sources, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.voicing.max_voices, 3);
        assert!(config.voicing.keep_common_tones);
        assert_eq!(config.voicing.bass_strategy, BassStrategy::MinimalMotion);
        assert_eq!(config.voicing.min_note, 0);
        assert_eq!(config.log_level, "harmony=trace");
        assert_eq!(
            sources.env_overrides,
            vec![
                "HARMONY_MAX_VOICES",
                "HARMONY_KEEP_COMMON_TONES",
                "HARMONY_BASS_STRATEGY",
                "RUST_LOG"
            ]
        );
    }
}
