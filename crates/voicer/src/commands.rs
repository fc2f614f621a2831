use anyhow::{Context, Result};
use harmony::{
    build_chord, render_chord_sequence, to_performance_output, voice_lead, Chord, ChordSpec,
    ErrorReport, HarmonyError, MidiChord,
};
use harmonyconf::{ConfigSources, HarmonyConfig};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Read a JSON array of chord specs from `input`, or stdin for `None` / `-`.
pub fn read_specs(input: Option<&Path>) -> Result<Vec<ChordSpec>> {
    let text = match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    serde_json::from_str(&text).context("Input must be a JSON array of chord specs")
}

pub fn lead(specs: &[ChordSpec], config: &HarmonyConfig, perform: bool) -> Result<()> {
    let options = config.voicing.lead_options();
    let chords = voice_lead(specs, &options).context("Voice leading failed")?;
    info!(
        chords = chords.len(),
        max_voices = options.max_voices,
        "voice-led progression"
    );
    emit(&chords, config, perform)
}

pub fn render(specs: &[ChordSpec], config: &HarmonyConfig, perform: bool) -> Result<()> {
    let chords = render_chord_sequence(specs, &config.voicing.render_options())
        .context("Rendering failed")?;
    info!(chords = chords.len(), "rendered block chords");
    emit(&chords, config, perform)
}

fn emit(chords: &[MidiChord], config: &HarmonyConfig, perform: bool) -> Result<()> {
    if perform {
        print_json(&to_performance_output(chords, &config.performance.options()))
    } else {
        print_json(&chords)
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum BuildOutcome {
    Chord(Chord),
    Invalid(ErrorReport),
}

/// Spell every spec. Validation failures are printed in place; anything
/// else aborts.
pub fn build(specs: &[ChordSpec]) -> Result<()> {
    let mut outcomes = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        let outcome = match build_chord(spec) {
            Ok(chord) => BuildOutcome::Chord(chord),
            Err(HarmonyError::InvalidChord(err)) => {
                info!(index, code = %err.code(), "invalid chord spec");
                BuildOutcome::Invalid(err.report())
            }
            Err(err) => return Err(err).with_context(|| format!("Chord {} failed", index)),
        };
        outcomes.push(outcome);
    }

    print_json(&outcomes)
}

pub fn show_config(config: &HarmonyConfig, sources: &ConfigSources) {
    print!("{}", config.to_toml());

    println!("\n# Sources");
    if sources.files.is_empty() {
        println!("# (defaults only)");
    }
    for file in &sources.files {
        println!("# file: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# env: {}", var);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
