//! voicer - chord spelling and voice leading from the command line
//!
//! Subcommands:
//! - `voicer lead [FILE]` - Voice-lead a progression of chord specs
//! - `voicer render [FILE]` - Render each chord as a block chord
//! - `voicer build [FILE]` - Spell each chord, reporting invalid specs
//! - `voicer config` - Show the effective configuration
//!
//! Input is a JSON array of chord specs, read from FILE or stdin.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use harmony::{BassStrategy, Voicing};
use harmonyconf::{HarmonyConfig, VoicingConfig};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "voicer")]
#[command(about = "Chord spelling and voice leading to MIDI")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./harmony.toml
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Voice-lead a progression with stable voice slots
    Lead {
        /// JSON file of chord specs (default: stdin)
        input: Option<PathBuf>,

        #[command(flatten)]
        overrides: LeadArgs,

        /// Print synth-ready note lists instead of voicings
        #[arg(long)]
        perform: bool,
    },

    /// Render each chord independently as a block chord
    Render {
        /// JSON file of chord specs (default: stdin)
        input: Option<PathBuf>,

        #[arg(long, value_enum)]
        voicing: Option<VoicingArg>,

        #[arg(long, allow_negative_numbers = true)]
        base_octave: Option<i32>,

        #[arg(long, allow_negative_numbers = true)]
        bass_octave: Option<i32>,

        /// Print synth-ready note lists instead of voicings
        #[arg(long)]
        perform: bool,
    },

    /// Spell each chord; invalid specs are reported, not fatal
    Build {
        /// JSON file of chord specs (default: stdin)
        input: Option<PathBuf>,
    },

    /// Print the effective configuration and where it came from
    Config,
}

/// Command-line overrides for the `[voicing]` config section.
#[derive(Args)]
struct LeadArgs {
    #[arg(long, allow_negative_numbers = true)]
    base_octave: Option<i32>,

    #[arg(long, allow_negative_numbers = true)]
    bass_octave: Option<i32>,

    #[arg(long)]
    max_voices: Option<usize>,

    #[arg(long)]
    min_note: Option<u8>,

    #[arg(long)]
    max_note: Option<u8>,

    #[arg(long, value_enum)]
    bass_strategy: Option<BassStrategyArg>,

    /// Hold shared pitch classes in their voices
    #[arg(long)]
    keep_common_tones: bool,

    #[arg(long)]
    allow_voice_crossing: bool,
}

impl LeadArgs {
    fn apply(&self, voicing: &mut VoicingConfig) {
        if let Some(v) = self.base_octave {
            voicing.base_octave = v;
        }
        if let Some(v) = self.bass_octave {
            voicing.bass_octave = Some(v);
        }
        if let Some(v) = self.max_voices {
            voicing.max_voices = v;
        }
        if let Some(v) = self.min_note {
            voicing.min_note = v;
        }
        if let Some(v) = self.max_note {
            voicing.max_note = v;
        }
        if let Some(v) = self.bass_strategy {
            voicing.bass_strategy = v.into();
        }
        if self.keep_common_tones {
            voicing.keep_common_tones = true;
        }
        if self.allow_voice_crossing {
            voicing.allow_voice_crossing = true;
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BassStrategyArg {
    FollowRoot,
    MinimalMotion,
}

impl From<BassStrategyArg> for BassStrategy {
    fn from(arg: BassStrategyArg) -> Self {
        match arg {
            BassStrategyArg::FollowRoot => BassStrategy::FollowRoot,
            BassStrategyArg::MinimalMotion => BassStrategy::MinimalMotion,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum VoicingArg {
    Close,
    Drop2,
    Drop3,
}

impl From<VoicingArg> for Voicing {
    fn from(arg: VoicingArg) -> Self {
        match arg {
            VoicingArg::Close => Voicing::Close,
            VoicingArg::Drop2 => Voicing::Drop2,
            VoicingArg::Drop3 => Voicing::Drop3,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().map(harmonyconf::expand_path);
    let (mut config, sources) = HarmonyConfig::load_with_sources_from(config_path.as_deref())
        .context("Failed to load configuration")?;

    // stdout carries JSON, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Lead {
            input,
            overrides,
            perform,
        } => {
            overrides.apply(&mut config.voicing);
            config.validate()?;
            let specs = commands::read_specs(input.as_deref())?;
            commands::lead(&specs, &config, perform)?;
        }
        Commands::Render {
            input,
            voicing,
            base_octave,
            bass_octave,
            perform,
        } => {
            if let Some(v) = voicing {
                config.voicing.voicing = v.into();
            }
            if let Some(v) = base_octave {
                config.voicing.base_octave = v;
            }
            if let Some(v) = bass_octave {
                config.voicing.bass_octave = Some(v);
            }
            config.validate()?;
            let specs = commands::read_specs(input.as_deref())?;
            commands::render(&specs, &config, perform)?;
        }
        Commands::Build { input } => {
            let specs = commands::read_specs(input.as_deref())?;
            commands::build(&specs)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}
