//! Configuration resolution for tunepress
//!
//! Every knob resolves with the same priority: command line > environment
//! variable > TOML config file > built-in default. clap's `env` fallback
//! covers the first two tiers; the TOML layer is merged by hand. The result
//! is one plain `Config` struct handed to the orchestrator, so tests can
//! substitute anything without touching globals.

use crate::error::{Error, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Worker pool width when nothing else is configured
pub const DEFAULT_WORKERS: usize = 15;

/// Tempo stamped into every tune's `Q:` directive
pub const DEFAULT_TEMPO_BPM: u32 = 140;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "tunepress",
    about = "Batch-render an ABC tunebook into peak-normalized MP3s",
    version
)]
pub struct Args {
    /// ABC source document
    #[arg(env = "TUNEPRESS_SOURCE")]
    pub source: Option<PathBuf>,

    /// Directory receiving the rendered MP3s
    #[arg(long, env = "TUNEPRESS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// abc2midi executable
    #[arg(long, env = "TUNEPRESS_ABC2MIDI")]
    pub abc2midi: Option<PathBuf>,

    /// fluidsynth executable
    #[arg(long, env = "TUNEPRESS_FLUIDSYNTH")]
    pub fluidsynth: Option<PathBuf>,

    /// SoundFont (.sf2) used for synthesis
    #[arg(long, env = "TUNEPRESS_SOUND_FONT")]
    pub sound_font: Option<PathBuf>,

    /// fluidsynth audio.driver setting
    #[arg(long, env = "TUNEPRESS_AUDIO_DRIVER")]
    pub audio_driver: Option<String>,

    /// Tempo in beats per minute
    #[arg(long, env = "TUNEPRESS_TEMPO")]
    pub tempo: Option<u32>,

    /// Concurrent tune conversions
    #[arg(long, env = "TUNEPRESS_WORKERS")]
    pub workers: Option<usize>,

    /// Treat abc2midi diagnostics as fatal for the tune
    #[arg(long, env = "TUNEPRESS_STRICT")]
    pub strict: bool,

    /// TOML config file (default: ./tunepress.toml when present)
    #[arg(long, env = "TUNEPRESS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// TOML config file layer; every field optional
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub source: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub abc2midi: Option<PathBuf>,
    pub fluidsynth: Option<PathBuf>,
    pub sound_font: Option<PathBuf>,
    pub audio_driver: Option<String>,
    pub tempo_bpm: Option<u32>,
    pub workers: Option<usize>,
    pub strict: Option<bool>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub abc2midi: PathBuf,
    pub fluidsynth: PathBuf,
    pub sound_font: PathBuf,
    pub audio_driver: String,
    pub tempo_bpm: u32,
    pub workers: usize,
    pub strict: bool,
}

impl Config {
    /// Merge CLI/env values over the TOML layer over defaults.
    ///
    /// The sound font has no sensible default and must come from somewhere.
    pub fn resolve(args: Args) -> Result<Self> {
        let file = load_toml_layer(args.config.as_deref())?;

        let sound_font = args.sound_font.or(file.sound_font).ok_or_else(|| {
            Error::Config(
                "sound font not configured. Provide one of:\n\
                 1. Command line: --sound-font /path/to/font.sf2\n\
                 2. Environment: TUNEPRESS_SOUND_FONT=/path/to/font.sf2\n\
                 3. TOML config: sound_font = \"/path/to/font.sf2\""
                    .to_string(),
            )
        })?;

        Ok(Self {
            source: args
                .source
                .or(file.source)
                .unwrap_or_else(|| PathBuf::from("songs.abc")),
            output_dir: args
                .output_dir
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from("output")),
            abc2midi: args
                .abc2midi
                .or(file.abc2midi)
                .unwrap_or_else(|| PathBuf::from("abc2midi")),
            fluidsynth: args
                .fluidsynth
                .or(file.fluidsynth)
                .unwrap_or_else(|| PathBuf::from("fluidsynth")),
            sound_font,
            audio_driver: args
                .audio_driver
                .or(file.audio_driver)
                .unwrap_or_else(|| "file".to_string()),
            tempo_bpm: args.tempo.or(file.tempo_bpm).unwrap_or(DEFAULT_TEMPO_BPM),
            // A zero-width pool would deadlock the batch before it starts.
            workers: args
                .workers
                .or(file.workers)
                .unwrap_or(DEFAULT_WORKERS)
                .max(1),
            strict: args.strict || file.strict.unwrap_or(false),
        })
    }

    /// The fixed directive set inserted after every tune header, in order.
    ///
    /// Values are MIDI controller/program numbers; only the closing `Q:`
    /// tempo line varies with configuration.
    pub fn midi_directives(&self) -> Vec<String> {
        vec![
            "%%MIDI control 7 96".to_string(),  // channel volume
            "%%MIDI control 10 64".to_string(), // pan to center
            "%%MIDI gchordon".to_string(),
            "%%MIDI program 46".to_string(),
            "%%MIDI chordprog 24".to_string(),
            "%%MIDI bassprog 24".to_string(),
            "%%MIDI chordvol 73".to_string(),
            "%%MIDI bassvol 73".to_string(),
            "%%MIDI control 7 91".to_string(),
            format!("Q:1/4 ={}", self.tempo_bpm),
        ]
    }
}

/// Read the TOML layer.
///
/// An explicitly named file must exist; the implicit `tunepress.toml` is
/// optional and silently skipped when absent.
fn load_toml_layer(path: Option<&Path>) -> Result<TomlConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from("tunepress.toml"), false),
    };

    if !path.exists() {
        if explicit {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("parse {} failed: {}", path.display(), e)))
}
