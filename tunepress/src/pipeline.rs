//! Per-tune conversion pipeline
//!
//! One tune in, one MP3 out: abc2midi, then fluidsynth, then LAME, with the
//! intermediate MIDI and WAV removed once the MP3 exists. Stages run
//! strictly in order; any failure stops this tune and is reported by the
//! orchestrator without touching its siblings.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::notation;
use crate::services::{mp3_encoder, Abc2MidiClient, FluidSynthClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Sequential three-stage renderer for a single tune
pub struct ConversionPipeline {
    config: Arc<Config>,
    abc2midi: Abc2MidiClient,
    fluidsynth: FluidSynthClient,
}

impl ConversionPipeline {
    pub fn new(config: Arc<Config>) -> Self {
        let abc2midi = Abc2MidiClient::new(config.abc2midi.clone(), config.strict);
        let fluidsynth = FluidSynthClient::new(
            config.fluidsynth.clone(),
            config.sound_font.clone(),
            config.audio_driver.clone(),
        );
        Self {
            config,
            abc2midi,
            fluidsynth,
        }
    }

    /// Output filename stem for a tune: sanitized
    /// `"<4-digit zero-padded index> - <title>"`.
    ///
    /// Fails when the tune carries no parseable `X:` index; a missing title
    /// only degrades the stem.
    pub fn tune_stem(tune_abc: &str) -> Result<String> {
        let index = notation::tune_index(tune_abc).ok_or(Error::MissingIndex)?;
        let number: u32 = index
            .parse()
            .map_err(|_| Error::InvalidIndex(index.to_string()))?;
        let title = notation::tune_title(tune_abc).unwrap_or("Untitled");
        Ok(notation::sanitize_filename(&format!("{number:04} - {title}")))
    }

    /// Run the full chain for one tune, returning the MP3 path.
    pub async fn process_tune(&self, tune_abc: &str) -> Result<PathBuf> {
        let stem = Self::tune_stem(tune_abc)?;
        info!(stem = %stem, "Processing tune");

        let out = &self.config.output_dir;
        let midi_path = out.join(format!("{stem}.mid"));
        let wav_path = out.join(format!("{stem}.wav"));
        let mp3_path = out.join(format!("{stem}.mp3"));

        let midi = self.abc2midi.convert(tune_abc, &midi_path).await?;
        let wav = self.fluidsynth.render(&midi, &wav_path).await?;

        tokio::task::spawn_blocking({
            let wav = wav.clone();
            let mp3 = mp3_path.clone();
            move || -> Result<()> {
                let audio = mp3_encoder::read_wav(&wav)?;
                mp3_encoder::encode_mp3(&audio, &mp3)
            }
        })
        .await
        .map_err(|e| Error::Internal(format!("encode task failed: {}", e)))??;

        // Transient artifacts go away on the success path only; a failed tune
        // may leave its MIDI/WAV behind for inspection.
        tokio::fs::remove_file(&wav).await?;
        tokio::fs::remove_file(&midi).await?;

        debug!(mp3 = %mp3_path.display(), "Tune rendered");
        Ok(mp3_path)
    }
}
