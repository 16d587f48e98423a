//! MIDI to WAV rendering via fluidsynth
//!
//! Fast-render invocation: no shell, configured SoundFont, `-F` output file.
//! Unlike the notation converter, a non-zero exit here is a hard failure for
//! the tune; there is nothing optimistic about a synthesizer that gave up.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// fluidsynth subprocess wrapper
pub struct FluidSynthClient {
    binary: PathBuf,
    sound_font: PathBuf,
    audio_driver: String,
}

impl FluidSynthClient {
    pub fn new(binary: PathBuf, sound_font: PathBuf, audio_driver: String) -> Self {
        Self {
            binary,
            sound_font,
            audio_driver,
        }
    }

    /// Render `midi_path` to `wav_path` with the configured SoundFont.
    pub async fn render(&self, midi_path: &Path, wav_path: &Path) -> Result<PathBuf> {
        tracing::debug!(
            midi = %midi_path.display(),
            wav = %wav_path.display(),
            "Rendering MIDI to WAV"
        );

        let output = tokio::task::spawn_blocking({
            let binary = self.binary.clone();
            let sound_font = self.sound_font.clone();
            let driver = self.audio_driver.clone();
            let midi = midi_path.to_path_buf();
            let wav = wav_path.to_path_buf();

            move || {
                Command::new(&binary)
                    .arg("-i")
                    .arg(&sound_font)
                    .arg("-o")
                    .arg(format!("audio.driver={}", driver))
                    .arg(&midi)
                    .arg("-F")
                    .arg(&wav)
                    .output()
            }
        })
        .await
        .map_err(|e| Error::Internal(format!("fluidsynth task failed: {}", e)))??;

        if !output.status.success() {
            return Err(Error::Synthesis {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(wav_path.to_path_buf())
    }
}
