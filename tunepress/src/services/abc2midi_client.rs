//! ABC to MIDI conversion via the abc2midi command-line tool
//!
//! The tune text is fed on stdin; diagnostics arrive on stderr. abc2midi
//! exits zero for most complaints, so the exit status is not consulted.
//! What happens to a non-empty stderr is the diagnostic policy's call:
//! lenient logs it and carries on, strict fails the tune.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Rendering flags passed to every invocation: barfly mode, A=440 reference
/// pitch, expanded accompaniment.
const ABC2MIDI_FLAGS: [&str; 4] = ["-BF", "-TT", "440", "-EA"];

/// abc2midi subprocess wrapper
pub struct Abc2MidiClient {
    binary: PathBuf,
    strict: bool,
}

impl Abc2MidiClient {
    pub fn new(binary: PathBuf, strict: bool) -> Self {
        Self { binary, strict }
    }

    /// Convert one tune to `midi_path`.
    ///
    /// In lenient mode the nominal output path is returned even when
    /// abc2midi grumbles; a missing or broken MIDI file then surfaces in the
    /// synthesis stage instead.
    pub async fn convert(&self, tune_abc: &str, midi_path: &Path) -> Result<PathBuf> {
        tracing::debug!(midi = %midi_path.display(), "Converting tune to MIDI");

        let output = tokio::task::spawn_blocking({
            let binary = self.binary.clone();
            let midi = midi_path.to_path_buf();
            let tune = tune_abc.to_owned();

            move || -> std::io::Result<std::process::Output> {
                let mut child = Command::new(&binary)
                    .arg("-")
                    .arg("-o")
                    .arg(&midi)
                    .args(ABC2MIDI_FLAGS)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()?;

                if let Some(mut stdin) = child.stdin.take() {
                    stdin.write_all(tune.as_bytes())?;
                    // Dropping stdin closes the pipe so abc2midi sees EOF.
                }
                child.wait_with_output()
            }
        })
        .await
        .map_err(|e| Error::Internal(format!("abc2midi task failed: {}", e)))??;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics = stderr.trim();
        if !diagnostics.is_empty() {
            if self.strict {
                return Err(Error::Notation(diagnostics.to_string()));
            }
            tracing::warn!(
                midi = %midi_path.display(),
                diagnostics = %diagnostics,
                "abc2midi reported diagnostics, continuing"
            );
        }

        Ok(midi_path.to_path_buf())
    }
}
