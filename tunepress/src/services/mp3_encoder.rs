//! WAV to MP3 encoding with peak normalization
//!
//! Reads the synthesizer's WAV output, scales every sample so the measured
//! peak sits at full scale, and encodes through libmp3lame at 128 kbps.
//! All of this is blocking CPU work; callers run it on the blocking pool.

use crate::error::{Error, Result};
use hound::{SampleFormat, WavReader};
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, Quality};
use std::path::Path;

/// Interleaved f32 samples plus the header facts the encoder needs
pub struct WavAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Read a PCM WAV into interleaved f32 samples in [-1.0, 1.0].
///
/// Integer formats up to 32 bits and float WAVs are accepted; fluidsynth
/// emits 16-bit by default but the header decides.
pub fn read_wav(path: &Path) -> Result<WavAudio> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(WavAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Gain factor that brings the measured peak to full scale.
///
/// Equivalent to applying -max_dBFS of gain. A silent waveform has no peak
/// to move and gets unity gain.
pub fn normalization_gain(samples: &[f32]) -> f32 {
    let peak = samples.iter().fold(0.0f32, |max, s| max.max(s.abs()));
    if peak > 0.0 {
        1.0 / peak
    } else {
        1.0
    }
}

/// Normalize `audio` and write it to `mp3_path` as 128 kbps MP3.
pub fn encode_mp3(audio: &WavAudio, mp3_path: &Path) -> Result<()> {
    if audio.channels == 0 || audio.channels > 2 {
        return Err(Error::Encode(format!(
            "unsupported channel count: {}",
            audio.channels
        )));
    }

    let gain = normalization_gain(&audio.samples);
    let pcm: Vec<i16> = audio
        .samples
        .iter()
        .map(|s| ((s * gain).clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();

    let mut builder =
        Builder::new().ok_or_else(|| Error::Encode("failed to create LAME context".to_string()))?;
    builder
        .set_num_channels(audio.channels as u8)
        .map_err(|e| Error::Encode(format!("{:?}", e)))?;
    builder
        .set_sample_rate(audio.sample_rate)
        .map_err(|e| Error::Encode(format!("{:?}", e)))?;
    builder
        .set_brate(Bitrate::Kbps128)
        .map_err(|e| Error::Encode(format!("{:?}", e)))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| Error::Encode(format!("{:?}", e)))?;
    let mut encoder = builder.build().map_err(|e| Error::Encode(format!("{:?}", e)))?;

    let mut mp3: Vec<u8> = Vec::new();
    mp3.reserve(mp3lame_encoder::max_required_buffer_size(pcm.len()));

    let written = encoder
        .encode(InterleavedPcm(&pcm), mp3.spare_capacity_mut())
        .map_err(|e| Error::Encode(format!("{:?}", e)))?;
    // SAFETY: encode() initialized exactly `written` bytes of spare capacity.
    unsafe { mp3.set_len(mp3.len() + written) };

    // LAME's flush can emit up to 7200 bytes beyond the main stream.
    mp3.reserve(7200);
    let written = encoder
        .flush::<FlushNoGap>(mp3.spare_capacity_mut())
        .map_err(|e| Error::Encode(format!("{:?}", e)))?;
    // SAFETY: flush() initialized exactly `written` bytes of spare capacity.
    unsafe { mp3.set_len(mp3.len() + written) };

    std::fs::write(mp3_path, &mp3)?;

    tracing::debug!(
        mp3 = %mp3_path.display(),
        bytes = mp3.len(),
        gain = format!("{:.3}", gain),
        "MP3 written"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::tempdir;

    fn write_wav_i16(path: &Path, samples: &[i16], channels: u16) {
        let spec = WavSpec {
            channels,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn gain_brings_peak_to_full_scale() {
        let samples = vec![0.0, 0.25, -0.5, 0.1];
        let gain = normalization_gain(&samples);
        let peak = samples
            .iter()
            .fold(0.0f32, |max, s| max.max((s * gain).abs()));
        assert!((peak - 1.0).abs() < 1e-6);
    }

    #[test]
    fn silence_gets_unity_gain() {
        assert_eq!(normalization_gain(&[0.0, 0.0, 0.0]), 1.0);
        assert_eq!(normalization_gain(&[]), 1.0);
    }

    #[test]
    fn read_wav_scales_int_samples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("half.wav");
        write_wav_i16(&path, &[16_384, -16_384, 0], 1);

        let audio = read_wav(&path).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 44_100);
        assert_eq!(audio.samples.len(), 3);
        assert!((audio.samples[0] - 0.5).abs() < 1e-3);
        assert!((audio.samples[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn read_wav_missing_file_errors() {
        assert!(read_wav(Path::new("/nonexistent/render.wav")).is_err());
    }

    #[test]
    fn encode_writes_a_nonempty_mp3() {
        let dir = tempdir().unwrap();
        let mp3_path = dir.path().join("tone.mp3");

        // 100ms of quiet 440Hz so normalization has work to do
        let samples: Vec<f32> = (0..4_410)
            .map(|t| (t as f32 / 44_100.0 * 440.0 * std::f32::consts::TAU).sin() * 0.3)
            .collect();
        let audio = WavAudio {
            samples,
            sample_rate: 44_100,
            channels: 1,
        };

        encode_mp3(&audio, &mp3_path).unwrap();
        let bytes = std::fs::read(&mp3_path).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn encode_rejects_surround_audio() {
        let audio = WavAudio {
            samples: vec![0.0; 6],
            sample_rate: 44_100,
            channels: 6,
        };
        let err = encode_mp3(&audio, Path::new("/tmp/never.mp3")).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }
}
