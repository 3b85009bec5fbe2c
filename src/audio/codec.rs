use std::fmt::Debug;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::audio::PcmBuffer;
use crate::errors::AudioError;

// @module: Audio codecs

/// Container format of an encoded buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

/// Decodes encoded bytes into PCM and encodes PCM back
pub trait AudioCodec: Send + Sync + Debug {
    /// Decode an encoded buffer
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer, AudioError>;

    /// Encode PCM; lossless codecs ignore the bitrate
    fn encode(&self, pcm: &PcmBuffer, bitrate_kbps: u32) -> Result<Vec<u8>, AudioError>;

    /// Format produced by `encode`
    fn format(&self) -> AudioFormat;
}

/// 16-bit PCM WAV, fully in memory
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl AudioCodec for WavCodec {
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer, AudioError> {
        let reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| AudioError::Decode(format!("invalid WAV data: {}", e)))?;
        let spec = reader.spec();

        let samples = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, _) => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            (hound::SampleFormat::Int, 8) => reader
                .into_samples::<i8>()
                .map(|s| s.map(|v| v as f32 / i8::MAX as f32))
                .collect::<Result<Vec<_>, _>>()?,
            (hound::SampleFormat::Int, 16) => reader
                .into_samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<Result<Vec<_>, _>>()?,
            (hound::SampleFormat::Int, 24) => reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / (1 << 23) as f32))
                .collect::<Result<Vec<_>, _>>()?,
            (hound::SampleFormat::Int, 32) => reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
                .collect::<Result<Vec<_>, _>>()?,
            (_, bits) => {
                return Err(AudioError::Decode(format!("unsupported bit depth: {}", bits)));
            }
        };

        Ok(PcmBuffer::new(spec.sample_rate, spec.channels, samples))
    }

    fn encode(&self, pcm: &PcmBuffer, _bitrate_kbps: u32) -> Result<Vec<u8>, AudioError> {
        let spec = hound::WavSpec {
            channels: pcm.channels,
            sample_rate: pcm.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in &pcm.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer.write_sample(value)?;
        }
        writer.finalize()?;
        Ok(cursor.into_inner())
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Wav
    }
}

/// MP3 through an ffmpeg binary, using temporary files
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    // @field: ffmpeg executable
    binary: PathBuf,
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegCodec {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(["-v", "error", "-y"]);
        command
    }

    fn run(&self, mut command: Command) -> Result<(), String> {
        let output = command
            .output()
            .map_err(|e| format!("failed to execute {}: {}", self.binary.display(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("ffmpeg failed: {}", stderr.trim());
            return Err(stderr.trim().to_string());
        }
        Ok(())
    }
}

impl AudioCodec for FfmpegCodec {
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer, AudioError> {
        if bytes.is_empty() {
            return Err(AudioError::Decode("no audio data".to_string()));
        }

        let input = tempfile::Builder::new().suffix(".bin").tempfile()?;
        std::fs::write(input.path(), bytes)?;
        let output = tempfile::Builder::new().suffix(".wav").tempfile()?;

        let mut command = self.command();
        command
            .arg("-i").arg(input.path())
            .args(["-f", "wav", "-acodec", "pcm_s16le"])
            .arg(output.path());
        self.run(command).map_err(AudioError::Decode)?;

        let wav = std::fs::read(output.path())?;
        debug!("ffmpeg decoded {} bytes into {} bytes of WAV", bytes.len(), wav.len());
        WavCodec.decode(&wav)
    }

    fn encode(&self, pcm: &PcmBuffer, bitrate_kbps: u32) -> Result<Vec<u8>, AudioError> {
        let input = tempfile::Builder::new().suffix(".wav").tempfile()?;
        std::fs::write(input.path(), WavCodec.encode(pcm, bitrate_kbps)?)?;
        let output = tempfile::Builder::new().suffix(".mp3").tempfile()?;
        let bitrate = format!("{}k", bitrate_kbps);

        let mut command = self.command();
        command
            .arg("-i").arg(input.path())
            .args(["-codec:a", "libmp3lame", "-b:a", bitrate.as_str(), "-f", "mp3"])
            .arg(output.path());
        self.run(command).map_err(AudioError::Encode)?;

        Ok(std::fs::read(output.path())?)
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }
}
