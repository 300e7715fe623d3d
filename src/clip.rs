//! Audio clip handles
//!
//! A [`Clip`] is an immutable, cheaply cloneable reference to audio data.
//! Playback entities only ever hold clones of the handle; the samples are
//! shared.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "wav")]
use std::path::Path;

struct ClipData {
    name: String,
    duration: f32,
    sample_rate: u32,
    channels: u16,
    samples: Option<Arc<[f32]>>,
}

/// Shared handle to an immutable audio asset.
#[derive(Clone)]
pub struct Clip {
    inner: Arc<ClipData>,
}

impl Clip {
    /// Clip without sample data. Backends that need samples play silence
    /// for `duration` seconds.
    pub fn silent(name: impl Into<String>, duration: f32) -> Self {
        Self {
            inner: Arc::new(ClipData {
                name: name.into(),
                duration: duration.max(0.0),
                sample_rate: 44_100,
                channels: 1,
                samples: None,
            }),
        }
    }

    /// Clip from interleaved f32 samples.
    pub fn from_samples(
        name: impl Into<String>,
        sample_rate: u32,
        channels: u16,
        samples: Vec<f32>,
    ) -> crate::Result<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(crate::AudioPoolError::InvalidClip(format!(
                "sample rate {} / channels {} must be non-zero",
                sample_rate, channels
            )));
        }
        let frames = samples.len() / channels as usize;
        let duration = frames as f32 / sample_rate as f32;
        Ok(Self {
            inner: Arc::new(ClipData {
                name: name.into(),
                duration,
                sample_rate,
                channels,
                samples: Some(samples.into()),
            }),
        })
    }

    /// Decode a WAV file into a clip.
    ///
    /// Integer formats are normalized to `[-1.0, 1.0]`. The clip is named
    /// after the file stem.
    #[cfg(feature = "wav")]
    pub fn from_wav_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| crate::AudioPoolError::clip_load(&display, e.to_string()))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| crate::AudioPoolError::clip_load(&display, e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| crate::AudioPoolError::clip_load(&display, e.to_string()))?
            }
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| display.clone());
        Self::from_samples(name, spec.sample_rate, spec.channels, samples)
    }

    /// Clip name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Length in seconds.
    pub fn duration(&self) -> f32 {
        self.inner.duration
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    /// Interleaved samples, if the clip carries audio data.
    pub fn samples(&self) -> Option<&Arc<[f32]>> {
        self.inner.samples.as_ref()
    }

    /// True when both handles point at the same asset.
    pub fn ptr_eq(&self, other: &Clip) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Clip {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("name", &self.inner.name)
            .field("duration", &self.inner.duration)
            .field("has_samples", &self.inner.samples.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn duration_from_frames() {
        let clip = Clip::from_samples("tone", 100, 2, vec![0.0; 400]).unwrap();
        assert_relative_eq!(clip.duration(), 2.0);
        assert_eq!(clip.channels(), 2);
    }

    #[test]
    fn zero_channels_rejected() {
        assert!(Clip::from_samples("bad", 44_100, 0, vec![]).is_err());
    }

    #[test]
    fn clones_share_identity() {
        let a = Clip::silent("a", 1.0);
        let b = a.clone();
        let c = Clip::silent("a", 1.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[cfg(feature = "wav")]
    #[test]
    fn decodes_int_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..4_000 {
            writer.write_sample(i16::MAX).unwrap();
        }
        writer.finalize().unwrap();

        let clip = Clip::from_wav_file(&path).unwrap();
        assert_eq!(clip.name(), "click");
        assert_relative_eq!(clip.duration(), 0.5);
        let first = clip.samples().unwrap()[0];
        assert!(first > 0.99 && first <= 1.0);
    }
}
