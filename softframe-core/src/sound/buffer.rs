//! Interleaved float PCM buffers.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("sound has {0} channels, only mono and stereo are supported")]
    UnsupportedChannelCount(u16),
    #[error("sound sample rate {sound} does not match the output rate {output}")]
    SampleRateMismatch { sound: u32, output: u32 },
    #[error("sound file error: {0}")]
    File(#[from] hound::Error),
    #[error("sound index {0} does not exist")]
    UnknownSound(usize),
}

/// Immutable interleaved PCM data shared between the mixer thread and the
/// application.
#[derive(Clone, Debug)]
pub struct SoundBuffer {
    samples: Arc<[f32]>,
    samples_per_channel: usize,
    channel_count: usize,
    sample_rate: u32,
}

impl SoundBuffer {
    /// Wrap interleaved samples. The sample count is truncated down to a
    /// whole number of frames.
    pub fn from_samples(samples: Vec<f32>, channel_count: usize, sample_rate: u32) -> SoundBuffer {
        let channel_count = channel_count.max(1);
        let samples_per_channel = samples.len() / channel_count;
        let mut samples = samples;
        samples.truncate(samples_per_channel * channel_count);
        SoundBuffer {
            samples: samples.into(),
            samples_per_channel,
            channel_count,
            sample_rate,
        }
    }

    /// Generate `samples_per_channel` frames from `f(channel, index) -> f32`.
    pub fn generate(
        samples_per_channel: usize,
        channel_count: usize,
        sample_rate: u32,
        f: impl Fn(usize, usize) -> f32,
    ) -> SoundBuffer {
        let channel_count = channel_count.max(1);
        let mut samples = vec![0.0; samples_per_channel * channel_count];
        for index in 0..samples_per_channel {
            for channel in 0..channel_count {
                samples[index * channel_count + channel] = f(channel, index);
            }
        }
        SoundBuffer::from_samples(samples, channel_count, sample_rate)
    }

    /// Decode a WAV file into float PCM.
    pub fn load_wav(path: &Path) -> Result<SoundBuffer, SoundError> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.channels == 0 || spec.channels > 2 {
            return Err(SoundError::UnsupportedChannelCount(spec.channels));
        }
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };
        Ok(SoundBuffer::from_samples(samples, spec.channels as usize, spec.sample_rate))
    }

    /// Encode into a 32-bit float WAV file.
    pub fn save_wav(&self, path: &Path) -> Result<(), SoundError> {
        let spec = hound::WavSpec {
            channels: self.channel_count as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in self.samples.iter() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_channel
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    fn frame_value(&self, frame: usize, channel: usize) -> f32 {
        self.samples[frame * self.channel_count + channel]
    }

    fn sample_linear(&self, left_frame: usize, right_frame: usize, ratio: f64, channel: usize) -> f32 {
        let a = self.frame_value(left_frame, channel);
        let b = self.frame_value(right_frame, channel);
        (b as f64 * ratio + a as f64 * (1.0 - ratio)) as f32
    }

    /// Linear interpolation at a fractional frame index, clamping at the
    /// ends.
    pub fn sample_linear_clamped(&self, location: f64, channel: usize) -> f32 {
        if self.samples_per_channel == 0 {
            return 0.0;
        }
        let truncated = location.max(0.0) as usize;
        let floor = truncated.min(self.samples_per_channel - 1);
        let ceiling = (floor + 1).min(self.samples_per_channel - 1);
        self.sample_linear(floor, ceiling, location.max(0.0) - truncated as f64, channel)
    }

    /// Linear interpolation at a fractional frame index, wrapping around the
    /// end for looping sounds.
    pub fn sample_linear_cyclic(&self, location: f64, channel: usize) -> f32 {
        if self.samples_per_channel == 0 {
            return 0.0;
        }
        let truncated = location.max(0.0) as usize;
        let floor = truncated % self.samples_per_channel;
        let mut ceiling = floor + 1;
        if ceiling == self.samples_per_channel {
            ceiling = 0;
        }
        self.sample_linear(floor, ceiling, location.max(0.0) - truncated as f64, channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_interleaves_channels() {
        let buffer = SoundBuffer::generate(3, 2, 44100, |channel, index| {
            if channel == 0 { index as f32 } else { -(index as f32) }
        });
        assert_eq!(buffer.samples_per_channel(), 3);
        assert_eq!(buffer.samples(), &[0.0, 0.0, 1.0, -1.0, 2.0, -2.0]);
    }

    #[test]
    fn linear_sampling_interpolates_and_clamps() {
        let buffer = SoundBuffer::from_samples(vec![0.0, 1.0, 0.0], 1, 44100);
        assert_eq!(buffer.sample_linear_clamped(0.5, 0), 0.5);
        assert_eq!(buffer.sample_linear_clamped(10.0, 0), 0.0);
        // Cyclic wraps the last interval back to the first frame.
        assert_eq!(buffer.sample_linear_cyclic(2.5, 0), 0.0);
        assert_eq!(buffer.sample_linear_cyclic(1.5, 0), 0.5);
    }

    #[test]
    fn wav_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let original = SoundBuffer::generate(64, 2, 44100, |channel, index| {
            ((index * (channel + 1)) as f32 * 0.1).sin() * 0.5
        });
        original.save_wav(&path).unwrap();
        let loaded = SoundBuffer::load_wav(&path).unwrap();
        assert_eq!(loaded.channel_count(), 2);
        assert_eq!(loaded.sample_rate(), 44100);
        assert_eq!(loaded.samples_per_channel(), 64);
        for (a, b) in original.samples().iter().zip(loaded.samples()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
