//! Audio output streams.
//!
//! The mixer drives a blocking, callback-pulled stream: the backend calls
//! the supplied closure once per period, and the closure returns whether to
//! keep streaming. Device output goes through cpal behind the `speakers`
//! feature; the null and capture outputs cover headless runs and tests.

/// One period's worth of interleaved samples is filled per callback. The
/// callback returns false to end the stream.
pub type PeriodCallback<'a> = dyn FnMut(&mut [f32]) -> bool + 'a;

/// A blocking stream sink. `stream` returns once the callback asks to stop.
pub trait OutputStream: Send {
    fn stream(&mut self, channels: usize, sample_rate: u32, period_frames: usize, callback: &mut PeriodCallback);
}

/// Discards the mixed audio while pacing callbacks at real time, so a
/// headless run behaves like one with a sound card.
pub struct NullOutput;

impl OutputStream for NullOutput {
    fn stream(&mut self, channels: usize, sample_rate: u32, period_frames: usize, callback: &mut PeriodCallback) {
        let mut period = vec![0.0f32; period_frames * channels];
        let period_duration = std::time::Duration::from_secs_f64(period_frames as f64 / sample_rate as f64);
        loop {
            period.fill(0.0);
            if !callback(&mut period) {
                return;
            }
            std::thread::sleep(period_duration);
        }
    }
}

/// Collects every mixed period into memory, without pacing. Used by tests
/// to observe exactly what the mixer produced.
pub struct CaptureOutput {
    pub periods: std::sync::Arc<std::sync::Mutex<Vec<Vec<f32>>>>,
    /// Stop after this many periods even if the callback wants to continue.
    pub max_periods: usize,
}

impl OutputStream for CaptureOutput {
    fn stream(&mut self, channels: usize, _sample_rate: u32, period_frames: usize, callback: &mut PeriodCallback) {
        for _ in 0..self.max_periods {
            let mut period = vec![0.0f32; period_frames * channels];
            let keep_going = callback(&mut period);
            self.periods.lock().unwrap().push(period);
            if !keep_going {
                return;
            }
        }
    }
}

#[cfg(feature = "speakers")]
pub use device::SpeakerOutput;

#[cfg(feature = "speakers")]
mod device {
    use super::{OutputStream, PeriodCallback};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::mpsc;

    /// Streams periods to the default output device through cpal.
    ///
    /// cpal pushes samples from its own real-time thread, so the blocking
    /// contract is adapted with a bounded channel: the mixer thread fills
    /// periods ahead while the device callback drains them.
    pub struct SpeakerOutput;

    impl OutputStream for SpeakerOutput {
        fn stream(&mut self, channels: usize, sample_rate: u32, period_frames: usize, callback: &mut PeriodCallback) {
            let host = cpal::default_host();
            let Some(device) = host.default_output_device() else {
                log::error!("no audio output device available");
                return;
            };
            let config = cpal::StreamConfig {
                channels: channels as u16,
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };
            let (period_sender, period_receiver) = mpsc::sync_channel::<Vec<f32>>(2);
            let mut pending: Vec<f32> = Vec::new();
            let mut pending_offset = 0;
            let stream = match device.build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    let mut filled = 0;
                    while filled < data.len() {
                        if pending_offset >= pending.len() {
                            match period_receiver.try_recv() {
                                Ok(period) => {
                                    pending = period;
                                    pending_offset = 0;
                                }
                                Err(_) => {
                                    data[filled..].fill(0.0);
                                    return;
                                }
                            }
                        }
                        let available = pending.len() - pending_offset;
                        let wanted = data.len() - filled;
                        let taken = available.min(wanted);
                        data[filled..filled + taken]
                            .copy_from_slice(&pending[pending_offset..pending_offset + taken]);
                        pending_offset += taken;
                        filled += taken;
                    }
                },
                |error| log::error!("audio stream error: {error}"),
                None,
            ) {
                Ok(stream) => stream,
                Err(error) => {
                    log::error!("failed to open the audio stream: {error}");
                    return;
                }
            };
            if let Err(error) = stream.play() {
                log::error!("failed to start the audio stream: {error}");
                return;
            }
            loop {
                let mut period = vec![0.0f32; period_frames * channels];
                let keep_going = callback(&mut period);
                // Blocks while the device catches up, pacing the mixer.
                if period_sender.send(period).is_err() {
                    return;
                }
                if !keep_going {
                    return;
                }
            }
        }
    }
}
