//! Per-voice playback: a cursor over a sound buffer emitting sample blocks.

use crate::sound::buffer::SoundBuffer;
use crate::sound::envelope::{Envelope, EnvelopeSettings};

/// One playing voice. The mixer owns the active players and drives
/// [`SoundPlayer::next_samples`] once per period.
pub struct SoundPlayer {
    pub(crate) buffer: SoundBuffer,
    pub(crate) sound_index: usize,
    pub(crate) player_id: i64,
    pub(crate) repeat: bool,
    pub(crate) sustained: bool,
    /// Playback position in frames.
    pub(crate) cursor: usize,
    /// True iff the corresponding volume is not 1.0.
    pub(crate) fade_left: bool,
    pub(crate) fade_right: bool,
    pub(crate) left_volume: f32,
    pub(crate) right_volume: f32,
    pub(crate) envelope: Envelope,
}

impl SoundPlayer {
    pub fn new(
        buffer: SoundBuffer,
        sound_index: usize,
        player_id: i64,
        repeat: bool,
        start_frame: usize,
        left_volume: f32,
        right_volume: f32,
        envelope_settings: EnvelopeSettings,
    ) -> SoundPlayer {
        let frames = buffer.samples_per_channel().max(1);
        SoundPlayer {
            cursor: start_frame % frames,
            buffer,
            sound_index,
            player_id,
            repeat,
            sustained: true,
            fade_left: !(0.9999..=1.0001).contains(&left_volume),
            fade_right: !(0.9999..=1.0001).contains(&right_volume),
            left_volume,
            right_volume,
            envelope: Envelope::new(envelope_settings),
        }
    }

    pub fn player_id(&self) -> i64 {
        self.player_id
    }

    pub fn sound_index(&self) -> usize {
        self.sound_index
    }

    /// Emit `frames` frames into `target` (interleaved, same channel count
    /// as the buffer) and advance the cursor.
    ///
    /// The part of the block inside the buffer is copied directly. Repeating
    /// players fill the rest with whole laps and a partial tail; one-shot
    /// players zero-fill the rest and release themselves. When an envelope
    /// is in use, every emitted sample is scaled by its per-sample output.
    pub fn next_samples(&mut self, target: &mut [f32], frames: usize, seconds_per_sample: f64) {
        let total_frames = self.buffer.samples_per_channel();
        let channels = self.buffer.channel_count();
        debug_assert!(target.len() >= frames * channels);
        let source = self.buffer.samples();
        if total_frames == 0 {
            target[..frames * channels].fill(0.0);
            self.sustained = false;
            return;
        }
        if self.cursor + frames > total_frames {
            let mut written = 0;
            // Samples still inside the buffer.
            let inside = total_frames - self.cursor;
            if inside > 0 {
                target[..inside * channels]
                    .copy_from_slice(&source[self.cursor * channels..(self.cursor + inside) * channels]);
                written = inside;
            }
            let mut outside = frames - inside;
            if self.repeat {
                // Whole laps of the sound, then a partial tail.
                while outside >= total_frames {
                    target[written * channels..(written + total_frames) * channels].copy_from_slice(source);
                    written += total_frames;
                    outside -= total_frames;
                }
                if outside > 0 {
                    target[written * channels..(written + outside) * channels]
                        .copy_from_slice(&source[..outside * channels]);
                }
            } else {
                target[written * channels..frames * channels].fill(0.0);
                self.sustained = false;
            }
        } else {
            target[..frames * channels]
                .copy_from_slice(&source[self.cursor * channels..(self.cursor + frames) * channels]);
        }
        self.cursor += frames;
        if self.repeat {
            while self.cursor >= total_frames {
                self.cursor -= total_frames;
            }
        }
        if self.envelope.settings().used {
            for frame in 0..frames {
                let volume = self.envelope.next_volume(self.sustained, seconds_per_sample) as f32;
                for channel in 0..channels {
                    target[frame * channels + channel] *= volume;
                }
            }
        }
    }

    /// A voice is finished when its envelope has faded out, or, without an
    /// envelope, as soon as it stops being sustained.
    pub fn finished(&self) -> bool {
        if self.envelope.settings().used {
            self.envelope.done()
        } else {
            !self.sustained
        }
    }
}
