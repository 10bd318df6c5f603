//! The real-time mixer: a registry of sounds, a lock-protected set of
//! active players, and a background thread summing voices into stereo
//! output periods.

use crate::base::simd::{F32_LANES, F32x4};
use crate::base::virtual_stack::StackAllocation;
use crate::sound::buffer::{SoundBuffer, SoundError};
use crate::sound::envelope::EnvelopeSettings;
use crate::sound::output::OutputStream;
use crate::sound::player::SoundPlayer;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const MAX_CHANNELS: usize = 2;
const OUTPUT_CHANNELS: usize = 2;
pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;
/// Fixed frames per mixing callback, independent of the hardware period, so
/// SIMD padding and context switches stay cheap.
pub const PERIOD_FRAMES: usize = 1024;

struct RegisteredSound {
    buffer: SoundBuffer,
    name: String,
    from_file: bool,
}

struct MixerState {
    sounds: Vec<RegisteredSound>,
    players: Vec<SoundPlayer>,
    next_player_id: i64,
}

/// Handle to the mixer engine. Clones share the same engine; control
/// operations may be called from any thread.
#[derive(Clone)]
pub struct SoundEngine {
    state: Arc<Mutex<MixerState>>,
    running: Arc<AtomicBool>,
    worker: Arc<Mutex<Option<std::thread::JoinHandle<()>>>>,
}

impl SoundEngine {
    /// Create the engine and start the background thread mixing into
    /// `output`.
    pub fn start(mut output: Box<dyn OutputStream>) -> SoundEngine {
        let engine = SoundEngine {
            state: Arc::new(Mutex::new(MixerState {
                sounds: Vec::new(),
                players: Vec::new(),
                next_player_id: 0,
            })),
            running: Arc::new(AtomicBool::new(true)),
            worker: Arc::new(Mutex::new(None)),
        };
        let state = engine.state.clone();
        let running = engine.running.clone();
        let handle = std::thread::Builder::new()
            .name("sound-mixer".into())
            .spawn(move || {
                log::debug!("mixer thread started");
                let mut callback = |target: &mut [f32]| -> bool {
                    mix_period(&state, target);
                    running.load(Ordering::SeqCst)
                };
                output.stream(OUTPUT_CHANNELS, OUTPUT_SAMPLE_RATE, PERIOD_FRAMES, &mut callback);
                log::debug!("mixer thread stopped");
            })
            .expect("spawning the mixer thread");
        *engine.worker.lock().unwrap() = Some(handle);
        engine
    }

    /// Register a sound buffer under a name, returning its index.
    pub fn register_buffer(&self, buffer: SoundBuffer, name: &str) -> usize {
        let mut state = self.state.lock().unwrap();
        state.sounds.push(RegisteredSound { buffer, name: name.into(), from_file: false });
        state.sounds.len() - 1
    }

    /// Load a WAV file, reusing any sound previously loaded from the same
    /// path instead of touching the file system again.
    pub fn load_wav_file(&self, path: &Path) -> Result<usize, SoundError> {
        let name = path.to_string_lossy().into_owned();
        {
            let state = self.state.lock().unwrap();
            for (index, sound) in state.sounds.iter().enumerate() {
                if sound.from_file && sound.name == name {
                    return Ok(index);
                }
            }
        }
        let buffer = SoundBuffer::load_wav(&PathBuf::from(&name))?;
        let mut state = self.state.lock().unwrap();
        state.sounds.push(RegisteredSound { buffer, name, from_file: true });
        Ok(state.sounds.len() - 1)
    }

    pub fn sound_count(&self) -> usize {
        self.state.lock().unwrap().sounds.len()
    }

    pub fn get_sound(&self, sound_index: usize) -> Option<SoundBuffer> {
        self.state.lock().unwrap().sounds.get(sound_index).map(|sound| sound.buffer.clone())
    }

    /// Start playing a registered sound. Returns the player id used to
    /// release or stop the voice, or an error for unknown indices,
    /// mismatched sample rates and unsupported channel counts. A sound
    /// without samples is skipped silently with id -1.
    pub fn play(
        &self,
        sound_index: usize,
        repeat: bool,
        left_volume: f32,
        right_volume: f32,
        envelope: EnvelopeSettings,
    ) -> Result<i64, SoundError> {
        let mut state = self.state.lock().unwrap();
        let sound = state.sounds.get(sound_index).ok_or(SoundError::UnknownSound(sound_index))?;
        if sound.buffer.samples_per_channel() == 0 {
            return Ok(-1);
        }
        if sound.buffer.sample_rate() != OUTPUT_SAMPLE_RATE {
            log::warn!(
                "sound {:?} has {} samples per second but the mixer outputs {}",
                sound.name,
                sound.buffer.sample_rate(),
                OUTPUT_SAMPLE_RATE
            );
            return Err(SoundError::SampleRateMismatch {
                sound: sound.buffer.sample_rate(),
                output: OUTPUT_SAMPLE_RATE,
            });
        }
        if sound.buffer.channel_count() > MAX_CHANNELS {
            return Err(SoundError::UnsupportedChannelCount(sound.buffer.channel_count() as u16));
        }
        let buffer = sound.buffer.clone();
        let player_id = state.next_player_id;
        state.next_player_id += 1;
        state.players.push(SoundPlayer::new(
            buffer,
            sound_index,
            player_id,
            repeat,
            0,
            left_volume,
            right_volume,
            envelope,
        ));
        Ok(player_id)
    }

    /// Enter the release phase of one voice. Unknown ids are ignored.
    pub fn release(&self, player_id: i64) {
        if player_id < 0 {
            return;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(player) = state.players.iter_mut().find(|player| player.player_id() == player_id) {
            player.sustained = false;
        }
    }

    /// Remove one voice immediately.
    pub fn stop(&self, player_id: i64) {
        if player_id < 0 {
            return;
        }
        let mut state = self.state.lock().unwrap();
        state.players.retain(|player| player.player_id() != player_id);
    }

    pub fn stop_all(&self) {
        self.state.lock().unwrap().players.clear();
    }

    pub fn playing_count(&self) -> usize {
        self.state.lock().unwrap().players.len()
    }

    /// Mix one period synchronously into `target`, which must hold
    /// `PERIOD_FRAMES * 2` interleaved stereo samples. The background
    /// thread runs the same path; this entry is for offline mixdown and
    /// deterministic tests.
    pub fn mix_period_into(&self, target: &mut [f32]) {
        debug_assert_eq!(target.len(), PERIOD_FRAMES * OUTPUT_CHANNELS);
        mix_period(&self.state, target);
    }

    /// Ask the mixer thread to finish after its current period and wait for
    /// it.
    pub fn terminate(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            if let Some(handle) = self.worker.lock().unwrap().take() {
                let _ = handle.join();
            }
        }
    }
}

/// Mix every active player into one stereo period, removing finished
/// voices. Runs under the state mutex so control operations slot in between
/// periods.
fn mix_period(state: &Mutex<MixerState>, target: &mut [f32]) {
    let seconds_per_sample = 1.0 / OUTPUT_SAMPLE_RATE as f64;
    let mut state = state.lock().unwrap();
    // SIMD-aligned scratch from the virtual stack: one block per player and
    // one accumulator for the whole period.
    let Some(mut player_block) = StackAllocation::<f32>::new(PERIOD_FRAMES * MAX_CHANNELS) else {
        return;
    };
    let Some(mut mix_block) = StackAllocation::<f32>::new(PERIOD_FRAMES * OUTPUT_CHANNELS) else {
        return;
    };
    mix_block.clear();
    // Iterated in reverse so removal keeps the remaining indices valid.
    for index in (0..state.players.len()).rev() {
        let player = &mut state.players[index];
        let channels = player.buffer.channel_count();
        player.next_samples(player_block.as_mut_slice(), PERIOD_FRAMES, seconds_per_sample);
        let source = player_block.pointer();
        let mix = mix_block.pointer();
        if channels == 1 {
            // Mono source to stereo target: duplicate into both channels.
            let multiply_left = player.fade_left;
            let multiply_right = player.fade_right;
            for frame in 0..PERIOD_FRAMES {
                let value = source.get(frame);
                let left = if multiply_left { value * player.left_volume } else { value };
                let right = if multiply_right { value * player.right_volume } else { value };
                mix.set(frame * 2, mix.get(frame * 2) + left);
                mix.set(frame * 2 + 1, mix.get(frame * 2 + 1) + right);
            }
        } else if player.fade_left || player.fade_right {
            for frame in 0..PERIOD_FRAMES {
                mix.set(frame * 2, mix.get(frame * 2) + source.get(frame * 2) * player.left_volume);
                mix.set(frame * 2 + 1, mix.get(frame * 2 + 1) + source.get(frame * 2 + 1) * player.right_volume);
            }
        } else {
            // Stereo without fading: vector accumulation over the period.
            let mut source_vector = source;
            let mut mix_vector = mix;
            let mut sample = 0;
            while sample < PERIOD_FRAMES * OUTPUT_CHANNELS {
                let sum = F32x4::read_aligned(mix_vector).add(F32x4::read_aligned(source_vector));
                sum.write_aligned(mix_vector);
                source_vector.offset_elements(F32_LANES);
                mix_vector.offset_elements(F32_LANES);
                sample += F32_LANES;
            }
        }
        if state.players[index].finished() {
            state.players.remove(index);
        }
    }
    target.copy_from_slice(&mix_block.as_mut_slice()[..target.len()]);
}
