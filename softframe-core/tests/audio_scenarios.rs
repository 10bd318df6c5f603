//! End-to-end audio scenarios: the envelope release profile and mixer laws.

use softframe_core::sound::output::CaptureOutput;
use softframe_core::sound::{
    Envelope, EnvelopeSettings, OUTPUT_SAMPLE_RATE, PERIOD_FRAMES, SoundBuffer, SoundEngine,
};
use std::sync::{Arc, Mutex};

const DT: f64 = 1.0 / OUTPUT_SAMPLE_RATE as f64;

/// An engine whose background stream exits immediately; the tests drive
/// mixing deterministically through `mix_period_into`.
fn offline_engine() -> SoundEngine {
    let periods = Arc::new(Mutex::new(Vec::new()));
    SoundEngine::start(Box::new(CaptureOutput { periods, max_periods: 0 }))
}

#[test]
fn envelope_release_profile() {
    // attack 10 ms, decay 100 ms to sustain 0.5, release 200 ms.
    let settings = EnvelopeSettings::new(0.01, 0.1, 0.5, 0.2);
    let mut envelope = Envelope::new(settings);
    let mut volumes = Vec::with_capacity(13230);
    for _ in 0..4410 {
        volumes.push(envelope.next_volume(true, DT));
    }
    for _ in 0..8820 {
        volumes.push(envelope.next_volume(false, DT));
    }
    // Reaches full volume within the first 441 samples.
    assert!(volumes[..441].iter().any(|&volume| volume >= 1.0 - 1e-6));
    // Settles near the sustain level by the time the key is released.
    assert!((volumes[4409] - 0.5).abs() < 0.1, "at release time: {}", volumes[4409]);
    // The release fades linearly towards silence and crosses below 0.01
    // before its nominal end.
    assert!(volumes[13229] < 0.01);
    let half_release = volumes[4410 + 4410];
    assert!((half_release - 0.25).abs() < 0.1, "mid release: {half_release}");
    assert!(volumes.windows(2).skip(4410).all(|pair| pair[1] <= pair[0] + 1e-9));
    // done() flips within the release tail, not before.
    let mut envelope = Envelope::new(settings);
    let mut done_at = None;
    for sample in 0..14000 {
        envelope.next_volume(sample < 4410, DT);
        if envelope.done() {
            done_at = Some(sample);
            break;
        }
    }
    let done_at = done_at.expect("envelope must finish");
    assert!(done_at >= 13229 - 441, "finished too early at {done_at}");
    assert!(done_at <= 14000, "finished too late at {done_at}");
}

#[test]
fn mono_unit_source_fills_both_channels_with_its_volumes() {
    let engine = offline_engine();
    let ones = SoundBuffer::generate(PERIOD_FRAMES * 2, 1, OUTPUT_SAMPLE_RATE, |_, _| 1.0);
    let index = engine.register_buffer(ones, "unit");
    engine.play(index, false, 0.5, 1.0, EnvelopeSettings::default()).unwrap();
    let mut period = vec![0.0f32; PERIOD_FRAMES * 2];
    engine.mix_period_into(&mut period);
    for frame in 0..PERIOD_FRAMES {
        assert!((period[frame * 2] - 0.5).abs() < 1e-6);
        assert!((period[frame * 2 + 1] - 1.0).abs() < 1e-6);
    }
    engine.terminate();
}

#[test]
fn repeating_players_survive_periods_and_stop_on_command() {
    let engine = offline_engine();
    let short = SoundBuffer::generate(100, 1, OUTPUT_SAMPLE_RATE, |_, index| {
        if index % 2 == 0 { 0.25 } else { -0.25 }
    });
    let index = engine.register_buffer(short, "blip");
    let id = engine.play(index, true, 1.0, 1.0, EnvelopeSettings::default()).unwrap();
    let mut period = vec![0.0f32; PERIOD_FRAMES * 2];
    for _ in 0..3 {
        period.fill(0.0);
        engine.mix_period_into(&mut period);
        // The looped 100-frame pattern repeats across the whole period.
        assert!((period[0] - 0.25).abs() < 1e-6);
        assert!((period[2] + 0.25).abs() < 1e-6);
    }
    // A repeating voice never finishes by itself.
    assert_eq!(engine.playing_count(), 1);
    engine.stop(id);
    assert_eq!(engine.playing_count(), 0);
    engine.terminate();
}

#[test]
fn released_envelope_voices_fade_out_and_leave_the_mix() {
    let engine = offline_engine();
    let tone = SoundBuffer::generate(PERIOD_FRAMES * 16, 1, OUTPUT_SAMPLE_RATE, |_, _| 1.0);
    let index = engine.register_buffer(tone, "tone");
    // 20 ms release fits inside one period.
    let settings = EnvelopeSettings::new(0.001, 0.001, 1.0, 0.02);
    let id = engine.play(index, true, 1.0, 1.0, settings).unwrap();
    // One sustained period brings the envelope to full volume.
    let mut sustained = vec![0.0f32; PERIOD_FRAMES * 2];
    engine.mix_period_into(&mut sustained);
    assert!(sustained[PERIOD_FRAMES * 2 - 1] > 0.9);
    assert_eq!(engine.playing_count(), 1);
    // The release fades out within the next period and the voice leaves.
    engine.release(id);
    let mut fading = vec![0.0f32; PERIOD_FRAMES * 2];
    engine.mix_period_into(&mut fading);
    assert!(fading[0] > 0.5);
    assert_eq!(fading[PERIOD_FRAMES * 2 - 1], 0.0);
    assert_eq!(engine.playing_count(), 0);
    let mut silent = vec![0.0f32; PERIOD_FRAMES * 2];
    engine.mix_period_into(&mut silent);
    assert!(silent.iter().all(|&sample| sample == 0.0));
    engine.terminate();
}

#[test]
fn zero_length_sounds_are_skipped_silently() {
    let engine = offline_engine();
    let empty = SoundBuffer::from_samples(Vec::new(), 1, OUTPUT_SAMPLE_RATE);
    let index = engine.register_buffer(empty, "empty");
    let id = engine.play(index, false, 1.0, 1.0, EnvelopeSettings::default()).unwrap();
    assert_eq!(id, -1);
    assert_eq!(engine.playing_count(), 0);
    engine.terminate();
}

#[test]
fn the_background_stream_mixes_periods_until_terminated() {
    // The thread-driven path: a capture output with a period budget runs to
    // completion on its own, producing silent periods without players.
    let periods = Arc::new(Mutex::new(Vec::new()));
    let engine = SoundEngine::start(Box::new(CaptureOutput { periods: periods.clone(), max_periods: 2 }));
    // Wait for the stream to finish its budget.
    for _ in 0..500 {
        if periods.lock().unwrap().len() >= 2 {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    engine.terminate();
    let captured = periods.lock().unwrap();
    assert!(!captured.is_empty());
    assert!(captured[0].iter().all(|&sample| sample == 0.0));
    assert_eq!(captured[0].len(), PERIOD_FRAMES * 2);
}
