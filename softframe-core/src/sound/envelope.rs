//! ADSR-style volume envelopes.

/// Envelope parameters. Times are in seconds, levels in 0..1.
///
/// Beyond the basic attack/decay/sustain/release quadruple there is a hold
/// time at full volume before decay, a rise rate during sustain, and two
/// smoothing constants that low-pass the output separately while sustained
/// and while released.
#[derive(Clone, Copy, Debug)]
pub struct EnvelopeSettings {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
    pub hold: f64,
    pub rise: f64,
    pub sustained_smooth: f64,
    pub released_smooth: f64,
    pub used: bool,
}

impl Default for EnvelopeSettings {
    /// The flat envelope: playback at full volume without any shaping.
    fn default() -> Self {
        Self {
            attack: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 0.0,
            hold: 0.0,
            rise: 0.0,
            sustained_smooth: 0.0,
            released_smooth: 0.0,
            used: false,
        }
    }
}

impl EnvelopeSettings {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self { attack, decay, sustain, release, used: true, ..Self::default() }
    }

    pub fn with_hold(mut self, hold: f64) -> Self {
        self.hold = hold;
        self
    }

    pub fn with_rise(mut self, rise: f64) -> Self {
        self.rise = rise;
        self
    }

    pub fn with_smoothing(mut self, sustained_smooth: f64, released_smooth: f64) -> Self {
        self.sustained_smooth = sustained_smooth;
        self.released_smooth = released_smooth;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Attack,
    Hold,
    Decay,
    Sustain,
}

/// Envelope state advanced once per sample by [`Envelope::next_volume`].
#[derive(Clone, Debug)]
pub struct Envelope {
    settings: EnvelopeSettings,
    phase: Phase,
    current_volume: f64,
    current_goal: f64,
    release_volume: f64,
    time_since_change: f64,
    last_sustained: bool,
}

/// Move `value` towards `goal` by at most `max_step`, returning the applied
/// difference.
fn closer_linear(value: &mut f64, goal: f64, max_step: f64) -> f64 {
    if *value + max_step < goal {
        *value += max_step;
        max_step
    } else if *value - max_step > goal {
        *value -= max_step;
        -max_step
    } else {
        let difference = goal - *value;
        *value = goal;
        difference
    }
}

impl Envelope {
    pub fn new(settings: EnvelopeSettings) -> Envelope {
        let mut settings = settings;
        // Very short fades instead of division by zero.
        let shortest_time = 0.001;
        settings.attack = settings.attack.max(shortest_time);
        settings.hold = settings.hold.max(shortest_time);
        settings.decay = settings.decay.max(shortest_time);
        settings.release = settings.release.max(shortest_time);
        Envelope {
            settings,
            phase: Phase::Attack,
            current_volume: 0.0,
            current_goal: 0.0,
            release_volume: 0.0,
            time_since_change: 0.0,
            last_sustained: true,
        }
    }

    pub fn settings(&self) -> &EnvelopeSettings {
        &self.settings
    }

    pub fn current_goal(&self) -> f64 {
        self.current_goal
    }

    pub fn current_volume(&self) -> f64 {
        self.current_volume
    }

    /// Advance by `seconds` with the given key state and return the volume
    /// for the sample.
    pub fn next_volume(&mut self, sustained: bool, seconds: f64) -> f64 {
        if sustained {
            match self.phase {
                Phase::Attack => {
                    self.current_goal += seconds / self.settings.attack;
                    if self.current_goal > 1.0 {
                        self.current_goal = 1.0;
                        self.phase = Phase::Hold;
                        self.time_since_change = 0.0;
                    }
                }
                Phase::Hold => {
                    if self.time_since_change < self.settings.hold {
                        self.current_goal = 1.0;
                    } else {
                        self.phase = Phase::Decay;
                        self.time_since_change = 0.0;
                    }
                }
                Phase::Decay => {
                    self.current_goal += (self.settings.sustain - 1.0) * seconds / self.settings.decay;
                    if self.current_goal < self.settings.sustain {
                        self.current_goal = self.settings.sustain;
                        self.phase = Phase::Sustain;
                        self.time_since_change = 0.0;
                    }
                }
                Phase::Sustain => {
                    self.current_goal += self.settings.rise * seconds / self.settings.decay;
                    self.current_goal = self.current_goal.clamp(0.0, 1.0);
                }
            }
        } else {
            // Release. The first non-sustained sample records the level the
            // linear fade starts from.
            if self.last_sustained {
                self.release_volume = self.current_goal;
            }
            self.current_goal -= self.release_volume * seconds / self.settings.release;
            if self.current_goal < 0.0 {
                self.current_goal = 0.0;
            }
            self.last_sustained = false;
        }
        let smooth = if sustained { self.settings.sustained_smooth } else { self.settings.released_smooth };
        if smooth > 0.0 {
            // Faster towards the goal the further away it is, plus a fixed
            // slow pull so the volume actually reaches zero.
            let change = (seconds / smooth).min(1.0);
            self.current_volume = self.current_volume * (1.0 - change) + self.current_goal * change;
            closer_linear(&mut self.current_volume, self.current_goal, seconds * 0.01);
        } else {
            self.current_volume = self.current_goal;
        }
        self.time_since_change += seconds;
        self.current_volume
    }

    /// True once the released volume has converged to silence.
    pub fn done(&self) -> bool {
        self.current_volume <= 1e-10 && !self.last_sustained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 44100.0;

    #[test]
    fn instant_attack_reaches_full_volume_within_two_samples() {
        // With attack 0 (clamped to 1 ms floor times nothing relevant here),
        // sustain at 1 skips decay entirely.
        let mut envelope = Envelope::new(EnvelopeSettings::new(0.0, 0.0, 1.0, 0.1));
        envelope.next_volume(true, DT);
        let volume = envelope.next_volume(true, DT);
        assert!(envelope.current_goal() < 1.0 + 1e-9);
        let mut reached = volume >= 1.0 - 1e-9;
        for _ in 0..100 {
            reached |= envelope.next_volume(true, DT) >= 1.0 - 1e-9;
        }
        assert!(reached);
        // Stays at full volume while sustained.
        for _ in 0..1000 {
            assert!((envelope.next_volume(true, DT) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn decay_settles_at_the_sustain_level() {
        let mut envelope = Envelope::new(EnvelopeSettings::new(0.001, 0.05, 0.5, 0.1));
        for _ in 0..(44100 / 5) {
            envelope.next_volume(true, DT);
        }
        assert!((envelope.current_volume() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn release_fades_linearly_to_zero_and_finishes() {
        let mut envelope = Envelope::new(EnvelopeSettings::new(0.001, 0.01, 0.8, 0.05));
        for _ in 0..4410 {
            envelope.next_volume(true, DT);
        }
        assert!(!envelope.done());
        let mut samples = 0;
        while !envelope.done() {
            envelope.next_volume(false, DT);
            samples += 1;
            assert!(samples < 44100, "release failed to converge");
        }
        // 50 ms of release at 44100 Hz is about 2205 samples.
        assert!(samples >= 2000 && samples <= 3000, "released after {samples} samples");
    }

    #[test]
    fn smoothing_still_converges_to_exact_zero() {
        let settings = EnvelopeSettings::new(0.001, 0.01, 1.0, 0.02).with_smoothing(0.01, 0.01);
        let mut envelope = Envelope::new(settings);
        for _ in 0..2000 {
            envelope.next_volume(true, DT);
        }
        let mut samples = 0;
        while !envelope.done() {
            envelope.next_volume(false, DT);
            samples += 1;
            assert!(samples < 10 * 44100, "smoothed release failed to converge");
        }
        assert_eq!(envelope.current_volume(), 0.0);
    }
}
