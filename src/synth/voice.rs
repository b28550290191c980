//! FM voice rendering.
//!
//! One voice renders a single note: a sine carrier frequency-modulated by a
//! sum of harmonically related partials, shaped by two ADSR envelopes. The
//! modulation envelope controls FM depth over time, the amplitude envelope
//! controls output level.
//!
//! Per sample n (t = n / sample_rate):
//! 1. m(t)  = sum over partials of amp_i * sin(2*pi*f*ratio_i*t)
//! 2. f(t)  = f * vibrato(t) * (1 + m(t) * mod_depth * mod_env(t))
//! 3. theta += 2*pi*f(t) / sample_rate
//! 4. out   = sin(theta) * amp_env(t) * gain

use std::f32::consts::TAU;

/// ADSR envelope evaluated as a pure function of time.
///
/// The release phase starts when the gate closes (note off), falling linearly
/// from whatever level the envelope held at that moment.
#[derive(Debug, Clone, Copy)]
pub struct Adsr {
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        // Zero-length phases are treated as instantaneous transitions.
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
        }
    }

    /// Envelope level while the gate is still open at time `t`.
    fn held_level(&self, t: f32) -> f32 {
        if t < self.attack {
            t / self.attack
        } else if t < self.attack + self.decay {
            let frac = (t - self.attack) / self.decay;
            1.0 - (1.0 - self.sustain) * frac
        } else {
            self.sustain
        }
    }

    /// Envelope level at time `t` for a note whose gate closes at `gate`.
    pub fn level_at(&self, t: f32, gate: f32) -> f32 {
        if t < 0.0 {
            return 0.0;
        }
        if t < gate {
            return self.held_level(t);
        }
        if self.release <= 0.0 {
            return 0.0;
        }
        let released = (t - gate) / self.release;
        if released >= 1.0 {
            0.0
        } else {
            self.held_level(gate) * (1.0 - released)
        }
    }
}

/// A single renderable note.
#[derive(Debug, Clone)]
pub struct FmVoice {
    /// Carrier frequency in Hz.
    pub carrier_hz: f32,
    /// Frequency ratios of the modulation partials.
    pub harmonics: Vec<f32>,
    /// Amplitude of each modulation partial.
    pub harmonic_amps: Vec<f32>,
    /// Overall modulation depth scaling.
    pub mod_depth: f32,
    /// Output amplitude envelope.
    pub amp_env: Adsr,
    /// Modulation-depth envelope.
    pub mod_env: Adsr,
    /// Vibrato rate in Hz (0 disables vibrato).
    pub vibrato_hz: f32,
    /// Vibrato depth in semitones.
    pub vibrato_depth: f32,
    /// Output gain, velocity scaling already applied.
    pub gain: f32,
    /// Initial phase offset of the right channel in radians.
    pub width_phase: f32,
}

impl FmVoice {
    /// Render `frames` samples per channel at `sample_rate`, with the gate
    /// closing at `gate` seconds.
    pub fn render(&self, frames: usize, sample_rate: u32, gate: f32) -> (Vec<f32>, Vec<f32>) {
        let sr = sample_rate as f32;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);

        let mut phase_l: f32 = 0.0;
        let mut phase_r: f32 = self.width_phase;

        for n in 0..frames {
            let t = n as f32 / sr;

            let amp = self.amp_env.level_at(t, gate) * self.gain;
            let menv = self.mod_env.level_at(t, gate);

            let modulation: f32 = self
                .harmonics
                .iter()
                .zip(self.harmonic_amps.iter())
                .map(|(ratio, amp)| amp * (TAU * self.carrier_hz * ratio * t).sin())
                .sum();

            let vibrato = if self.vibrato_hz > 0.0 && self.vibrato_depth > 0.0 {
                let semitones = self.vibrato_depth * (TAU * self.vibrato_hz * t).sin();
                (semitones / 12.0).exp2()
            } else {
                1.0
            };

            let inst_hz = self.carrier_hz * vibrato * (1.0 + modulation * self.mod_depth * menv);
            let step = TAU * inst_hz / sr;

            phase_l = wrap_phase(phase_l + step);
            phase_r = wrap_phase(phase_r + step);

            left.push(phase_l.sin() * amp);
            right.push(phase_r.sin() * amp);
        }

        (left, right)
    }
}

fn wrap_phase(phase: f32) -> f32 {
    if phase >= TAU { phase - TAU } else { phase }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn test_voice() -> FmVoice {
        FmVoice {
            carrier_hz: 440.0,
            harmonics: vec![2.0],
            harmonic_amps: vec![1.0],
            mod_depth: 0.3,
            amp_env: Adsr::new(0.01, 0.05, 0.7, 0.1),
            mod_env: Adsr::new(0.01, 0.05, 0.5, 0.1),
            vibrato_hz: 0.0,
            vibrato_depth: 0.0,
            gain: 0.8,
            width_phase: 0.0,
        }
    }

    #[test]
    fn test_adsr_phases() {
        let env = Adsr::new(0.1, 0.1, 0.5, 0.2);
        let gate = 1.0;

        assert_eq!(env.level_at(0.0, gate), 0.0);
        // Midway through the attack
        assert!((env.level_at(0.05, gate) - 0.5).abs() < 1e-6);
        // Attack peak
        assert!((env.level_at(0.1, gate) - 1.0).abs() < 1e-5);
        // Sustain plateau
        assert!((env.level_at(0.5, gate) - 0.5).abs() < 1e-6);
        // Halfway through release
        assert!((env.level_at(1.1, gate) - 0.25).abs() < 1e-6);
        // Fully released
        assert_eq!(env.level_at(1.5, gate), 0.0);
    }

    #[test]
    fn test_adsr_release_from_mid_attack() {
        // Gate closes before the attack completes; release starts from the
        // partial level, not from 1.0.
        let env = Adsr::new(0.2, 0.1, 0.5, 0.2);
        let gate = 0.1;
        let at_gate = env.level_at(0.0999, gate);
        assert!(at_gate < 0.51);
        assert!(env.level_at(0.15, gate) < at_gate);
    }

    #[test]
    fn test_adsr_zero_release_is_silent_after_gate() {
        let env = Adsr::new(0.01, 0.01, 1.0, 0.0);
        assert_eq!(env.level_at(0.5, 0.2), 0.0);
    }

    #[test]
    fn test_render_length_and_range() {
        let voice = test_voice();
        let (left, right) = voice.render(4410, 44_100, 0.05);
        assert_eq!(left.len(), 4410);
        assert_eq!(right.len(), 4410);
        assert!(left.iter().all(|s| s.abs() <= 1.0));
        assert!(right.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_render_is_deterministic() {
        let voice = test_voice();
        let a = voice.render(1000, 44_100, 0.01);
        let b = voice.render(1000, 44_100, 0.01);
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }

    #[test]
    fn test_zero_gain_renders_silence() {
        let mut voice = test_voice();
        voice.gain = 0.0;
        let (left, _) = voice.render(1000, 44_100, 0.01);
        assert!(left.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_width_offsets_channels() {
        let mut voice = test_voice();
        voice.width_phase = PI / 2.0;
        let (left, right) = voice.render(1000, 44_100, 0.02);
        assert_ne!(left, right);
    }

    #[test]
    fn test_vibrato_changes_output() {
        let plain = test_voice();
        let mut wobbly = test_voice();
        wobbly.vibrato_hz = 5.0;
        wobbly.vibrato_depth = 0.5;

        let (a, _) = plain.render(4410, 44_100, 0.1);
        let (b, _) = wobbly.render(4410, 44_100, 0.1);
        assert_ne!(a, b);
    }
}
