//! Synthesis engine.
//!
//! One [`SynthEngine`] lives inside each worker subprocess for the whole run:
//! the tempo is applied once at startup, presets are swapped in per job, and
//! `render` produces one two-channel buffer per pitch.

pub mod preset;
pub mod voice;

use std::f32::consts::PI;
use std::path::Path;

use crate::error::{Result, WavefarmError};
use preset::Preset;
use voice::{Adsr, FmVoice};

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Two-channel audio, one `Vec<f32>` per channel, equal lengths.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl AudioBuffer {
    /// Number of frames per channel.
    pub fn frames(&self) -> usize {
        self.left.len()
    }
}

/// Convert a MIDI pitch to its frequency in Hz (A4 = 69 = 440 Hz).
pub fn midi_to_hz(pitch: u8) -> f32 {
    440.0 * ((pitch as f32 - 69.0) / 12.0).exp2()
}

/// A reusable synthesizer instance.
pub struct SynthEngine {
    sample_rate: u32,
    bpm: f64,
    preset: Option<Preset>,
}

impl SynthEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            bpm: 120.0,
            preset: None,
        }
    }

    /// Set the tempo used for tempo-synced preset parameters.
    pub fn set_tempo(&mut self, bpm: f64) {
        self.bpm = bpm;
    }

    /// Load a preset file, replacing any previously loaded preset.
    pub fn load_preset(&mut self, path: &Path) -> Result<()> {
        let preset = Preset::from_file(path)?;
        tracing::debug!(name = %preset.name, path = %path.display(), "preset loaded");
        self.preset = Some(preset);
        Ok(())
    }

    /// Render one note.
    ///
    /// `note_duration` is the gate time in seconds; `render_duration` is the
    /// total length of the returned buffer, leaving room for the release tail.
    pub fn render(
        &self,
        pitch: u8,
        velocity: u8,
        note_duration: f64,
        render_duration: f64,
    ) -> Result<AudioBuffer> {
        let preset = self
            .preset
            .as_ref()
            .ok_or_else(|| WavefarmError::Render("no preset loaded".into()))?;

        if note_duration <= 0.0 || render_duration <= 0.0 {
            return Err(WavefarmError::Render(format!(
                "durations must be positive (note {}, render {})",
                note_duration, render_duration
            )));
        }

        let frames = (render_duration * self.sample_rate as f64).round() as usize;
        let gate = note_duration.min(render_duration) as f32;

        // Vibrato period is specified in beats, so the rate depends on tempo.
        let vibrato_hz = if preset.vibrato_beats > 0.0 {
            (self.bpm as f32 / 60.0) / preset.vibrato_beats
        } else {
            0.0
        };

        let velocity_gain = velocity as f32 / 127.0;

        let voice = FmVoice {
            carrier_hz: midi_to_hz(pitch),
            harmonics: preset.harmonics.clone(),
            harmonic_amps: preset.harmonic_amps.clone(),
            mod_depth: preset.mod_depth,
            amp_env: Adsr::new(
                preset.amp_env.attack,
                preset.amp_env.decay,
                preset.amp_env.sustain,
                preset.amp_env.release,
            ),
            mod_env: Adsr::new(
                preset.mod_env.attack,
                preset.mod_env.decay,
                preset.mod_env.sustain,
                preset.mod_env.release,
            ),
            vibrato_hz,
            vibrato_depth: preset.vibrato_depth,
            gain: preset.gain * velocity_gain,
            width_phase: preset.width * PI / 2.0,
        };

        let (left, right) = voice.render(frames, self.sample_rate, gate);
        Ok(AudioBuffer { left, right })
    }
}

impl Default for SynthEngine {
    fn default() -> Self {
        Self::new()
    }
}
