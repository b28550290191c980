//! Preset documents.
//!
//! A preset is a JSON description of one FM patch: modulation harmonics, two
//! envelopes, and optional vibrato and stereo settings. Everything except the
//! name has a sensible default so hand-written presets stay short.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WavefarmError};

fn default_harmonics() -> Vec<f32> {
    vec![1.0]
}

fn default_harmonic_amps() -> Vec<f32> {
    vec![1.0]
}

fn default_gain() -> f32 {
    0.8
}

/// Envelope timings in seconds plus a sustain level in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnvelopeSpec {
    #[serde(default = "EnvelopeSpec::default_attack")]
    pub attack: f32,
    #[serde(default = "EnvelopeSpec::default_decay")]
    pub decay: f32,
    #[serde(default = "EnvelopeSpec::default_sustain")]
    pub sustain: f32,
    #[serde(default = "EnvelopeSpec::default_release")]
    pub release: f32,
}

impl EnvelopeSpec {
    fn default_attack() -> f32 {
        0.01
    }

    fn default_decay() -> f32 {
        0.1
    }

    fn default_sustain() -> f32 {
        0.7
    }

    fn default_release() -> f32 {
        0.2
    }
}

impl Default for EnvelopeSpec {
    fn default() -> Self {
        Self {
            attack: Self::default_attack(),
            decay: Self::default_decay(),
            sustain: Self::default_sustain(),
            release: Self::default_release(),
        }
    }
}

/// One synthesizer patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    /// Patch name, for logs only.
    pub name: String,

    /// Frequency ratios of the modulation partials relative to the carrier.
    #[serde(default = "default_harmonics")]
    pub harmonics: Vec<f32>,

    /// Amplitude of each modulation partial (must match `harmonics` length).
    #[serde(default = "default_harmonic_amps")]
    pub harmonic_amps: Vec<f32>,

    /// Overall frequency-modulation depth (0 = plain sine carrier).
    #[serde(default)]
    pub mod_depth: f32,

    /// Output amplitude envelope.
    #[serde(default)]
    pub amp_env: EnvelopeSpec,

    /// Modulation-depth envelope.
    #[serde(default)]
    pub mod_env: EnvelopeSpec,

    /// Vibrato period in beats (0 = no vibrato). Tempo-synced: the rendered
    /// rate depends on the engine bpm.
    #[serde(default)]
    pub vibrato_beats: f32,

    /// Vibrato depth in semitones.
    #[serde(default)]
    pub vibrato_depth: f32,

    /// Output gain in [0, 1].
    #[serde(default = "default_gain")]
    pub gain: f32,

    /// Stereo width in [0, 1], realized as a phase offset between channels.
    #[serde(default)]
    pub width: f32,
}

impl Preset {
    /// Load and validate a preset from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| WavefarmError::InvalidPreset {
            path: path.to_path_buf(),
            reason: format!("read failed: {}", e),
        })?;

        let preset: Preset =
            serde_json::from_str(&data).map_err(|e| WavefarmError::InvalidPreset {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        preset.validate(path)?;
        Ok(preset)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let fail = |reason: String| {
            Err(WavefarmError::InvalidPreset {
                path: path.to_path_buf(),
                reason,
            })
        };

        if self.harmonics.is_empty() {
            return fail("harmonics must not be empty".into());
        }
        if self.harmonics.len() != self.harmonic_amps.len() {
            return fail(format!(
                "harmonics ({}) and harmonic_amps ({}) must have the same length",
                self.harmonics.len(),
                self.harmonic_amps.len()
            ));
        }
        if self.harmonics.iter().any(|h| *h <= 0.0) {
            return fail("harmonic ratios must be positive".into());
        }
        if self.mod_depth < 0.0 {
            return fail("mod_depth must be non-negative".into());
        }
        for (label, env) in [("amp_env", &self.amp_env), ("mod_env", &self.mod_env)] {
            if env.attack < 0.0 || env.decay < 0.0 || env.release < 0.0 {
                return fail(format!("{} durations must be non-negative", label));
            }
            if !(0.0..=1.0).contains(&env.sustain) {
                return fail(format!("{} sustain must be in [0, 1]", label));
            }
        }
        if self.vibrato_beats < 0.0 || self.vibrato_depth < 0.0 {
            return fail("vibrato settings must be non-negative".into());
        }
        if !(0.0..=1.0).contains(&self.gain) {
            return fail("gain must be in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.width) {
            return fail("width must be in [0, 1]".into());
        }
        Ok(())
    }
}
