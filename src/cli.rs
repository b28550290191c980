//! Command-line interface definitions using clap.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::batch::RenderSettings;
use crate::error::{Result, WavefarmError};

/// Batch synthesizer-preset renderer.
#[derive(Parser, Debug)]
#[command(name = "wavefarm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress the progress bar and non-error output.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render every preset under a directory across a pitch range.
    Render(RenderArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the render command.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Directory searched recursively for preset files.
    #[arg(long)]
    pub preset_dir: PathBuf,

    /// Beats per minute for tempo-synced preset parameters.
    #[arg(long, default_value_t = 120.0)]
    pub bpm: f64,

    /// Note duration (gate time) in seconds.
    #[arg(long, default_value_t = 1.0)]
    pub note_duration: f64,

    /// Render duration (total file length) in seconds.
    #[arg(long, default_value_t = 1.0)]
    pub render_duration: f64,

    /// Lowest MIDI pitch to be used (inclusive).
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub pitch_low: u8,

    /// Highest MIDI pitch to be used (inclusive).
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub pitch_high: u8,

    /// MIDI velocity for every rendered note.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub velocity: u8,

    /// Number of worker processes.
    #[arg(short, long, default_value_t = num_cpus())]
    pub workers: usize,

    /// Output directory (created if absent).
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Logger level.
    #[arg(
        long,
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "NOTSET"]
    )]
    pub log_level: String,

    /// Run as a worker subprocess (internal use only).
    #[arg(long, hide = true)]
    pub internal_worker: bool,

    /// Worker index assigned by the pool (internal use only).
    #[arg(long, hide = true, default_value_t = 0)]
    pub worker_id: usize,
}

impl RenderArgs {
    /// Validate argument combinations clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.bpm <= 0.0 {
            return Err(WavefarmError::InvalidConfig("bpm must be positive".into()));
        }
        if self.note_duration <= 0.0 {
            return Err(WavefarmError::InvalidConfig(
                "note duration must be positive".into(),
            ));
        }
        if self.render_duration <= 0.0 {
            return Err(WavefarmError::InvalidConfig(
                "render duration must be positive".into(),
            ));
        }
        if self.pitch_low > self.pitch_high {
            return Err(WavefarmError::InvalidConfig(format!(
                "invalid pitch range: low {} exceeds high {}",
                self.pitch_low, self.pitch_high
            )));
        }
        if self.workers == 0 {
            return Err(WavefarmError::InvalidConfig(
                "worker count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The render settings shared by every worker.
    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            bpm: self.bpm,
            note_duration: self.note_duration,
            render_duration: self.render_duration,
            pitch_low: self.pitch_low,
            pitch_high: self.pitch_high,
            velocity: self.velocity,
            output_dir: self.output_dir.clone(),
        }
    }
}

/// Arguments for shell completions.
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate and print completions to stdout.
    pub fn generate(&self) {
        clap_complete::generate(
            self.shell,
            &mut Cli::command(),
            "wavefarm",
            &mut std::io::stdout(),
        );
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
