//! Batch rendering coordinator.
//!
//! Orchestrates one run: discover presets, populate the shared queue, launch
//! the worker pool, poll progress until the pool resolves, then collect and
//! report per-worker outcomes. Worker faults never abort the batch; faults
//! before the pool launches do.

pub mod progress;
pub mod queue;
pub mod report;
pub mod worker;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::discover;
use crate::error::Result;

use queue::{JobDescriptor, TaskQueue};
use report::BatchReport;
use worker::WorkerPool;

/// Render parameters copied identically into every worker at spawn time.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Tempo for tempo-synced preset parameters.
    pub bpm: f64,
    /// Gate time per note in seconds.
    pub note_duration: f64,
    /// Total length of each rendered file in seconds.
    pub render_duration: f64,
    /// Lowest MIDI pitch to render (inclusive).
    pub pitch_low: u8,
    /// Highest MIDI pitch to render (inclusive).
    pub pitch_high: u8,
    /// MIDI velocity for every note.
    pub velocity: u8,
    /// Directory receiving one WAV per (preset, pitch) pair.
    pub output_dir: PathBuf,
}

impl RenderSettings {
    /// Files produced per successfully processed job.
    pub fn renders_per_job(&self) -> usize {
        (self.pitch_high - self.pitch_low) as usize + 1
    }
}

/// Full configuration for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory searched recursively for preset files.
    pub preset_dir: PathBuf,
    /// Settings propagated unchanged to every worker.
    pub settings: RenderSettings,
    /// Number of worker subprocesses.
    pub worker_count: usize,
    /// Whether to draw the progress bar.
    pub show_progress: bool,
    /// Log level forwarded to worker subprocesses.
    pub log_level: String,
}

/// Run one batch to completion and return its report.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    let preset_paths = discover::discover_presets(&config.preset_dir)?;
    let total_jobs = preset_paths.len();

    if total_jobs == 0 {
        tracing::warn!(dir = %config.preset_dir.display(), "no preset files found");
    }

    tracing::info!(
        presets = total_jobs,
        renders = total_jobs * config.settings.renders_per_job(),
        workers = config.worker_count,
        bpm = config.settings.bpm,
        note_duration = config.settings.note_duration,
        render_duration = config.settings.render_duration,
        pitch_low = config.settings.pitch_low,
        pitch_high = config.settings.pitch_high,
        output_dir = %config.settings.output_dir.display(),
        "starting batch"
    );

    fs::create_dir_all(&config.settings.output_dir)?;

    // Single producer phase: every job is enqueued before any worker starts
    let queue = Arc::new(TaskQueue::new());
    for preset_path in preset_paths {
        queue.put(JobDescriptor { preset_path });
    }

    let pool = WorkerPool::launch(
        Arc::clone(&queue),
        &config.settings,
        config.worker_count,
        &config.log_level,
    )?;

    progress::monitor_progress(&queue, &pool, total_jobs, config.show_progress);

    let results = pool.join();
    let report = BatchReport::from_results(total_jobs, results);
    report.emit();
    Ok(report)
}
