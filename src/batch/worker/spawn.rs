//! Worker subprocess spawning.
//!
//! Workers are re-invocations of the current executable in a hidden
//! `render --internal-worker` mode. The full render settings travel as CLI
//! flags; jobs arrive afterwards over stdin.

use std::process::{Command, Stdio};

use crate::batch::RenderSettings;
use crate::error::{Result, WavefarmError};

use super::proc::Proc;

/// Spawn one worker subprocess.
///
/// The child's stdin/stdout become the IPC channel; stderr is inherited so
/// worker logs interleave with the coordinator's.
pub fn spawn_worker(id: usize, settings: &RenderSettings, log_level: &str) -> Result<Proc> {
    let exe_path = std::env::current_exe()
        .map_err(|e| WavefarmError::Worker(format!("failed to locate current executable: {}", e)))?;

    let mut cmd = Command::new(&exe_path);

    cmd.arg("render");
    cmd.arg("--internal-worker");
    cmd.args(["--worker-id", &id.to_string()]);

    // --preset-dir is required by the CLI but unused in worker mode; jobs
    // carry their own paths.
    cmd.args(["--preset-dir", "/dev/null"]);

    cmd.args(["--bpm", &settings.bpm.to_string()]);
    cmd.args(["--note-duration", &settings.note_duration.to_string()]);
    cmd.args(["--render-duration", &settings.render_duration.to_string()]);
    cmd.args(["--pitch-low", &settings.pitch_low.to_string()]);
    cmd.args(["--pitch-high", &settings.pitch_high.to_string()]);
    cmd.args(["--velocity", &settings.velocity.to_string()]);
    cmd.arg("--output-dir");
    cmd.arg(&settings.output_dir);
    cmd.args(["--log-level", log_level]);

    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::inherit());

    let child = cmd
        .spawn()
        .map_err(|e| WavefarmError::Worker(format!("failed to spawn worker {}: {}", id, e)))?;

    tracing::debug!(worker_id = id, pid = child.id(), "worker spawned");
    Proc::from_child(child)
}
