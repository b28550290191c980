//! Worker subprocess main entry point.
//!
//! This module runs when `wavefarm render --internal-worker` is invoked. It
//! builds one synthesis engine, signals readiness, then renders one preset
//! per request until the coordinator sends `Exit` or closes the pipe.
//!
//! Fault policy: the first failure anywhere in a job (load, render, write)
//! ends this worker. It reports a single `Error` response and exits; the
//! coordinator keeps the remaining workers running.

use std::io;
use std::path::Path;

use crate::batch::RenderSettings;
use crate::error::{Result, WavefarmError};
use crate::synth::{SAMPLE_RATE, SynthEngine};
use crate::wav;

use super::ipc::{MessageReader, MessageWriter, PipeFd};
use super::protocol::{WorkRequest, WorkResponse};

/// Render one preset across the configured pitch range.
///
/// Returns the number of files written. The engine instance is reused across
/// jobs; only the preset changes.
fn process_job(
    engine: &mut SynthEngine,
    settings: &RenderSettings,
    preset_path: &Path,
) -> Result<usize> {
    engine.load_preset(preset_path)?;

    let file_name = preset_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| WavefarmError::InvalidPreset {
            path: preset_path.to_path_buf(),
            reason: "file name is not valid UTF-8".into(),
        })?;

    let mut written = 0;
    for pitch in settings.pitch_low..=settings.pitch_high {
        let audio = engine.render(
            pitch,
            settings.velocity,
            settings.note_duration,
            settings.render_duration,
        )?;

        let output_path = settings
            .output_dir
            .join(format!("{}_{}.wav", pitch, file_name));
        wav::write_stereo_16bit(&output_path, &audio.left, &audio.right, SAMPLE_RATE)?;
        written += 1;

        tracing::debug!(pitch, path = %output_path.display(), "render written");
    }

    Ok(written)
}

/// Worker request loop.
///
/// Reads requests from stdin, renders, and writes responses to stdout.
fn worker_loop(
    worker_id: usize,
    settings: &RenderSettings,
    reader: &mut MessageReader,
    writer: &mut MessageWriter,
) -> io::Result<()> {
    // One engine for the whole run; tempo is applied exactly once.
    let mut engine = SynthEngine::new();
    engine.set_tempo(settings.bpm);

    writer.send(&WorkResponse::Ready)?;
    tracing::debug!(worker_id, "engine initialized, worker ready");

    loop {
        let request: WorkRequest = match reader.recv()? {
            Some(request) => request,
            // EOF: the coordinator went away, treat as shutdown
            None => return Ok(()),
        };

        match request {
            WorkRequest::Exit => return Ok(()),

            WorkRequest::Render { preset_path } => {
                match process_job(&mut engine, settings, &preset_path) {
                    Ok(files_written) => {
                        writer.send(&WorkResponse::Done { files_written })?;
                    }
                    Err(e) => {
                        // Fatal for this worker: report once and stop taking
                        // work. Unclaimed jobs stay available to the others.
                        let context = format!("processing {}", preset_path.display());
                        tracing::error!(worker_id, error = %e, %context, "worker giving up");
                        writer.send(&WorkResponse::error(e.to_string(), context))?;
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Run the worker subprocess main function. Never returns.
pub fn run_worker_main(worker_id: usize, settings: &RenderSettings) -> ! {
    // Ignore SIGPIPE; pipe errors surface as io::Error instead
    unsafe {
        nix::sys::signal::signal(
            nix::sys::signal::Signal::SIGPIPE,
            nix::sys::signal::SigHandler::SigIgn,
        )
        .ok();
    }

    // Safety: file descriptors 0 and 1 are always valid for stdin/stdout
    let stdin_fd = unsafe { PipeFd::from_raw(0) };
    let stdout_fd = unsafe { PipeFd::from_raw(1) };

    let mut reader = MessageReader::new(stdin_fd);
    let mut writer = MessageWriter::new(stdout_fd);

    match worker_loop(worker_id, settings, &mut reader, &mut writer) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("worker {} error: {}", worker_id, e);
            std::process::exit(1);
        }
    }
}
