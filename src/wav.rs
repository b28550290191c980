//! WAV file writing.
//!
//! Writes interleaved 16-bit PCM stereo files. The sample rate is only used
//! for the header, not for any processing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, WavefarmError};

/// Convert one f32 sample in [-1.0, 1.0] to i16, clamping out-of-range input.
fn to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        // Negative values scale by 32768 so -1.0 maps to i16::MIN exactly
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Write a stereo 16-bit PCM WAV file.
///
/// # Arguments
/// * `path` - Output file path
/// * `left` / `right` - Per-channel samples (f32, range [-1.0, 1.0])
/// * `sample_rate` - Sample rate in Hz (header only)
pub fn write_stereo_16bit(
    path: &Path,
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
) -> Result<()> {
    if left.len() != right.len() {
        return Err(WavefarmError::Render(format!(
            "channel length mismatch: left {} frames, right {} frames",
            left.len(),
            right.len()
        )));
    }

    let num_channels: u16 = 2;
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);
    let data_size = (left.len() * num_channels as usize * 2) as u32;
    let file_size = 36 + data_size;

    let mut out = BufWriter::new(File::create(path)?);

    // RIFF chunk
    out.write_all(b"RIFF")?;
    out.write_all(&file_size.to_le_bytes())?;
    out.write_all(b"WAVE")?;

    // fmt subchunk
    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?; // PCM
    out.write_all(&num_channels.to_le_bytes())?;
    out.write_all(&sample_rate.to_le_bytes())?;
    out.write_all(&byte_rate.to_le_bytes())?;
    out.write_all(&block_align.to_le_bytes())?;
    out.write_all(&bits_per_sample.to_le_bytes())?;

    // data subchunk, frames interleaved left then right
    out.write_all(b"data")?;
    out.write_all(&data_size.to_le_bytes())?;
    for (l, r) in left.iter().zip(right.iter()) {
        out.write_all(&to_i16(*l).to_le_bytes())?;
        out.write_all(&to_i16(*r).to_le_bytes())?;
    }

    out.flush()?;
    Ok(())
}
