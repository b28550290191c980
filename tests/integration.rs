//! Integration tests for the wavefarm CLI.
//!
//! These drive the compiled binary end to end: real worker subprocesses,
//! real preset files, real WAV output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Get a command for the wavefarm binary.
fn wavefarm() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("wavefarm").unwrap()
}

/// A small valid preset document.
const VALID_PRESET: &str = r#"{
  "name": "test patch",
  "harmonics": [1.0, 2.0],
  "harmonic_amps": [1.0, 0.5],
  "mod_depth": 0.4,
  "amp_env": {"attack": 0.005, "decay": 0.02, "sustain": 0.6, "release": 0.02},
  "gain": 0.8
}"#;

fn write_valid_preset(dir: &Path, name: &str) {
    fs::write(dir.join(name), VALID_PRESET).unwrap();
}

fn write_corrupt_preset(dir: &Path, name: &str) {
    fs::write(dir.join(name), "this is not a preset {{{").unwrap();
}

fn count_wavs(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .path()
                .extension()
                .is_some_and(|ext| ext == "wav")
        })
        .count()
}

#[test]
fn render_three_presets_across_two_pitches_single_worker() {
    let tmp = tempdir().unwrap();
    let presets = tmp.path().join("presets");
    let out = tmp.path().join("out");
    fs::create_dir(&presets).unwrap();

    for name in ["kick.preset", "pad.preset", "lead.preset"] {
        write_valid_preset(&presets, name);
    }

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(&presets)
        .args(["--output-dir"])
        .arg(&out)
        .args([
            "--pitch-low", "60",
            "--pitch-high", "61",
            "--workers", "1",
            "--note-duration", "0.02",
            "--render-duration", "0.05",
            "--quiet",
        ])
        .assert()
        .success();

    // 3 presets * 2 pitches, deterministic names
    assert_eq!(count_wavs(&out), 6);
    for name in ["kick.preset", "pad.preset", "lead.preset"] {
        for pitch in [60, 61] {
            let expected = out.join(format!("{}_{}.wav", pitch, name));
            assert!(expected.exists(), "missing {}", expected.display());
        }
    }
}

#[test]
fn output_files_are_stereo_44100_pcm() {
    let tmp = tempdir().unwrap();
    let presets = tmp.path().join("presets");
    let out = tmp.path().join("out");
    fs::create_dir(&presets).unwrap();
    write_valid_preset(&presets, "tone.preset");

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(&presets)
        .args(["--output-dir"])
        .arg(&out)
        .args([
            "--workers", "1",
            "--note-duration", "0.05",
            "--render-duration", "0.1",
            "--quiet",
        ])
        .assert()
        .success();

    let data = fs::read(out.join("60_tone.preset.wav")).unwrap();
    assert_eq!(&data[0..4], b"RIFF");
    assert_eq!(&data[8..12], b"WAVE");
    assert_eq!(u16::from_le_bytes([data[22], data[23]]), 2); // channels
    assert_eq!(
        u32::from_le_bytes([data[24], data[25], data[26], data[27]]),
        44_100
    );
    // 0.1 s at 44.1 kHz: 4410 frames * 2 channels * 2 bytes
    let data_size = u32::from_le_bytes([data[40], data[41], data[42], data[43]]);
    assert_eq!(data_size, 4410 * 4);
}

#[test]
fn corrupt_preset_reports_one_failure_but_run_completes() {
    let tmp = tempdir().unwrap();
    let presets = tmp.path().join("presets");
    let out = tmp.path().join("out");
    fs::create_dir(&presets).unwrap();

    // Sorted discovery order puts the corrupt preset last, so a single
    // worker renders all four valid presets before failing.
    for name in ["a.preset", "b.preset", "c.preset", "d.preset"] {
        write_valid_preset(&presets, name);
    }
    write_corrupt_preset(&presets, "zz-broken.preset");

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(&presets)
        .args(["--output-dir"])
        .arg(&out)
        .args([
            "--workers", "1",
            "--note-duration", "0.02",
            "--render-duration", "0.05",
            "--quiet",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("zz-broken.preset"));

    // Every preset claimed before the failure produced its file
    for name in ["a.preset", "b.preset", "c.preset", "d.preset"] {
        assert!(out.join(format!("60_{}.wav", name)).exists());
    }
    assert_eq!(count_wavs(&out), 4);
}

#[test]
fn failed_worker_abandons_unclaimed_jobs() {
    let tmp = tempdir().unwrap();
    let presets = tmp.path().join("presets");
    let out = tmp.path().join("out");
    fs::create_dir(&presets).unwrap();

    // Corrupt preset sorts first; with a single worker the remaining jobs
    // have no live worker left to claim them. That gap is reported, not
    // silently hidden.
    write_corrupt_preset(&presets, "aa-broken.preset");
    write_valid_preset(&presets, "b.preset");
    write_valid_preset(&presets, "c.preset");

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(&presets)
        .args(["--output-dir"])
        .arg(&out)
        .args([
            "--workers", "1",
            "--note-duration", "0.02",
            "--render-duration", "0.05",
            "--quiet",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("aa-broken.preset"));

    assert_eq!(count_wavs(&out), 0);
}

#[test]
fn multiple_workers_drain_the_whole_queue() {
    let tmp = tempdir().unwrap();
    let presets = tmp.path().join("presets");
    let out = tmp.path().join("out");
    fs::create_dir(&presets).unwrap();

    for i in 0..8 {
        write_valid_preset(&presets, &format!("p{}.preset", i));
    }

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(&presets)
        .args(["--output-dir"])
        .arg(&out)
        .args([
            "--workers", "4",
            "--note-duration", "0.02",
            "--render-duration", "0.05",
            "--quiet",
        ])
        .assert()
        .success();

    assert_eq!(count_wavs(&out), 8);
}

#[test]
fn presets_in_subdirectories_are_discovered() {
    let tmp = tempdir().unwrap();
    let presets = tmp.path().join("presets");
    let nested = presets.join("bank-a").join("pads");
    let out = tmp.path().join("out");
    fs::create_dir_all(&nested).unwrap();

    write_valid_preset(&presets, "top.preset");
    write_valid_preset(&nested, "deep.preset");

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(&presets)
        .args(["--output-dir"])
        .arg(&out)
        .args([
            "--workers", "1",
            "--note-duration", "0.02",
            "--render-duration", "0.05",
            "--quiet",
        ])
        .assert()
        .success();

    assert!(out.join("60_top.preset.wav").exists());
    assert!(out.join("60_deep.preset.wav").exists());
}

#[test]
fn empty_preset_directory_succeeds_with_no_output() {
    let tmp = tempdir().unwrap();
    let presets = tmp.path().join("presets");
    let out = tmp.path().join("out");
    fs::create_dir(&presets).unwrap();

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(&presets)
        .args(["--output-dir"])
        .arg(&out)
        .args(["--workers", "1", "--quiet"])
        .assert()
        .success();

    assert_eq!(count_wavs(&out), 0);
}

#[test]
fn missing_preset_directory_is_a_coordinator_fault() {
    let tmp = tempdir().unwrap();

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(tmp.path().join("nope"))
        .args(["--workers", "1", "--quiet"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn inverted_pitch_range_is_rejected() {
    wavefarm()
        .args([
            "render",
            "--preset-dir", "/tmp",
            "--pitch-low", "72",
            "--pitch-high", "60",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("pitch range"));
}

#[test]
fn output_directory_is_created_if_absent() {
    let tmp = tempdir().unwrap();
    let presets = tmp.path().join("presets");
    let out = tmp.path().join("does").join("not").join("exist");
    fs::create_dir(&presets).unwrap();
    write_valid_preset(&presets, "x.preset");

    wavefarm()
        .args(["render", "--preset-dir"])
        .arg(&presets)
        .args(["--output-dir"])
        .arg(&out)
        .args([
            "--workers", "1",
            "--note-duration", "0.02",
            "--render-duration", "0.05",
            "--quiet",
        ])
        .assert()
        .success();

    assert!(out.join("60_x.preset.wav").exists());
}

#[test]
fn completions_subcommand_prints_script() {
    wavefarm()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wavefarm"));
}
