use assert_cmd::prelude::*;
use std::path::PathBuf;
use std::process::Command;

/// Write a word image to a unique temp file, big-endian like the assembler
/// emits.
fn write_image(name: &str, words: &[u16]) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("bobbin-{name}-{}.lc3", std::process::id()));
    let mut bytes = Vec::with_capacity(words.len() * 2);
    for word in words {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn fails_without_arguments() {
    let mut cmd = Command::cargo_bin("bobbin").unwrap();
    cmd.assert().failure().code(2);
}

#[test]
fn reports_missing_image() {
    let mut cmd = Command::cargo_bin("bobbin").unwrap();
    cmd.arg("no-such-image.lc3").assert().failure().code(1);
}

#[test]
fn rejects_unaligned_image() {
    let mut path = std::env::temp_dir();
    path.push(format!("bobbin-unaligned-{}.lc3", std::process::id()));
    std::fs::write(&path, [0x30, 0x00, 0xF0]).unwrap();

    let mut cmd = Command::cargo_bin("bobbin").unwrap();
    cmd.arg(&path).assert().failure().code(1);
}

#[test]
fn runs_halt_image_cleanly() {
    // AND R0, R0, #0 / ADD R0, R0, #10 / TRAP x25
    let image = write_image("halt", &[0x3000, 0x5020, 0x102A, 0xF025]);

    let mut cmd = Command::cargo_bin("bobbin").unwrap();
    cmd.arg(&image).assert().success().stdout("");
}

#[test]
fn prints_program_output() {
    // LEA R0, #2 / TRAP x22 / TRAP x25 / "HI\0"
    let image = write_image(
        "puts",
        &[0x3000, 0xE002, 0xF022, 0xF025, 0x0048, 0x0049, 0x0000],
    );

    let mut cmd = Command::cargo_bin("bobbin").unwrap();
    cmd.arg(&image).assert().success().stdout("HI");
}

#[test]
fn trace_logs_each_instruction() {
    let image = write_image("trace", &[0x3000, 0x5020, 0x102A, 0xF025]);

    let mut cmd = Command::cargo_bin("bobbin").unwrap();
    cmd.arg("--trace").arg(&image).assert().success().stdout(
        "PC: 0x3000 Instr: 0x5020 Op: 0x5\n\
         PC: 0x3001 Instr: 0x102A Op: 0x1\n\
         PC: 0x3002 Instr: 0xF025 Op: 0xF\n",
    );
}

#[test]
fn later_images_overlay_earlier_ones() {
    // Base image prints "HI"; the overlay replaces the 'I' with '!'
    let base = write_image(
        "overlay-base",
        &[0x3000, 0xE002, 0xF022, 0xF025, 0x0048, 0x0049, 0x0000],
    );
    let patch = write_image("overlay-patch", &[0x3004, 0x0021]);

    let mut cmd = Command::cargo_bin("bobbin").unwrap();
    cmd.arg(&base).arg(&patch).assert().success().stdout("H!");
}
