//! Command line behaviour of the `debugstrip` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use crate::common::*;

fn debugstrip<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    Command::new(env!("CARGO_BIN_EXE_debugstrip"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_no_arguments_prints_usage() {
    let output = debugstrip(Vec::<&str>::new());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Usage: debugstrip <binary>"));
}

#[test]
fn test_success_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("app.exe");
    let (original, _) = PeBuilder::new()
        .entry(Entry::rsds(r"C:\src\app.pdb"))
        .entry(Entry::new(16, vec![0x44; 0x20]))
        .build();
    fs::write(&input, &original).unwrap();

    let output = debugstrip([&input]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());

    let stripped = fs::read(dir.path().join("app_stripped.exe")).unwrap();
    assert_eq!(stripped.len(), original.len());
    assert!(!stripped
        .windows(b"app.pdb".len())
        .any(|w| w == b"app.pdb"));
}

fn assert_fails_with(path: &Path, message: &str) {
    let output = debugstrip([path]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains(message), "unexpected stderr: {}", err);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert_fails_with(
        &dir.path().join("missing.exe"),
        "The specified file doesn't exist",
    );
}

#[test]
fn test_empty_file() {
    let file = create_temp_file(b"");
    assert_fails_with(file.path(), "The specified file is empty");
}

#[test]
fn test_not_a_pe() {
    let file = create_temp_file(&[0x7F; 0x100]);
    assert_fails_with(
        file.path(),
        "An error has occured while trying to parse the PE header",
    );
}

#[test]
fn test_no_debug_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("plain.exe");
    fs::write(&input, PeBuilder::new().build().0).unwrap();

    assert_fails_with(&input, "Debug directory doesn't exist");
    assert!(!dir.path().join("plain_stripped.exe").exists());
}
