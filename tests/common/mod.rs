//! Common test utilities for running the pyc binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::{NamedTempFile, TempDir};

/// Write `source` to a temporary `.py` file
pub fn source_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".py").expect("Failed to create temp file");
    file.write_all(source.as_bytes())
        .expect("Failed to write source");
    file
}

/// Run the pyc binary with `args` followed by a file holding `source`
pub fn run_pyc(args: &[&str], source: &str) -> Output {
    let file = source_file(source);
    Command::new(env!("CARGO_BIN_EXE_pyc"))
        .args(args)
        .arg(file.path())
        .env_remove("PYC_LOG")
        .output()
        .expect("Failed to execute pyc")
}

#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn c_compiler() -> String {
    std::env::var("CC")
        .ok()
        .filter(|cc| !cc.is_empty())
        .unwrap_or_else(|| "cc".to_owned())
}

/// Compile `source` with `pyc build` and run the resulting executable.
///
/// Returns `None`, after saying why, when the machine has no C compiler or
/// the runtime's static library has not been built.
#[allow(dead_code)]
pub fn compile_and_run_native(name: &str, source: &str) -> Option<Output> {
    let compiler_works = Command::new(c_compiler())
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());
    if !compiler_works {
        eprintln!("skipping {name}: no C compiler");
        return None;
    }

    let dir = TempDir::new().expect("Failed to create temp dir");
    let source_path = dir.path().join(name);
    std::fs::write(&source_path, source).expect("Failed to write source");
    let stem = Path::new(name).file_stem().expect("Source name has no stem");
    let exe = dir.path().join(stem);

    let build = Command::new(env!("CARGO_BIN_EXE_pyc"))
        .arg("build")
        .arg(&source_path)
        .arg("-o")
        .arg(&exe)
        .env_remove("PYC_LOG")
        .output()
        .expect("Failed to execute pyc");
    if stderr(&build).contains("could not find libpyc_runtime.a") {
        eprintln!("skipping {name}: runtime library not built");
        return None;
    }
    assert!(
        build.status.success(),
        "pyc build failed for {name}:\n{}",
        stderr(&build)
    );

    Some(Command::new(&exe).output().expect("Failed to run native binary"))
}
