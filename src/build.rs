//! Native executables
//!
//! The emitted translation unit is written to a scratch directory and handed
//! to the system C compiler together with the `pyc-runtime` static library.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::{debug, info};

use crate::errors::{BuildError, BuildResult};

/// File name of the runtime's static library
pub const RUNTIME_LIBRARY: &str = "libpyc_runtime.a";

/// Environment variable naming the runtime's static library
pub const RUNTIME_LIBRARY_ENV: &str = "PYC_RUNTIME_LIB";

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// C compiler driver; falls back to `$CC`, then `cc`
    pub compiler: Option<String>,
    /// Static library to link; searched for when absent
    pub runtime_library: Option<PathBuf>,
}

impl BuildOptions {
    fn compiler(&self) -> String {
        self.compiler
            .clone()
            .or_else(|| env::var("CC").ok().filter(|cc| !cc.is_empty()))
            .unwrap_or_else(|| "cc".to_owned())
    }
}

/// Compile the C `program` and link it into the executable `output`
pub fn build_executable(program: &str, output: &Path, options: &BuildOptions) -> BuildResult<()> {
    let runtime_library = match &options.runtime_library {
        Some(path) => path.clone(),
        None => find_runtime_library()?,
    };
    let compiler = options.compiler();

    let tmp_dir = TempDir::new()?;
    let source_path = tmp_dir.path().join("main.c");
    fs::write(&source_path, program)?;

    let mut command = Command::new(&compiler);
    command
        .arg("-std=c99")
        .arg("-O2")
        .arg(&source_path)
        .arg(&runtime_library)
        .arg("-o")
        .arg(output)
        .args(system_libraries());
    debug!(?command, "invoking C compiler");

    let result = command.output().map_err(|source| BuildError::CompilerUnavailable {
        compiler: compiler.clone(),
        source,
    })?;
    if !result.status.success() {
        return Err(BuildError::CompilerFailed {
            compiler,
            status: result.status,
            output: output.to_path_buf(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        });
    }

    // Closing explicitly surfaces a failure to clean up
    tmp_dir.close()?;
    info!(path = %output.display(), "built executable");
    Ok(())
}

/// Locate `libpyc_runtime.a`.
///
/// `PYC_RUNTIME_LIB` wins. Otherwise the library is looked for next to the
/// running executable, in its parent (test binaries run from `deps/`), and
/// among the hashed copies cargo leaves in `deps/`.
pub fn find_runtime_library() -> BuildResult<PathBuf> {
    if let Some(path) = env::var_os(RUNTIME_LIBRARY_ENV) {
        let path = PathBuf::from(path);
        return if path.is_file() {
            Ok(path)
        } else {
            Err(BuildError::RuntimeNotFound)
        };
    }

    let exe = env::current_exe()?;
    let Some(exe_dir) = exe.parent() else {
        return Err(BuildError::RuntimeNotFound);
    };
    let mut dirs = vec![exe_dir.to_path_buf()];
    if let Some(parent) = exe_dir.parent() {
        dirs.push(parent.to_path_buf());
    }
    search_runtime_library(&dirs).ok_or(BuildError::RuntimeNotFound)
}

/// The first `libpyc_runtime.a` in `dirs`, else the newest hashed
/// `libpyc_runtime-*.a` in their `deps/` directories
pub fn search_runtime_library(dirs: &[PathBuf]) -> Option<PathBuf> {
    if let Some(path) = dirs
        .iter()
        .map(|dir| dir.join(RUNTIME_LIBRARY))
        .find(|path| path.is_file())
    {
        return Some(path);
    }

    let mut candidates = Vec::new();
    for dir in dirs {
        for deps in [dir.clone(), dir.join("deps")] {
            let Ok(entries) = fs::read_dir(&deps) else {
                continue;
            };
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with("libpyc_runtime-") && name.ends_with(".a") {
                    let modified = entry.metadata().and_then(|m| m.modified()).ok();
                    candidates.push((modified, entry.path()));
                }
            }
        }
    }
    candidates.sort();
    candidates.pop().map(|(_, path)| path)
}

/// Native libraries Rust's standard library needs when linked statically
fn system_libraries() -> &'static [&'static str] {
    if cfg!(target_os = "linux") {
        &["-lpthread", "-ldl", "-lm"]
    } else if cfg!(target_os = "macos") {
        &["-lSystem", "-lm"]
    } else {
        &[]
    }
}
