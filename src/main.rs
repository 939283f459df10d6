//! pyc command-line entry point.

mod cli;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command};
use pyc::{BuildOptions, PycError, build_executable, emit_c, parse, run_module};
use pyc_runtime::Runtime;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PYC_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn execute(command: Command) -> Result<u8, PycError> {
    match command {
        Command::Run { file, convention } => {
            let module = parse(&read_source(&file)?)?;
            let runtime = Runtime::with_convention(convention.into());
            let code = run_module(&runtime, &module, std::io::stdout().lock())?;
            debug!(code, stats = ?runtime.stats(), "program finished");
            // The OS only keeps the low byte
            Ok(code as u8)
        }
        Command::Emit {
            file,
            output,
            convention,
        } => {
            let module = parse(&read_source(&file)?)?;
            let program = emit_c(&module, convention.into())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, program)?;
                    info!(path = %path.display(), "wrote C source");
                }
                None => std::io::stdout().lock().write_all(program.as_bytes())?,
            }
            Ok(0)
        }
        Command::Build {
            file,
            output,
            convention,
            runtime,
            cc,
        } => {
            let module = parse(&read_source(&file)?)?;
            let program = emit_c(&module, convention.into())?;
            let output = output.unwrap_or_else(|| file.with_extension(""));
            let options = BuildOptions {
                compiler: cc,
                runtime_library: runtime,
            };
            build_executable(&program, &output, &options)?;
            Ok(0)
        }
        Command::Check { file } => {
            let module = parse(&read_source(&file)?)?;
            println!("{}: ok ({} statements)", file.display(), module.body.len());
            Ok(0)
        }
    }
}

fn read_source(path: &Path) -> Result<String, PycError> {
    Ok(std::fs::read_to_string(path)?)
}
