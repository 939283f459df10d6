//! Command-line interface for the pyc compiler.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pyc_runtime::RefConvention;

#[derive(Parser)]
#[command(name = "pyc")]
#[command(about = "Run or compile a small Python subset", long_about = None)]
pub struct Cli {
    /// Log helper dispatch and evaluation to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate a program; the exit status is the result of `main()`
    Run {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Convention::NewReference)]
        convention: Convention,
    },
    /// Translate a program to C
    Emit {
        file: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Convention::NewReference)]
        convention: Convention,
    },
    /// Compile a program to a native executable with the system C compiler
    Build {
        file: PathBuf,

        /// Executable path; defaults to the source path without its extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Convention::NewReference)]
        convention: Convention,

        /// Static runtime library to link; defaults to `$PYC_RUNTIME_LIB`,
        /// then a `libpyc_runtime.a` next to the pyc executable
        #[arg(long)]
        runtime: Option<PathBuf>,

        /// C compiler driver; defaults to `$CC`, then `cc`
        #[arg(long)]
        cc: Option<String>,
    },
    /// Parse a program and report syntax errors
    Check { file: PathBuf },
}

/// How `None` references are handed out by the runtime
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Convention {
    NewReference,
    Borrowed,
}

impl From<Convention> for RefConvention {
    fn from(convention: Convention) -> Self {
        match convention {
            Convention::NewReference => RefConvention::NewReference,
            Convention::Borrowed => RefConvention::Borrowed,
        }
    }
}
