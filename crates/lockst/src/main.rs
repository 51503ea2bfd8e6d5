//! `lockst` — run, build and disassemble Locks programs.
//!
//! ```text
//! lockst run <path>            # lex/parse/analyze, then tree-walk execute
//! lockst run <path> --vm       # lex/parse/analyze, then compile/assemble/execute on the VM
//! lockst build <path> -o <out> # compile+assemble only
//! lockst disasm <image>        # load a binary image and print its textual form
//! ```

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    build::{run_build, BuildArgs},
    disasm::{run_disasm, DisasmArgs},
    run::{run_run, RunArgs},
};
use config::Config;
use error::{LockstError, Result};

#[derive(Parser, Debug)]
#[command(name = "lockst")]
#[command(author = "Locks Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run, build and disassemble Locks programs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Raise the tracing filter to `debug`.
    #[arg(short, long, global = true, env = "LOCKST_VERBOSE")]
    verbose: bool,

    /// Path to a `lockst.toml` configuration file.
    #[arg(short, long, global = true, env = "LOCKST_CONFIG")]
    config: Option<PathBuf>,

    /// Disable ANSI diagnostic coloring.
    #[arg(long, global = true, env = "LOCKST_NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a Locks source file.
    Run(RunCommand),

    /// Compile and assemble a source file into a binary image.
    Build(BuildCommand),

    /// Disassemble a binary image back into readable text.
    Disasm(DisasmCommand),
}

#[derive(Parser, Debug)]
struct RunCommand {
    /// Path to the Locks source file.
    path: PathBuf,

    /// Run on the bytecode VM instead of the tree-walking interpreter.
    #[arg(long)]
    vm: bool,
}

#[derive(Parser, Debug)]
struct BuildCommand {
    /// Path to the Locks source file.
    path: PathBuf,

    /// Where to write the binary image.
    #[arg(short, long, default_value = "a.lockb")]
    output: PathBuf,
}

#[derive(Parser, Debug)]
struct DisasmCommand {
    /// Path to a binary image produced by `lockst build`.
    image: PathBuf,
}

fn main() {
    let exit_code = match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}

fn try_main() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.no_color)?;

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Run(cmd) => run_run(RunArgs { path: cmd.path, vm: cmd.vm || config.vm }),
        Commands::Build(cmd) => run_build(BuildArgs { path: cmd.path, output: cmd.output }),
        Commands::Disasm(cmd) => run_disasm(DisasmArgs { image: cmd.image }),
    }
}

fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };

    let subscriber =
        fmt::layer().with_ansi(!no_color).with_target(false).with_thread_ids(false).with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| LockstError::Config(format!("failed to initialize logging: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_vm_flag() {
        let cli = Cli::parse_from(["lockst", "run", "main.lk", "--vm"]);
        match cli.command {
            Commands::Run(cmd) => {
                assert_eq!(cmd.path, PathBuf::from("main.lk"));
                assert!(cmd.vm);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn parses_build_with_output() {
        let cli = Cli::parse_from(["lockst", "build", "main.lk", "-o", "out.lockb"]);
        match cli.command {
            Commands::Build(cmd) => {
                assert_eq!(cmd.path, PathBuf::from("main.lk"));
                assert_eq!(cmd.output, PathBuf::from("out.lockb"));
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parses_disasm() {
        let cli = Cli::parse_from(["lockst", "disasm", "image.lockb"]);
        assert!(matches!(cli.command, Commands::Disasm(_)));
    }
}
