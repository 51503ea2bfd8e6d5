//! Subcommand implementations for the `lockst` CLI.

pub mod traits;

pub mod build;
pub mod disasm;
pub mod run;

pub use build::{run_build, BuildArgs};
pub use disasm::{run_disasm, DisasmArgs};
pub use run::{run_run, RunArgs};
