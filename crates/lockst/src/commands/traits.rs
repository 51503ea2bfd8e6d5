//! Common shape every `lockst` subcommand follows.

use crate::error::Result;

pub trait Command {
    type Args;

    fn new(args: Self::Args) -> Self;

    /// Runs the command, returning the process exit code on success.
    fn execute(&self) -> Result<i32>;

    fn name() -> &'static str;
}
