//! `lockst build <path> -o <out>` — compile and assemble a source file into
//! a binary bytecode image without running it.

use crate::commands::traits::Command;
use crate::error::{LockstError, Result};
use lockc_drv::Session;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct BuildArgs {
    pub path: PathBuf,
    pub output: PathBuf,
}

pub struct BuildCommand {
    args: BuildArgs,
}

impl Command for BuildCommand {
    type Args = BuildArgs;

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<i32> {
        info!(path = %self.args.path.display(), output = %self.args.output.display(), "building");

        let mut session = Session::load(&self.args.path)
            .map_err(|e| LockstError::Usage(format!("{e}")))?;

        let bytes = lockc_drv::build(&mut session).map_err(|e| {
            session.report_diagnostics();
            LockstError::Pipeline(e)
        })?;

        std::fs::write(&self.args.output, bytes)?;
        Ok(0)
    }

    fn name() -> &'static str {
        "build"
    }
}

pub fn run_build(args: BuildArgs) -> Result<i32> {
    BuildCommand::new(args).execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builds_a_binary_image() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("t.lk");
        let out = dir.path().join("t.lkb");
        std::fs::write(&src, "var x = 5; println(x);").unwrap();

        let args = BuildArgs { path: src, output: out.clone() };
        assert_eq!(run_build(args).unwrap(), 0);
        assert!(out.exists());
        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(&bytes[0..4], &[0x4d, 0x69, 0x68, 0x6f]);
    }

    #[test]
    fn rejects_a_program_with_analysis_errors() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("t.lk");
        let out = dir.path().join("t.lkb");
        std::fs::write(&src, "println(missing);").unwrap();

        let args = BuildArgs { path: src, output: out };
        let err = run_build(args).unwrap_err();
        assert_eq!(err.exit_code(), 255);
    }
}
