//! `lockst run <path> [--vm]` — lex/parse/analyze a source file, then
//! execute it on the tree-walking interpreter (default) or the bytecode
//! VM (`--vm`).

use crate::commands::traits::Command;
use crate::error::{LockstError, Result};
use lockc_drv::{Backend, Session};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub path: PathBuf,
    pub vm: bool,
}

pub struct RunCommand {
    args: RunArgs,
}

impl Command for RunCommand {
    type Args = RunArgs;

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<i32> {
        let backend = if self.args.vm { Backend::Vm } else { Backend::TreeWalk };
        info!(path = %self.args.path.display(), vm = self.args.vm, "running");

        let mut session = Session::load(&self.args.path)
            .map_err(|e| LockstError::Usage(format!("{e}")))?;

        let outcome = lockc_drv::run(&mut session, backend);
        match outcome {
            Err(analysis_err) => {
                session.report_diagnostics();
                Err(LockstError::Pipeline(analysis_err))
            }
            Ok(Err(runtime_err)) => {
                eprintln!("{}", runtime_err.render());
                Err(LockstError::Pipeline(anyhow::anyhow!("{}", runtime_err.render())))
            }
            Ok(Ok(())) => Ok(0),
        }
    }

    fn name() -> &'static str {
        "run"
    }
}

pub fn run_run(args: RunArgs) -> Result<i32> {
    RunCommand::new(args).execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_source(src: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), src).unwrap();
        file
    }

    #[test]
    fn tree_walk_runs_successfully() {
        let file = write_source("var x = 1 + 2; println(x);");
        let args = RunArgs { path: file.path().to_path_buf(), vm: false };
        assert_eq!(run_run(args).unwrap(), 0);
    }

    #[test]
    fn vm_runs_successfully() {
        let file = write_source("var x = 1 + 2; println(x);");
        let args = RunArgs { path: file.path().to_path_buf(), vm: true };
        assert_eq!(run_run(args).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let args = RunArgs { path: PathBuf::from("/nonexistent/file.lk"), vm: false };
        let err = run_run(args).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn runtime_error_exits_255() {
        let file = write_source("var x = 1 / 0;");
        let args = RunArgs { path: file.path().to_path_buf(), vm: false };
        let err = run_run(args).unwrap_err();
        assert_eq!(err.exit_code(), 255);
    }

    #[test]
    fn undefined_name_is_a_pipeline_error() {
        let file = write_source("println(missing);");
        let args = RunArgs { path: file.path().to_path_buf(), vm: false };
        let err = run_run(args).unwrap_err();
        assert_eq!(err.exit_code(), 255);
    }
}
