//! `lockst disasm <image>` — load a previously built binary image and print
//! its textual form back, one instruction per line.

use crate::commands::traits::Command;
use crate::error::{LockstError, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DisasmArgs {
    pub image: PathBuf,
}

pub struct DisasmCommand {
    args: DisasmArgs,
}

impl Command for DisasmCommand {
    type Args = DisasmArgs;

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<i32> {
        info!(image = %self.args.image.display(), "disassembling");

        let bytes = std::fs::read(&self.args.image)?;
        let text = lockc_drv::disassemble(&bytes).map_err(LockstError::Pipeline)?;
        println!("{text}");
        Ok(0)
    }

    fn name() -> &'static str {
        "disasm"
    }
}

pub fn run_disasm(args: DisasmArgs) -> Result<i32> {
    DisasmCommand::new(args).execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockc_drv::Session;
    use tempfile::TempDir;

    #[test]
    fn disassembles_a_built_image() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("t.lkb");
        let mut session = Session::from_source("t.lk", "println(1);");
        let bytes = lockc_drv::build(&mut session).unwrap();
        std::fs::write(&image_path, bytes).unwrap();

        let args = DisasmArgs { image: image_path };
        assert_eq!(run_disasm(args).unwrap(), 0);
    }

    #[test]
    fn rejects_a_corrupt_image() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("bad.lkb");
        std::fs::write(&image_path, b"not a real image").unwrap();

        let args = DisasmArgs { image: image_path };
        assert_eq!(run_disasm(args).unwrap_err().exit_code(), 255);
    }
}
