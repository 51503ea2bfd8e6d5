//! Error handling for the `lockst` CLI.

use thiserror::Error;

/// Top-level CLI error. `exit_code` maps each variant onto `spec.md` §6/§7's
/// three-way split: `1` for argument/file misuse, `255` (the two's-complement
/// wrap of the conventional `-1`) for any pipeline-phase failure.
#[derive(Error, Debug)]
pub enum LockstError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Pipeline(anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LockstError {
    pub fn exit_code(&self) -> i32 {
        match self {
            LockstError::Config(_) | LockstError::Usage(_) | LockstError::Io(_) => 1,
            LockstError::Pipeline(_) => 255,
        }
    }
}

pub type Result<T> = std::result::Result<T, LockstError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_and_config_errors_exit_one() {
        assert_eq!(LockstError::Usage("bad flag".into()).exit_code(), 1);
        assert_eq!(LockstError::Config("bad toml".into()).exit_code(), 1);
    }

    #[test]
    fn pipeline_errors_exit_255() {
        let err = LockstError::Pipeline(anyhow::anyhow!("TypeErr: boom"));
        assert_eq!(err.exit_code(), 255);
    }
}
