use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported emit format: {0}")]
    UnsupportedFormat(String),
    #[error("syntax error on line {line}: expected {expected}, found {found}")]
    Syntax {
        line: usize,
        expected: String,
        found: String,
    },
    #[error("function '{0}' is defined more than once")]
    DuplicateFunction(String),
    #[error("call to undefined function '{0}'")]
    UndefinedFunction(String),
    #[error("C compiler exited with {status}: {stderr}")]
    ToolchainFailed { status: ExitStatus, stderr: String },
}
