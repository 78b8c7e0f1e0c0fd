//! Error types shared by the scanner and the build driver.

use crate::toolchain::ToolchainError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code used when scanning the sources fails.
pub const EXIT_SCAN_FAILURE: i32 = 2;

/// Exit code used when the compiler rejects the program.
pub const EXIT_COMPILE_FAILURE: i32 = 3;

/// Exit code for every other failure of the tool itself.
pub const EXIT_TOOL_FAILURE: i32 = 1;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    /// An explicitly requested source file does not exist.
    #[error("can not find source file \"{}\"", path.display())]
    MissingRootFile { path: PathBuf },

    /// A file reached through the include graph could not be read.
    #[error("failed to read \"{}\": {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler exited with a non-zero status.
    #[error("compilation failed (compiler exited with {code})")]
    CompileError { code: i32, stderr: String },

    #[error("failed to start \"{program}\": {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("I/O error on \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::MissingRootFile { .. } | BuildError::ReadError { .. } => EXIT_SCAN_FAILURE,
            BuildError::CompileError { .. } => EXIT_COMPILE_FAILURE,
            BuildError::Spawn { .. } | BuildError::Toolchain(_) | BuildError::Io { .. } => {
                EXIT_TOOL_FAILURE
            }
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
