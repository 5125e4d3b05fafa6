//! Compile error types.

use std::path::PathBuf;
use thiserror::Error;

/// A compiler rejected its input, or an output could not be written.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("IO error when reading `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error when writing `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stylesheet for `{app}` failed to compile:\n{message}")]
    Sass { app: String, message: String },

    #[error("compile task failed: {0}")]
    Task(String),
}

impl CompileError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Message followed by every underlying cause.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }
        message
    }
}

impl From<tokio::task::JoinError> for CompileError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
