use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for launching processes and parsing the launch contract
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Executable not found: {0}")]
    NotFound(PathBuf),

    #[error("Permission denied launching {0}")]
    PermissionDenied(PathBuf),

    #[error("Failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Unrecognized invocation: {0}")]
    Usage(String),
}

impl ProcessError {
    /// Classify an `io::Error` returned by the OS spawn call
    pub fn from_spawn(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => ProcessError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => ProcessError::PermissionDenied(path.to_path_buf()),
            _ => ProcessError::Spawn {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub(crate) fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ProcessError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if repeating the same launch cannot succeed without outside changes
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProcessError::NotFound(_)
                | ProcessError::PermissionDenied(_)
                | ProcessError::InvalidArgument { .. }
                | ProcessError::Usage(_)
        )
    }
}
