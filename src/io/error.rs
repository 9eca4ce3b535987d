//! Custom error types for the I/O module.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("The specified file doesn't exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("The specified file is empty: {}", path.display())]
    EmptyFile { path: PathBuf },

    #[error("File size of {found} bytes exceeds the maximum allowed size of {limit} bytes.")]
    FileTooLarge { limit: u64, found: u64 },

    #[error("Failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("An underlying I/O error occurred.")]
    StdIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IoError>;
