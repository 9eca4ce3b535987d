//! Error types for debugstrip.
//!
//! Every failure is terminal: the run stops at the first error and no output
//! file is produced.

use thiserror::Error;

use crate::formats::pe::PeError;
use crate::io::error::IoError;

/// Main error type for debugstrip operations.
#[derive(Debug, Error)]
pub enum StripError {
    /// Missing or malformed command line
    #[error("Usage: debugstrip <binary>")]
    Usage,

    /// Reading or writing the image failed
    #[error(transparent)]
    Io(#[from] IoError),

    /// The in-memory image is empty
    #[error("The binary data is empty")]
    EmptyData,

    /// PE headers are structurally invalid or truncated
    #[error("An error has occured while trying to parse the PE header: {0}")]
    Parse(#[from] PeError),

    /// The optional header has no debug data directory
    #[error("Debug directory doesn't exist")]
    NoDebugDirectory,

    /// The debug directory is too small to hold a single record
    #[error("No debug entries found")]
    NoEntries,

    /// The debug directory RVA does not map to a file offset
    #[error("Debug directory offset is null (RVA {rva:#x} is not mapped)")]
    NullOffset { rva: u32 },

    /// A range scheduled for zeroing falls outside the image
    #[error("Range {offset:#x}+{len:#x} exceeds the image size of {buffer_len:#x} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },
}

/// Result type alias for debugstrip operations
pub type Result<T> = std::result::Result<T, StripError>;
