//! Bounded file loading and output writing.
//!
//! Input files are memory-mapped read-only and copied into an owned buffer
//! that the redaction pass is free to mutate. Output is written next to the
//! final path first and renamed into place, so a failed run never leaves a
//! partial image behind.

pub mod error;

use crate::io::error::{IoError, Result};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Defines the resource limits for I/O operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOLimits {
    /// The absolute maximum file size that can be loaded.
    pub max_file_size: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 512 * 1024 * 1024, // 512MB
        }
    }
}

/// Load the whole file at `path` into an owned buffer.
///
/// Fails with `NotFound` when the path does not exist, `EmptyFile` when the
/// file has zero length on disk and `FileTooLarge` when it exceeds
/// `limits.max_file_size`.
pub fn load_image<P: AsRef<Path>>(path: P, limits: &IOLimits) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IoError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let file_size = file.metadata()?.len();

    debug!(
        path = %path.display(),
        size = file_size,
        limits.max_file_size = limits.max_file_size,
        "Loading image"
    );

    if file_size == 0 {
        return Err(IoError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    if file_size > limits.max_file_size {
        warn!(
            path = %path.display(),
            size = file_size,
            limit = limits.max_file_size,
            "File is too large"
        );
        return Err(IoError::FileTooLarge {
            limit: limits.max_file_size,
            found: file_size,
        });
    }

    // Safety: The file is backed by a real file on disk and we only request a read-only map.
    let mmap = unsafe { Mmap::map(&file)? };
    let data = mmap.to_vec();

    trace!(path = %path.display(), len = data.len(), "Copied mapped image");
    Ok(data)
}

/// Derive the output path: same directory and extension, `suffix` appended to the stem.
///
/// `app.exe` becomes `app_stripped.exe`; `driver` becomes `driver_stripped`.
pub fn output_path<P: AsRef<Path>>(input: P, suffix: &str) -> PathBuf {
    let input = input.as_ref();
    let mut name: OsString = input.file_stem().unwrap_or_default().to_os_string();
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

/// Write `data` to `path`, replacing any existing file.
pub fn write_image<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut partial_name = OsString::from(".");
    partial_name.push(path.file_name().unwrap_or_default());
    partial_name.push(".partial");
    let partial = path.with_file_name(partial_name);

    let written = fs::write(&partial, data).and_then(|_| fs::rename(&partial, path));
    if let Err(source) = written {
        let _ = fs::remove_file(&partial);
        return Err(IoError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    debug!(path = %path.display(), len = data.len(), "Wrote image");
    Ok(())
}
