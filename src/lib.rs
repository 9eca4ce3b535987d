//! Remove debug information from PE images.
//!
//! The debug data directory of a PE file points at an array of records, and
//! each record points at a raw-data blob (a CodeView PDB reference, POGO
//! data, a reproducibility hash and so on). [`strip::redact`] zero-fills the
//! directory descriptor, the record array and every blob, leaving the rest of
//! the file byte-for-byte unchanged.
//!
//! ```no_run
//! use debugstrip::{strip_file, StripConfig};
//!
//! let outcome = strip_file("app.exe", &StripConfig::default())?;
//! println!("wrote {}", outcome.output.display());
//! # Ok::<(), debugstrip::StripError>(())
//! ```

pub mod config;
pub mod error;
pub mod formats;
pub mod io;
pub mod logging;
pub mod strip;

pub use config::StripConfig;
pub use error::{Result, StripError};
pub use strip::{redact, redact_in_place, redact_with_report, strip_file, RedactionPlan, StripOutcome};
