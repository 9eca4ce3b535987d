//! Configuration for a strip run.
//!
//! There is no configuration file; library callers build a [`StripConfig`]
//! in code, the command line always uses the defaults.

use serde::{Deserialize, Serialize};

use crate::io::IOLimits;

/// Suffix appended to the input file stem to form the output name.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_stripped";

/// Master configuration for stripping one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Limits applied while loading the input file.
    pub io: IOLimits,
    /// Suffix inserted between the file stem and its extension.
    pub output_suffix: String,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            io: IOLimits::default(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}
