//! PE data directory parsers

pub mod debug;

pub use debug::*;
