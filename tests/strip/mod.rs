//! End-to-end redaction tests.

mod cli;
mod redact;
