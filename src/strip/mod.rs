//! Debug directory redaction.
//!
//! Redaction runs in two passes over the same buffer. The planning pass only
//! reads: it parses the headers into an owned [`PeImage`], walks the debug
//! directory and records every range to zero. The fill pass then takes the
//! buffer mutably and applies the plan.

pub mod plan;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::StripConfig;
use crate::error::{Result, StripError};
use crate::formats::pe::directories::{
    entry_count, CodeViewInfo, DebugDirectory, DebugType, DEBUG_DIRECTORY_ENTRY_SIZE,
};
use crate::formats::pe::utils::find_pe_signature;
use crate::formats::pe::{ImageModel, PeImage, DATA_DIRECTORY_SIZE, IMAGE_DIRECTORY_ENTRY_DEBUG};
use crate::io;

pub use plan::{ByteRange, EntryReport, RangeKind, RedactionPlan};

/// Compute every range that has to be zeroed to remove the debug directory.
///
/// `image` supplies the header facts; `data` is only read.
pub fn plan<M: ImageModel + ?Sized>(image: &M, data: &[u8]) -> Result<RedactionPlan> {
    let descriptor = image
        .data_directory(IMAGE_DIRECTORY_ENTRY_DEBUG)
        .filter(|d| d.is_present())
        .ok_or(StripError::NoDebugDirectory)?;

    let count = entry_count(descriptor.size);
    if count == 0 {
        return Err(StripError::NoEntries);
    }

    let mut plan = RedactionPlan::new();

    // The descriptor is found through a raw signature scan, not e_lfanew
    plan.signature_offset = find_pe_signature(data);
    match plan.signature_offset {
        Some(signature) => {
            let field = image.data_directory_field_offset(IMAGE_DIRECTORY_ENTRY_DEBUG);
            let offset = signature
                .checked_add(field)
                .ok_or(StripError::OutOfBounds {
                    offset: signature,
                    len: field + DATA_DIRECTORY_SIZE,
                    buffer_len: data.len(),
                })?;
            plan.push(ByteRange::new(
                offset,
                DATA_DIRECTORY_SIZE,
                RangeKind::DirectoryDescriptor,
            ));
        }
        None => warn!("PE signature not found, leaving the debug data directory in place"),
    }

    let rva = image.data_dir_rva(IMAGE_DIRECTORY_ENTRY_DEBUG);
    let directory_offset = image
        .rva_to_file_offset(rva)
        .filter(|&offset| offset != 0)
        .ok_or(StripError::NullOffset { rva })?;
    plan.directory_offset = directory_offset;

    let directory = DebugDirectory::new(data, directory_offset, count).map_err(|_| {
        StripError::OutOfBounds {
            offset: directory_offset,
            len: count as usize * DEBUG_DIRECTORY_ENTRY_SIZE,
            buffer_len: data.len(),
        }
    })?;
    plan.push(ByteRange::new(
        directory_offset,
        directory.byte_len(),
        RangeKind::DirectoryEntries,
    ));

    for index in 0..directory.count() {
        let entry = directory.entry(index)?;
        let raw_data_offset = directory.entry_raw_data_offset(index)?;
        let raw_data_size = directory.entry_raw_data_size(index)?;
        let codeview = if entry.debug_type == DebugType::CodeView {
            directory.raw_data(&entry).and_then(CodeViewInfo::parse)
        } else {
            None
        };

        debug!(
            index,
            debug_type = ?entry.debug_type,
            pointer_to_raw_data = raw_data_offset,
            size_of_data = raw_data_size,
            codeview = codeview.as_ref().map(|c| c.to_string()),
            "Debug directory entry"
        );

        plan.push(ByteRange::new(
            raw_data_offset as usize,
            raw_data_size as usize,
            RangeKind::EntryRawData {
                index,
                debug_type: entry.debug_type,
            },
        ));
        plan.entries.push(EntryReport {
            index,
            entry,
            codeview,
        });
    }

    Ok(plan)
}

/// Redact the debug directory of the image held in `data`, in place.
pub fn redact_in_place(data: &mut [u8]) -> Result<RedactionPlan> {
    let span = crate::span_trace!("redact", len = data.len());
    let _guard = span.enter();

    if data.is_empty() {
        return Err(StripError::EmptyData);
    }

    // Both the header facts and the plan own their data, so the shared
    // borrow of `data` ends here
    let image = PeImage::parse(data)?;
    let plan = plan(&image, data)?;

    plan.apply(data)?;

    info!(
        entries = plan.entries.len(),
        ranges = plan.ranges().len(),
        bytes = plan.total_len(),
        "Debug directory redacted"
    );
    Ok(plan)
}

/// Redact the debug directory and return the same buffer.
pub fn redact(data: Vec<u8>) -> Result<Vec<u8>> {
    redact_with_report(data).map(|(data, _)| data)
}

/// Like [`redact`], also returning the plan that was applied.
pub fn redact_with_report(mut data: Vec<u8>) -> Result<(Vec<u8>, RedactionPlan)> {
    let plan = redact_in_place(&mut data)?;
    Ok((data, plan))
}

/// Result of stripping one file
#[derive(Debug, Clone)]
pub struct StripOutcome {
    pub output: PathBuf,
    pub plan: RedactionPlan,
}

/// Load `input`, redact it and write the result next to it.
///
/// Nothing is written unless redaction succeeds.
pub fn strip_file<P: AsRef<Path>>(input: P, config: &StripConfig) -> Result<StripOutcome> {
    let input = input.as_ref();
    let span = crate::span_trace!("strip_file", path = %input.display());
    let _guard = span.enter();

    let data = io::load_image(input, &config.io)?;
    let (data, plan) = redact_with_report(data)?;

    let output = io::output_path(input, &config.output_suffix);
    io::write_image(&output, &data)?;

    info!(output = %output.display(), "Stripped image written");
    Ok(StripOutcome { output, plan })
}
