//! Section management for PE files

use crate::formats::pe::types::*;
use crate::formats::pe::utils::{read_u32, ReadExt};

/// Section table used for RVA resolution
#[derive(Debug, Clone)]
pub struct SectionTable {
    sections: Vec<SectionHeader>,
    section_alignment: u32,
}

impl SectionTable {
    /// Create a new section table.
    ///
    /// Headers are kept in file order: when sections overlap, the first
    /// matching header wins, as it does for the Windows loader.
    pub fn new(sections: Vec<SectionHeader>, section_alignment: u32) -> Self {
        Self {
            sections,
            section_alignment,
        }
    }

    /// Get all section headers
    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Find the file-backed section containing RVA
    pub fn section_containing_rva(&self, rva: u32) -> Option<&SectionHeader> {
        self.sections
            .iter()
            .filter(|s| s.has_raw_data())
            .find(|s| s.contains_rva(rva))
    }

    /// Convert RVA to file offset.
    ///
    /// Sections without raw data never match. For page-aligned images the raw
    /// pointer is rounded down to the sector size first.
    // Header-region RVAs and section-less images map to nothing; the loader
    // would pass those through as file offsets.
    pub fn rva_to_offset(&self, rva: u32) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let section = self.section_containing_rva(rva)?;

        let mut raw = section.pointer_to_raw_data;
        if self.section_alignment >= PAGE_SIZE {
            raw &= !(SECTOR_SIZE - 1);
        }

        let offset = raw as usize + (rva - section.virtual_address) as usize;
        Some(offset)
    }
}

/// Parse section headers from data
pub fn parse_section_headers(
    data: &[u8],
    offset: usize,
    count: u16,
) -> Result<Vec<SectionHeader>> {
    let mut sections = Vec::with_capacity(count as usize);

    for i in 0..count as usize {
        let section_offset = offset + i * SECTION_HEADER_SIZE;
        let raw = data
            .read_slice_at(section_offset, SECTION_HEADER_SIZE)
            .ok_or(PeError::TruncatedHeader {
                expected: section_offset + SECTION_HEADER_SIZE,
                actual: data.len(),
            })?;

        let mut name = [0u8; 8];
        name.copy_from_slice(&raw[..8]);

        sections.push(SectionHeader {
            name,
            virtual_size: read_u32(raw, 8)?,
            virtual_address: read_u32(raw, 12)?,
            size_of_raw_data: read_u32(raw, 16)?,
            pointer_to_raw_data: read_u32(raw, 20)?,
            characteristics: read_u32(raw, 36)?,
        });
    }

    Ok(sections)
}
