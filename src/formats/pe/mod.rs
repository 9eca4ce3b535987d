//! Minimal PE image model.
//!
//! Parsing is a single stateless pass over the file bytes that yields an owned
//! [`PeImage`]. The image keeps no reference to the buffer, so callers are free
//! to mutate the bytes once the facts they need have been extracted.

pub mod directories;
pub mod headers;
pub mod sections;
pub mod types;
pub mod utils;

use headers::*;
use sections::*;
pub use types::*;

/// Header facts the debug-directory redaction depends on.
///
/// [`PeImage`] is the real implementation; tests substitute their own.
pub trait ImageModel {
    /// Offset of data directory `index`, relative to the start of the PE
    /// signature.
    fn data_directory_field_offset(&self, index: usize) -> usize;

    /// Data directory slot `index`, if the optional header declares it.
    fn data_directory(&self, index: usize) -> Option<DataDirectory>;

    /// Translate an RVA into a file offset using the section table.
    fn rva_to_file_offset(&self, rva: u32) -> Option<usize>;

    /// VirtualAddress of data directory `index`, or 0 when absent.
    fn data_dir_rva(&self, index: usize) -> u32 {
        self.data_directory(index)
            .map(|d| d.virtual_address)
            .unwrap_or(0)
    }
}

/// Parsed PE header facts
#[derive(Debug, Clone)]
pub struct PeImage {
    dos_header: DosHeader,
    nt_headers: NtHeaders,
    data_directories: Vec<DataDirectory>,
    section_table: SectionTable,
}

impl PeImage {
    /// Parse the DOS, NT and section headers of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        // Parse DOS header
        let dos_header = parse_dos_header(data)?;

        // Parse NT headers
        let (nt_headers, data_directories) = parse_nt_headers(data, dos_header.e_lfanew as usize)?;

        // Parse section headers
        let section_offset = dos_header.e_lfanew as usize
            + 4
            + COFF_HEADER_SIZE
            + nt_headers.file_header.size_of_optional_header as usize;
        let section_headers = parse_section_headers(
            data,
            section_offset,
            nt_headers.file_header.number_of_sections,
        )?;

        let section_table =
            SectionTable::new(section_headers, nt_headers.optional_header.section_alignment);

        Ok(Self {
            dos_header,
            nt_headers,
            data_directories,
            section_table,
        })
    }

    /// Get DOS header
    pub fn dos_header(&self) -> &DosHeader {
        &self.dos_header
    }

    /// Get NT headers
    pub fn nt_headers(&self) -> &NtHeaders {
        &self.nt_headers
    }

    /// Get optional header
    pub fn optional_header(&self) -> &OptionalHeader {
        &self.nt_headers.optional_header
    }

    /// File offset of the `PE\0\0` signature as recorded by `e_lfanew`
    pub fn signature_offset(&self) -> usize {
        self.dos_header.e_lfanew as usize
    }

    /// Check if PE is 64-bit
    pub fn is_64bit(&self) -> bool {
        self.nt_headers.optional_header.is_64bit()
    }

    /// Get all section headers
    pub fn sections(&self) -> &[SectionHeader] {
        self.section_table.sections()
    }

    /// Check if file has debug info
    pub fn has_debug_info(&self) -> bool {
        self.data_directory(IMAGE_DIRECTORY_ENTRY_DEBUG)
            .is_some_and(|d| d.is_present())
    }
}

impl ImageModel for PeImage {
    fn data_directory_field_offset(&self, index: usize) -> usize {
        4 + COFF_HEADER_SIZE
            + self.nt_headers.optional_header.kind.data_directory_offset()
            + index * DATA_DIRECTORY_SIZE
    }

    fn data_directory(&self, index: usize) -> Option<DataDirectory> {
        self.data_directories.get(index).copied()
    }

    fn rva_to_file_offset(&self, rva: u32) -> Option<usize> {
        self.section_table.rva_to_offset(rva)
    }
}

/// Check whether `data` carries well-formed PE headers
pub fn is_valid_pe(data: &[u8]) -> bool {
    PeImage::parse(data).is_ok()
}
