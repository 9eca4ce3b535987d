//! Core PE data types and structures

use std::fmt;

// PE constants
pub const DOS_SIGNATURE: u16 = 0x5A4D; // MZ
pub const PE_SIGNATURE: [u8; 4] = *b"PE\0\0";
pub const PE32_MAGIC: u16 = 0x10B;
pub const PE32PLUS_MAGIC: u16 = 0x20B;

pub const DOS_HEADER_SIZE: usize = 64;
pub const COFF_HEADER_SIZE: usize = 20;
pub const SECTION_HEADER_SIZE: usize = 40;
pub const DATA_DIRECTORY_SIZE: usize = 8;
pub const MAX_DATA_DIRECTORIES: u32 = 16;

/// Offset of the data-directory array inside the PE32 optional header.
pub const PE32_DATA_DIRECTORY_OFFSET: usize = 96;
/// Offset of the data-directory array inside the PE32+ optional header.
pub const PE32PLUS_DATA_DIRECTORY_OFFSET: usize = 112;

// Loader alignment constants
pub const PAGE_SIZE: u32 = 0x1000;
pub const SECTOR_SIZE: u32 = 0x200;

// Data directory index of the debug directory
pub const IMAGE_DIRECTORY_ENTRY_DEBUG: usize = 6;

/// PE parsing error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeError {
    InvalidDosSignature,
    InvalidPeSignature,
    InvalidMagic(u16),
    TruncatedHeader { expected: usize, actual: usize },
    InvalidOffset { offset: usize },
}

impl fmt::Display for PeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDosSignature => write!(f, "Invalid DOS signature"),
            Self::InvalidPeSignature => write!(f, "Invalid PE signature"),
            Self::InvalidMagic(m) => write!(f, "Invalid optional header magic: 0x{:04x}", m),
            Self::TruncatedHeader { expected, actual } => {
                write!(
                    f,
                    "Truncated header: expected {} bytes, got {}",
                    expected, actual
                )
            }
            Self::InvalidOffset { offset } => write!(f, "Invalid file offset: 0x{:x}", offset),
        }
    }
}

impl std::error::Error for PeError {}

pub type Result<T> = std::result::Result<T, PeError>;

/// The parts of the DOS header the loader actually uses
#[derive(Debug, Clone, Copy)]
pub struct DosHeader {
    pub e_magic: u16,  // Magic number (MZ)
    pub e_lfanew: u32, // File address of PE header
}

/// COFF header (20 bytes)
#[derive(Debug, Clone, Copy)]
pub struct CoffHeader {
    pub machine: u16,
    pub number_of_sections: u16,
    pub time_date_stamp: u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: u16,
}

/// Data directory entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

impl DataDirectory {
    /// A slot is considered present only when both fields are non-zero.
    pub fn is_present(&self) -> bool {
        self.virtual_address != 0 && self.size != 0
    }
}

/// Optional header bitness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalHeaderKind {
    Pe32,
    Pe32Plus,
}

impl OptionalHeaderKind {
    /// Offset of the data-directory array from the start of the optional header
    pub fn data_directory_offset(self) -> usize {
        match self {
            Self::Pe32 => PE32_DATA_DIRECTORY_OFFSET,
            Self::Pe32Plus => PE32PLUS_DATA_DIRECTORY_OFFSET,
        }
    }
}

/// Optional header fields needed for debug-directory resolution
#[derive(Debug, Clone, Copy)]
pub struct OptionalHeader {
    pub kind: OptionalHeaderKind,
    pub magic: u16,
    pub section_alignment: u32,
    pub file_alignment: u32,
    pub size_of_image: u32,
    pub size_of_headers: u32,
    pub number_of_rva_and_sizes: u32,
}

impl OptionalHeader {
    pub fn is_64bit(&self) -> bool {
        self.kind == OptionalHeaderKind::Pe32Plus
    }
}

/// NT headers (PE signature + COFF + Optional)
#[derive(Debug, Clone)]
pub struct NtHeaders {
    pub signature: [u8; 4],
    pub file_header: CoffHeader,
    pub optional_header: OptionalHeader,
}

/// Section header
#[derive(Debug, Clone)]
pub struct SectionHeader {
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub characteristics: u32,
}

impl SectionHeader {
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(8);
        String::from_utf8_lossy(&self.name[..end]).to_string()
    }

    /// Whether the section has file-backed data at all
    pub fn has_raw_data(&self) -> bool {
        self.pointer_to_raw_data != 0 && self.size_of_raw_data != 0
    }

    /// Mapped extent used for RVA lookups; an empty virtual size falls back to the raw size
    pub fn mapped_size(&self) -> u32 {
        if self.virtual_size != 0 {
            self.virtual_size
        } else {
            self.size_of_raw_data
        }
    }

    pub fn contains_rva(&self, rva: u32) -> bool {
        let end = self.virtual_address as u64 + self.mapped_size() as u64;
        rva >= self.virtual_address && (rva as u64) < end
    }
}
