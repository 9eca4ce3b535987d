//! Debug directory parsing.
//!
//! The debug directory is an array of fixed-size `IMAGE_DEBUG_DIRECTORY`
//! records. Each record points at a raw-data blob in the file (CodeView PDB
//! references, POGO data, reproducibility hashes, ...).

use std::fmt;

use serde::Serialize;

use crate::formats::pe::types::{PeError, Result};
use crate::formats::pe::utils::{check_bounds, ReadExt};

/// Size of one `IMAGE_DEBUG_DIRECTORY` record
pub const DEBUG_DIRECTORY_ENTRY_SIZE: usize = 28;

// Field offsets inside a record
const TYPE_OFFSET: usize = 12;
const SIZE_OF_DATA_OFFSET: usize = 16;
const POINTER_TO_RAW_DATA_OFFSET: usize = 24;

const MAX_PDB_PATH: usize = 260;

/// Number of whole records described by a directory of `directory_size` bytes.
///
/// Trailing bytes that do not form a complete record are ignored.
pub fn entry_count(directory_size: u32) -> u32 {
    directory_size / DEBUG_DIRECTORY_ENTRY_SIZE as u32
}

/// Debug information types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DebugType {
    Unknown,              // 0
    Coff,                 // 1
    CodeView,             // 2
    Fpo,                  // 3
    Misc,                 // 4
    Exception,            // 5
    Fixup,                // 6
    OmapToSrc,            // 7
    OmapFromSrc,          // 8
    Borland,              // 9
    Clsid,                // 11
    VcFeature,            // 12
    Pogo,                 // 13
    Iltcg,                // 14
    Mpx,                  // 15
    Repro,                // 16
    ExDllCharacteristics, // 20
    Other(u32),
}

impl From<u32> for DebugType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Unknown,
            1 => Self::Coff,
            2 => Self::CodeView,
            3 => Self::Fpo,
            4 => Self::Misc,
            5 => Self::Exception,
            6 => Self::Fixup,
            7 => Self::OmapToSrc,
            8 => Self::OmapFromSrc,
            9 => Self::Borland,
            11 => Self::Clsid,
            12 => Self::VcFeature,
            13 => Self::Pogo,
            14 => Self::Iltcg,
            15 => Self::Mpx,
            16 => Self::Repro,
            20 => Self::ExDllCharacteristics,
            other => Self::Other(other),
        }
    }
}

/// Debug directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugEntry {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub debug_type: DebugType,
    pub size_of_data: u32,
    pub address_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
}

/// Read-only view of a debug directory inside the file bytes
#[derive(Debug, Clone, Copy)]
pub struct DebugDirectory<'data> {
    data: &'data [u8],
    file_offset: usize,
    count: u32,
}

impl<'data> DebugDirectory<'data> {
    /// View `count` records starting at `file_offset`.
    ///
    /// Fails if the record array does not fit in `data`.
    pub fn new(data: &'data [u8], file_offset: usize, count: u32) -> Result<Self> {
        check_bounds(
            file_offset,
            count as usize * DEBUG_DIRECTORY_ENTRY_SIZE,
            data.len(),
        )?;
        Ok(Self {
            data,
            file_offset,
            count,
        })
    }

    /// Number of records
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Total size of the record array in bytes
    pub fn byte_len(&self) -> usize {
        self.count as usize * DEBUG_DIRECTORY_ENTRY_SIZE
    }

    fn field_u32(&self, index: u32, field: usize) -> Result<u32> {
        if index >= self.count {
            return Err(PeError::InvalidOffset {
                offset: self.record_offset(index),
            });
        }
        let offset = self.record_offset(index) + field;
        self.data
            .read_u32_le_at(offset)
            .ok_or(PeError::InvalidOffset { offset })
    }

    fn record_offset(&self, index: u32) -> usize {
        self.file_offset + index as usize * DEBUG_DIRECTORY_ENTRY_SIZE
    }

    /// PointerToRawData of record `index`
    pub fn entry_raw_data_offset(&self, index: u32) -> Result<u32> {
        self.field_u32(index, POINTER_TO_RAW_DATA_OFFSET)
    }

    /// SizeOfData of record `index`
    pub fn entry_raw_data_size(&self, index: u32) -> Result<u32> {
        self.field_u32(index, SIZE_OF_DATA_OFFSET)
    }

    /// Decode record `index`.
    ///
    /// The raw-data location comes from the same accessors the redactor
    /// uses, so both always agree.
    pub fn entry(&self, index: u32) -> Result<DebugEntry> {
        let raw = self
            .data
            .read_slice_at(self.record_offset(index), DEBUG_DIRECTORY_ENTRY_SIZE)
            .filter(|_| index < self.count)
            .ok_or(PeError::InvalidOffset {
                offset: self.record_offset(index),
            })?;

        // The slice is exactly one record, so every read below is in range
        let u16_at = |o: usize| raw.read_u16_le_at(o).unwrap_or_default();
        let u32_at = |o: usize| raw.read_u32_le_at(o).unwrap_or_default();

        Ok(DebugEntry {
            characteristics: u32_at(0),
            time_date_stamp: u32_at(4),
            major_version: u16_at(8),
            minor_version: u16_at(10),
            debug_type: DebugType::from(u32_at(TYPE_OFFSET)),
            size_of_data: self.entry_raw_data_size(index)?,
            address_of_raw_data: u32_at(20),
            pointer_to_raw_data: self.entry_raw_data_offset(index)?,
        })
    }

    /// Raw-data payload of an entry, if it lies inside the file
    pub fn raw_data(&self, entry: &DebugEntry) -> Option<&'data [u8]> {
        self.data.read_slice_at(
            entry.pointer_to_raw_data as usize,
            entry.size_of_data as usize,
        )
    }
}

/// Decoded CodeView record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format")]
pub enum CodeViewInfo {
    /// PDB 7.0 record (`RSDS`)
    Rsds {
        guid: String,
        age: u32,
        pdb_path: String,
    },
    /// PDB 2.0 record (`NB10`)
    Nb10 {
        timestamp: u32,
        age: u32,
        pdb_path: String,
    },
}

impl CodeViewInfo {
    /// Decode the payload of a CodeView debug entry
    pub fn parse(data: &[u8]) -> Option<Self> {
        match data.read_slice_at(0, 4)? {
            b"RSDS" => {
                let guid = data.read_slice_at(4, 16)?;
                let age = data.read_u32_le_at(20)?;
                let pdb_path = data.read_cstring_at(24, MAX_PDB_PATH)?.into_owned();
                Some(Self::Rsds {
                    guid: format_guid(guid),
                    age,
                    pdb_path,
                })
            }
            b"NB10" => {
                let timestamp = data.read_u32_le_at(8)?;
                let age = data.read_u32_le_at(12)?;
                let pdb_path = data.read_cstring_at(16, MAX_PDB_PATH)?.into_owned();
                Some(Self::Nb10 {
                    timestamp,
                    age,
                    pdb_path,
                })
            }
            _ => None,
        }
    }

    pub fn pdb_path(&self) -> &str {
        match self {
            Self::Rsds { pdb_path, .. } | Self::Nb10 { pdb_path, .. } => pdb_path,
        }
    }
}

impl fmt::Display for CodeViewInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsds {
                guid,
                age,
                pdb_path,
            } => write!(f, "RSDS {} age {} {}", guid, age, pdb_path),
            Self::Nb10 {
                timestamp,
                age,
                pdb_path,
            } => write!(f, "NB10 {:08x} age {} {}", timestamp, age, pdb_path),
        }
    }
}

/// Format a 16-byte little-endian GUID in registry form
fn format_guid(bytes: &[u8]) -> String {
    let mut d1 = [0u8; 4];
    d1.copy_from_slice(&bytes[0..4]);
    d1.reverse();
    let mut d2 = [bytes[4], bytes[5]];
    d2.reverse();
    let mut d3 = [bytes[6], bytes[7]];
    d3.reverse();

    format!(
        "{{{}-{}-{}-{}-{}}}",
        hex::encode_upper(d1),
        hex::encode_upper(d2),
        hex::encode_upper(d3),
        hex::encode_upper(&bytes[8..10]),
        hex::encode_upper(&bytes[10..16]),
    )
}
