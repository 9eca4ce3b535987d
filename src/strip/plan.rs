//! Redaction plans: the byte ranges to zero, computed before any mutation.

use serde::Serialize;
use tracing::trace;

use crate::error::{Result, StripError};
use crate::formats::pe::directories::{CodeViewInfo, DebugEntry, DebugType};

/// What a range of zeroed bytes used to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeKind {
    /// The (VirtualAddress, Size) debug slot in the optional header
    DirectoryDescriptor,
    /// The array of debug directory records
    DirectoryEntries,
    /// The raw-data payload of one record
    EntryRawData { index: u32, debug_type: DebugType },
}

/// A half-open range `[offset, offset + len)` of file bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub offset: usize,
    pub len: usize,
    pub kind: RangeKind,
}

impl ByteRange {
    pub fn new(offset: usize, len: usize, kind: RangeKind) -> Self {
        Self { offset, len, kind }
    }

    /// Exclusive end, `None` on overflow
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && self.end().map_or(true, |end| offset < end)
    }

    /// Ensure the range fits inside a buffer of `buffer_len` bytes.
    ///
    /// Empty ranges always fit: zeroing nothing never touches memory.
    pub fn check(&self, buffer_len: usize) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        match self.end() {
            Some(end) if end <= buffer_len => Ok(()),
            _ => Err(StripError::OutOfBounds {
                offset: self.offset,
                len: self.len,
                buffer_len,
            }),
        }
    }
}

/// One debug directory record as found before redaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub index: u32,
    pub entry: DebugEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codeview: Option<CodeViewInfo>,
}

/// Every range to zero plus what was found along the way
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactionPlan {
    /// Where the `PE\0\0` scan matched, if it did
    pub signature_offset: Option<usize>,
    /// File offset of the debug directory records
    pub directory_offset: usize,
    pub entries: Vec<EntryReport>,
    ranges: Vec<ByteRange>,
}

impl RedactionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, range: ByteRange) {
        self.ranges.push(range);
    }

    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    /// Whether `offset` falls inside any planned range
    pub fn covers(&self, offset: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(offset))
    }

    /// Sum of range lengths; overlapping bytes are counted once per range
    pub fn total_len(&self) -> usize {
        self.ranges.iter().map(|r| r.len).sum()
    }

    /// PDB paths referenced by CodeView records
    pub fn pdb_paths(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter_map(|e| e.codeview.as_ref())
            .map(CodeViewInfo::pdb_path)
    }

    /// Zero every planned range in `data`.
    ///
    /// All ranges are checked before the first byte is written, so a plan
    /// that does not fit leaves `data` untouched.
    pub fn apply(&self, data: &mut [u8]) -> Result<()> {
        for range in &self.ranges {
            range.check(data.len())?;
        }
        for range in &self.ranges {
            zero_fill(data, range.offset, range.len)?;
        }
        Ok(())
    }
}

/// Overwrite `[offset, offset + len)` with zeroes
pub fn zero_fill(data: &mut [u8], offset: usize, len: usize) -> Result<()> {
    if len == 0 {
        return Ok(());
    }
    let buffer_len = data.len();
    let target = offset
        .checked_add(len)
        .and_then(|end| data.get_mut(offset..end))
        .ok_or(StripError::OutOfBounds {
            offset,
            len,
            buffer_len,
        })?;
    target.fill(0);
    trace!(offset, len, "Zeroed range");
    Ok(())
}
