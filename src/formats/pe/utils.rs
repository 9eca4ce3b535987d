//! Utility functions for PE parsing

use std::borrow::Cow;

use memchr::memmem;

use crate::formats::pe::types::{PeError, Result, PE_SIGNATURE};

/// Extension trait for reading primitive types from byte slices
pub trait ReadExt {
    fn read_u8_at(&self, offset: usize) -> Option<u8>;
    fn read_u16_le_at(&self, offset: usize) -> Option<u16>;
    fn read_u32_le_at(&self, offset: usize) -> Option<u32>;
    fn read_cstring_at(&self, offset: usize, max_len: usize) -> Option<Cow<'_, str>>;
    fn read_slice_at(&self, offset: usize, len: usize) -> Option<&[u8]>;
}

impl ReadExt for [u8] {
    #[inline(always)]
    fn read_u8_at(&self, offset: usize) -> Option<u8> {
        self.get(offset).copied()
    }

    #[inline(always)]
    fn read_u16_le_at(&self, offset: usize) -> Option<u16> {
        self.get(offset..offset.checked_add(2)?)
            .and_then(|b| b.try_into().ok())
            .map(u16::from_le_bytes)
    }

    #[inline(always)]
    fn read_u32_le_at(&self, offset: usize) -> Option<u32> {
        self.get(offset..offset.checked_add(4)?)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
    }

    fn read_cstring_at(&self, offset: usize, max_len: usize) -> Option<Cow<'_, str>> {
        let end = offset.saturating_add(max_len).min(self.len());
        let slice = self.get(offset..end)?;

        // Find null terminator
        let len = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
        Some(String::from_utf8_lossy(&slice[..len]))
    }

    #[inline(always)]
    fn read_slice_at(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.get(offset..offset.checked_add(len)?)
    }
}

/// Read a little-endian u16, reporting a truncated header on failure
pub fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    data.read_u16_le_at(offset).ok_or(PeError::TruncatedHeader {
        expected: offset.saturating_add(2),
        actual: data.len(),
    })
}

/// Read a little-endian u32, reporting a truncated header on failure
pub fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    data.read_u32_le_at(offset).ok_or(PeError::TruncatedHeader {
        expected: offset.saturating_add(4),
        actual: data.len(),
    })
}

/// Check if a range is within bounds
#[inline(always)]
pub fn check_bounds(offset: usize, size: usize, data_len: usize) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= data_len => Ok(()),
        _ => Err(PeError::InvalidOffset { offset }),
    }
}

/// Locate the first `PE\0\0` byte sequence in the buffer
pub fn find_pe_signature(data: &[u8]) -> Option<usize> {
    memmem::find(data, &PE_SIGNATURE)
}
