//! PE header parsing

use crate::formats::pe::types::*;
use crate::formats::pe::utils::{read_u16, read_u32};

/// Parse DOS header from data
pub fn parse_dos_header(data: &[u8]) -> Result<DosHeader> {
    if data.len() < DOS_HEADER_SIZE {
        return Err(PeError::TruncatedHeader {
            expected: DOS_HEADER_SIZE,
            actual: data.len(),
        });
    }

    let e_magic = read_u16(data, 0)?;
    if e_magic != DOS_SIGNATURE {
        return Err(PeError::InvalidDosSignature);
    }

    Ok(DosHeader {
        e_magic,
        e_lfanew: read_u32(data, 60)?,
    })
}

/// Parse COFF header from data at offset
pub fn parse_coff_header(data: &[u8], offset: usize) -> Result<CoffHeader> {
    let end = offset.saturating_add(COFF_HEADER_SIZE);
    if end > data.len() {
        return Err(PeError::TruncatedHeader {
            expected: end,
            actual: data.len(),
        });
    }

    Ok(CoffHeader {
        machine: read_u16(data, offset)?,
        number_of_sections: read_u16(data, offset + 2)?,
        time_date_stamp: read_u32(data, offset + 4)?,
        pointer_to_symbol_table: read_u32(data, offset + 8)?,
        number_of_symbols: read_u32(data, offset + 12)?,
        size_of_optional_header: read_u16(data, offset + 16)?,
        characteristics: read_u16(data, offset + 18)?,
    })
}

/// Parse optional header from data at offset
pub fn parse_optional_header(data: &[u8], offset: usize, size: u16) -> Result<OptionalHeader> {
    if size < 2 {
        return Err(PeError::TruncatedHeader {
            expected: offset + 2,
            actual: offset + size as usize,
        });
    }

    let end = offset.saturating_add(size as usize);
    if end > data.len() {
        return Err(PeError::TruncatedHeader {
            expected: end,
            actual: data.len(),
        });
    }

    let magic = read_u16(data, offset)?;
    let kind = match magic {
        PE32_MAGIC => OptionalHeaderKind::Pe32,
        PE32PLUS_MAGIC => OptionalHeaderKind::Pe32Plus,
        _ => return Err(PeError::InvalidMagic(magic)),
    };

    // Everything up to and including NumberOfRvaAndSizes must be present
    let fixed = kind.data_directory_offset();
    if (size as usize) < fixed {
        return Err(PeError::TruncatedHeader {
            expected: offset + fixed,
            actual: offset + size as usize,
        });
    }

    // The fields below sit at the same offsets in PE32 and PE32+
    Ok(OptionalHeader {
        kind,
        magic,
        section_alignment: read_u32(data, offset + 32)?,
        file_alignment: read_u32(data, offset + 36)?,
        size_of_image: read_u32(data, offset + 56)?,
        size_of_headers: read_u32(data, offset + 60)?,
        number_of_rva_and_sizes: read_u32(data, offset + fixed - 4)?,
    })
}

/// Parse data directories from data at offset.
///
/// Only slots that are both announced by `NumberOfRvaAndSizes` and fully
/// contained in the optional header are returned.
pub fn parse_data_directories(
    data: &[u8],
    offset: usize,
    count: u32,
    available: usize,
) -> Result<Vec<DataDirectory>> {
    let count = count.min(MAX_DATA_DIRECTORIES) as usize;
    let count = count.min(available / DATA_DIRECTORY_SIZE);
    let mut directories = Vec::with_capacity(count);

    for i in 0..count {
        let dir_offset = offset + i * DATA_DIRECTORY_SIZE;
        directories.push(DataDirectory {
            virtual_address: read_u32(data, dir_offset)?,
            size: read_u32(data, dir_offset + 4)?,
        });
    }

    Ok(directories)
}

/// Parse NT headers (PE signature + COFF + Optional)
pub fn parse_nt_headers(data: &[u8], offset: usize) -> Result<(NtHeaders, Vec<DataDirectory>)> {
    // Check PE signature
    let signature: [u8; 4] = data
        .get(offset..offset.saturating_add(4))
        .and_then(|b| b.try_into().ok())
        .ok_or(PeError::TruncatedHeader {
            expected: offset.saturating_add(4),
            actual: data.len(),
        })?;

    if signature != PE_SIGNATURE {
        return Err(PeError::InvalidPeSignature);
    }

    // Parse COFF header
    let coff_header = parse_coff_header(data, offset + 4)?;

    // Parse optional header
    let opt_offset = offset + 4 + COFF_HEADER_SIZE;
    let optional_header =
        parse_optional_header(data, opt_offset, coff_header.size_of_optional_header)?;

    // Parse data directories
    let fixed = optional_header.kind.data_directory_offset();
    let directories = parse_data_directories(
        data,
        opt_offset + fixed,
        optional_header.number_of_rva_and_sizes,
        coff_header.size_of_optional_header as usize - fixed,
    )?;

    let nt_headers = NtHeaders {
        signature,
        file_header: coff_header,
        optional_header,
    };

    Ok((nt_headers, directories))
}
