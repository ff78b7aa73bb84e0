//! Low-level zip structures.
//!
//! Zip archives are read from the end: the End of Central Directory (EOCD)
//! record locates the Central Directory, whose file headers carry every
//! entry's sizes and flags. Validation only needs those headers; entry data
//! is touched solely when a caller materializes an entry.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{RelayError, Result};

/// Maximum zip comment size allowed by the format; bounds the backwards
/// EOCD search.
const MAX_COMMENT_SIZE: usize = 65535;

fn malformed() -> RelayError {
    RelayError::uploaded_file("not a zip file")
}

/// Zip compression methods this service understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// End of Central Directory record - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(malformed());
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_number = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
        let _disk_with_cd = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
        let _disk_entries = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
        let total_entries = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
        let cd_size = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())?;
        let cd_offset = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())?;

        Ok(Self {
            total_entries: total_entries as u64,
            cd_size: cd_size as u64,
            cd_offset: cd_offset as u64,
        })
    }

    fn is_zip64(&self) -> bool {
        self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// Zip64 End of Central Directory Locator - 20 bytes
struct Zip64Locator {
    eocd64_offset: u64,
}

impl Zip64Locator {
    const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    const SIZE: usize = 20;

    fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(malformed());
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_with_eocd64 = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())?;
        let eocd64_offset = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;

        Ok(Self { eocd64_offset })
    }
}

const ZIP64_EOCD_SIGNATURE: &[u8] = b"PK\x06\x06";
const ZIP64_EOCD_MIN_SIZE: usize = 56;

/// Central Directory File Header signature and minimum size
const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";

/// Local File Header signature and fixed size
const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
const LFH_SIZE: usize = 30;

/// General-purpose bit 0 marks an encrypted entry
const FLAG_ENCRYPTED: u16 = 0x0001;

/// One entry of a zip archive, as described by its Central Directory header
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub compression: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub encrypted: bool,
    pub is_directory: bool,
    lfh_offset: u64,
}

/// Locate and parse the EOCD record at the tail of `data`.
///
/// Tries the no-comment position first, then scans backwards through the
/// comment search window. Resolves the Zip64 EOCD when the 32-bit record
/// carries overflow markers.
pub fn find_eocd(data: &[u8]) -> Result<EndOfCentralDirectory> {
    if data.len() < EndOfCentralDirectory::SIZE {
        return Err(malformed());
    }

    // Common case: no archive comment, EOCD sits exactly at the end.
    let tail = data.len() - EndOfCentralDirectory::SIZE;
    if &data[tail..tail + 4] == EndOfCentralDirectory::SIGNATURE
        && &data[tail + 20..tail + 22] == b"\x00\x00"
    {
        return resolve_zip64(data, EndOfCentralDirectory::from_bytes(&data[tail..])?, tail);
    }

    let window_start = data
        .len()
        .saturating_sub(MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE);

    for i in (window_start..=tail).rev() {
        if &data[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
            let comment_len = u16::from_le_bytes([data[i + 20], data[i + 21]]) as usize;
            if comment_len == data.len() - i - EndOfCentralDirectory::SIZE {
                return resolve_zip64(data, EndOfCentralDirectory::from_bytes(&data[i..])?, i);
            }
        }
    }

    Err(malformed())
}

fn resolve_zip64(
    data: &[u8],
    eocd: EndOfCentralDirectory,
    eocd_offset: usize,
) -> Result<EndOfCentralDirectory> {
    if !eocd.is_zip64() {
        return Ok(eocd);
    }

    // The Zip64 locator sits immediately before the 32-bit EOCD.
    let locator_offset = eocd_offset
        .checked_sub(Zip64Locator::SIZE)
        .ok_or_else(malformed)?;
    let locator = Zip64Locator::from_bytes(&data[locator_offset..eocd_offset])?;

    let start = usize::try_from(locator.eocd64_offset).map_err(|_| malformed())?;
    if start + ZIP64_EOCD_MIN_SIZE > data.len() || &data[start..start + 4] != ZIP64_EOCD_SIGNATURE
    {
        return Err(malformed());
    }

    let mut cursor = Cursor::new(&data[start + 4..]);
    let _eocd64_size = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;
    let _version_made_by = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _version_needed = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _disk_number = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())?;
    let _disk_with_cd = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())?;
    let _disk_entries = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;
    let total_entries = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;
    let cd_size = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;
    let cd_offset = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;

    Ok(EndOfCentralDirectory {
        total_entries,
        cd_size,
        cd_offset,
    })
}

/// Walk the Central Directory and return every entry header.
pub fn list_entries(data: &[u8]) -> Result<Vec<ZipEntry>> {
    let eocd = find_eocd(data)?;

    let cd_start = usize::try_from(eocd.cd_offset).map_err(|_| malformed())?;
    let cd_end = cd_start
        .checked_add(usize::try_from(eocd.cd_size).map_err(|_| malformed())?)
        .ok_or_else(malformed)?;
    if cd_end > data.len() {
        return Err(malformed());
    }

    let cd_data = &data[cd_start..cd_end];
    let mut cursor = Cursor::new(cd_data);
    let mut entries = Vec::with_capacity(eocd.total_entries as usize);

    for _ in 0..eocd.total_entries {
        entries.push(parse_cdfh(&mut cursor)?);
    }

    Ok(entries)
}

fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig).map_err(|_| malformed())?;
    if sig != CDFH_SIGNATURE {
        return Err(malformed());
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _version_needed = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let flags = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let compression = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _crc32 = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())? as u64;
    let mut uncompressed_size =
        cursor.read_u32::<LittleEndian>().map_err(|_| malformed())? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let file_comment_length = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
    let _external_attrs = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>().map_err(|_| malformed())? as u64;

    let mut name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut name_bytes).map_err(|_| malformed())?;
    let name = String::from_utf8_lossy(&name_bytes).to_string();
    let is_directory = name.ends_with('/');

    // Zip64 extended information (extra field id 0x0001) replaces any
    // header field that overflowed its 32-bit slot.
    let extra_field_end = cursor.position() + extra_field_length as u64;
    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;
        let field_size = cursor.read_u16::<LittleEndian>().map_err(|_| malformed())?;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                compressed_size = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>().map_err(|_| malformed())?;
            }
            break;
        }
        cursor.set_position(cursor.position() + field_size as u64);
    }
    cursor.set_position(extra_field_end);
    cursor.set_position(cursor.position() + file_comment_length as u64);

    Ok(ZipEntry {
        name,
        compression: CompressionMethod::from_u16(compression),
        compressed_size,
        uncompressed_size,
        encrypted: flags & FLAG_ENCRYPTED != 0,
        is_directory,
        lfh_offset,
    })
}

/// Compressed data bytes of an entry.
///
/// The Local File Header repeats the variable-length name/extra fields, so
/// the data offset must be computed from the header actually present at
/// `lfh_offset`.
pub fn entry_data<'a>(data: &'a [u8], entry: &ZipEntry) -> Result<&'a [u8]> {
    let lfh_start = usize::try_from(entry.lfh_offset).map_err(|_| malformed())?;
    if lfh_start + LFH_SIZE > data.len() || &data[lfh_start..lfh_start + 4] != LFH_SIGNATURE {
        return Err(malformed());
    }

    let name_len =
        u16::from_le_bytes([data[lfh_start + 26], data[lfh_start + 27]]) as usize;
    let extra_len =
        u16::from_le_bytes([data[lfh_start + 28], data[lfh_start + 29]]) as usize;

    let data_start = lfh_start + LFH_SIZE + name_len + extra_len;
    let data_end = data_start
        .checked_add(usize::try_from(entry.compressed_size).map_err(|_| malformed())?)
        .ok_or_else(malformed)?;
    if data_end > data.len() {
        return Err(malformed());
    }

    Ok(&data[data_start..data_end])
}
