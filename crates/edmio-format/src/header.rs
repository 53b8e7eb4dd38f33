use edmio_types::SchemaVersion;

use crate::error::{FormatError, FormatResult};

/// File magic.
pub const MAGIC: [u8; 4] = *b"EDMF";

/// Fixed size of the file header.
pub const HEADER_LEN: usize = 48;

/// Size of the BLAKE3 trailer after the table of contents.
pub const TRAILER_LEN: usize = 32;

/// The fixed-size header at the start of every `.edm` file.
///
/// ```text
/// 0   magic "EDMF"
/// 4   major u16 | minor u16 | patch u16 | reserved u16
/// 12  flags u32
/// 16  event_count u64
/// 24  toc_offset u64
/// 32  toc_len u64
/// 40  toc_crc32 u32 | reserved u32
/// ```
///
/// All integers are little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileHeader {
    pub version: SchemaVersion,
    pub flags: u32,
    pub event_count: u64,
    pub toc_offset: u64,
    pub toc_len: u64,
    pub toc_crc32: u32,
}

impl FileHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..6].copy_from_slice(&self.version.major.to_le_bytes());
        buf[6..8].copy_from_slice(&self.version.minor.to_le_bytes());
        buf[8..10].copy_from_slice(&self.version.patch.to_le_bytes());
        buf[12..16].copy_from_slice(&self.flags.to_le_bytes());
        buf[16..24].copy_from_slice(&self.event_count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.toc_offset.to_le_bytes());
        buf[32..40].copy_from_slice(&self.toc_len.to_le_bytes());
        buf[40..44].copy_from_slice(&self.toc_crc32.to_le_bytes());
        buf
    }

    /// Parse the magic and the schema version only.
    ///
    /// Readers call this first so a too-new file is rejected before any other
    /// field is trusted.
    pub fn peek_version(data: &[u8]) -> FormatResult<SchemaVersion> {
        if data.len() < HEADER_LEN {
            return Err(FormatError::Corrupt {
                offset: 0,
                reason: format!("file too short for header: {} bytes", data.len()),
            });
        }
        if data[0..4] != MAGIC {
            return Err(FormatError::InvalidMagic {
                expected: String::from_utf8_lossy(&MAGIC).into(),
                actual: String::from_utf8_lossy(&data[0..4]).into(),
            });
        }
        Ok(SchemaVersion::new(
            u16_at(data, 4),
            u16_at(data, 6),
            u16_at(data, 8),
        ))
    }

    /// Parse a complete header.
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        let version = Self::peek_version(data)?;
        Ok(Self {
            version,
            flags: u32_at(data, 12),
            event_count: u64_at(data, 16),
            toc_offset: u64_at(data, 24),
            toc_len: u64_at(data, 32),
            toc_crc32: u32_at(data, 40),
        })
    }
}

fn u16_at(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn u32_at(data: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&data[at..at + 4]);
    u32::from_le_bytes(b)
}

fn u64_at(data: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&data[at..at + 8]);
    u64::from_le_bytes(b)
}
