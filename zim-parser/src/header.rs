//! Fixed-layout container header parsing

use crate::error::Result;
use crate::io::SourceRead;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::trace;

/// Size of the fixed container header in bytes
pub const HEADER_LEN: usize = 80;

/// Page index sentinel meaning "no such page"
const PAGE_NONE: u32 = 0xFFFF_FFFF;

/// Parsed container header.
///
/// Read once per open container and owned by the caller for the lifetime of
/// all subsequent reads against that file. All pointer positions are
/// absolute byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Container format version
    pub version: u32,
    /// Archive UUID
    pub uuid: [u8; 16],
    /// Number of directory entries (and of URL/title pointer-table slots)
    pub entry_count: u32,
    /// Number of clusters (and of cluster pointer-table slots)
    pub cluster_count: u32,
    /// Offset of the URL pointer table
    pub url_ptr_pos: u64,
    /// Offset of the title pointer table
    pub title_ptr_pos: u64,
    /// Offset of the cluster pointer table
    pub cluster_ptr_pos: u64,
    /// Offset of the MIME type list
    pub mime_list_pos: u64,
    /// Index of the main page entry, if any
    pub main_page: Option<u32>,
    /// Index of the layout page entry, if any
    pub layout_page: Option<u32>,
    /// Offset of the archive checksum
    pub checksum_pos: u64,
}

impl Header {
    /// Read and parse the header from the first [`HEADER_LEN`] bytes of the
    /// container.
    ///
    /// Fails with [`Error::TruncatedRead`](crate::Error::TruncatedRead) when
    /// fewer bytes are available.
    pub fn read<S: SourceRead + ?Sized>(source: &S) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN];
        source.read_exact_at(0, &mut buf)?;
        Self::parse(&buf)
    }

    /// Parse the header from an exactly [`HEADER_LEN`]-byte buffer.
    pub fn parse(buf: &[u8; HEADER_LEN]) -> Result<Self> {
        let mut c = Cursor::new(&buf[..]);
        c.seek(SeekFrom::Start(4))?;

        let version = c.read_u32::<LittleEndian>()?;
        let mut uuid = [0u8; 16];
        c.read_exact(&mut uuid)?;

        let header = Self {
            version,
            uuid,
            entry_count: c.read_u32::<LittleEndian>()?,
            cluster_count: c.read_u32::<LittleEndian>()?,
            url_ptr_pos: c.read_u64::<LittleEndian>()?,
            title_ptr_pos: c.read_u64::<LittleEndian>()?,
            cluster_ptr_pos: c.read_u64::<LittleEndian>()?,
            mime_list_pos: c.read_u64::<LittleEndian>()?,
            main_page: page_index(c.read_u32::<LittleEndian>()?),
            layout_page: page_index(c.read_u32::<LittleEndian>()?),
            checksum_pos: c.read_u64::<LittleEndian>()?,
        };

        trace!(
            "Parsed header: version={}, {} entries, {} clusters",
            header.version, header.entry_count, header.cluster_count
        );

        Ok(header)
    }

    /// Archive UUID as a lowercase hex string
    pub fn uuid_hex(&self) -> String {
        hex::encode(self.uuid)
    }
}

fn page_index(raw: u32) -> Option<u32> {
    if raw == PAGE_NONE { None } else { Some(raw) }
}
