//! Cluster reading and blob segmentation
//!
//! A cluster's byte range runs from its resolved offset to the next
//! cluster's offset, or to end-of-file for the last cluster. The first byte
//! is the compression flag; the rest is the body. The decompressed body
//! starts with a run of little-endian u32 blob offsets, terminated by the
//! first value reaching the payload length, and blob `i` spans
//! `[offsets[i], offsets[i+1])` of the payload.

use crate::codec::CodecRegistry;
use crate::error::{Error, Result};
use crate::io::SourceRead;
use crate::pointer::PointerTable;
use tracing::debug;

/// A decompressed cluster, sliced into blobs.
///
/// Computed per request; repeated reads of the same index re-read and
/// re-decompress. Blob access borrows from the cluster's payload buffer and
/// lives only as long as the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    index: u32,
    offset: u64,
    compression: u8,
    payload: Vec<u8>,
    blob_offsets: Vec<u32>,
}

impl Cluster {
    pub(crate) fn from_payload(
        index: u32,
        offset: u64,
        compression: u8,
        payload: Vec<u8>,
    ) -> Result<Self> {
        let blob_offsets = parse_blob_index(index, &payload)?;
        Ok(Self {
            index,
            offset,
            compression,
            payload,
            blob_offsets,
        })
    }

    /// Cluster index within the archive
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Absolute byte offset of the cluster's flag byte
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Raw compression flag byte
    pub fn compression(&self) -> u8 {
        self.compression
    }

    /// Decompressed payload, blob-offset index included
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of blobs in the cluster
    pub fn blob_count(&self) -> u32 {
        (self.blob_offsets.len() - 1) as u32
    }

    /// Borrow blob `index` from the payload
    pub fn blob(&self, index: u32) -> Result<&[u8]> {
        if index >= self.blob_count() {
            return Err(Error::OutOfRange {
                index,
                count: self.blob_count(),
            });
        }
        let start = self.blob_offsets[index as usize] as usize;
        let end = self.blob_offsets[index as usize + 1] as usize;
        Ok(&self.payload[start..end])
    }

    /// Iterate over all blobs in order
    pub fn blobs(&self) -> impl Iterator<Item = &[u8]> {
        self.blob_offsets
            .windows(2)
            .map(|w| &self.payload[w[0] as usize..w[1] as usize])
    }
}

/// Parse the blob-offset run at the start of a decompressed payload.
///
/// The run must be non-decreasing and terminate with a value equal to the
/// payload length; anything else is [`Error::MalformedCluster`]. The
/// offsets are absolute within the payload, so the run's own bytes fall
/// inside blob 0's addressable region.
fn parse_blob_index(cluster: u32, payload: &[u8]) -> Result<Vec<u32>> {
    let total = payload.len() as u64;
    let mut offsets: Vec<u32> = Vec::new();

    loop {
        let pos = offsets.len() * 4;
        let Some(bytes) = payload.get(pos..pos + 4) else {
            // Ran off the payload without reaching a terminating value.
            return Err(Error::MalformedCluster { index: cluster });
        };
        let value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

        if offsets.last().is_some_and(|prev| value < *prev) {
            return Err(Error::MalformedCluster { index: cluster });
        }
        offsets.push(value);

        if u64::from(value) >= total {
            break;
        }
    }

    // The terminating value must land exactly on the payload end, or the
    // final blob range would point past it.
    if u64::from(*offsets.last().unwrap_or(&0)) != total {
        return Err(Error::MalformedCluster { index: cluster });
    }

    Ok(offsets)
}

/// Read, decompress, and slice cluster `index`.
///
/// Step order is fixed: resolve offsets, read the flag byte, read the body,
/// decompress, parse the blob index. Any failing step is terminal.
pub(crate) fn read_cluster<S: SourceRead + ?Sized>(
    source: &S,
    table: &PointerTable,
    codecs: &CodecRegistry,
    index: u32,
) -> Result<Cluster> {
    let offset = table.resolve(source, index)?;
    // The last cluster has no successor; it extends to end-of-file.
    let end = if index + 1 < table.count() {
        table.resolve(source, index + 1)?
    } else {
        source.len()
    };

    if end <= offset {
        return Err(Error::TruncatedRead {
            expected: 1,
            actual: 0,
        });
    }

    let mut flag = [0u8; 1];
    source.read_exact_at(offset, &mut flag)?;
    let compression = flag[0];
    debug!(
        "Cluster {index} at {offset:#x}..{end:#x}, compression flag {compression}",
    );

    let mut body = vec![0u8; (end - offset - 1) as usize];
    source.read_exact_at(offset + 1, &mut body)?;

    let payload = codecs.decode(compression, &body)?;
    Cluster::from_payload(index, offset, compression, payload)
}
