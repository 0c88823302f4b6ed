//! Archive facade over one open container
//!
//! Owns the source, the header (read once at open), the three pointer
//! tables, and the codec registry. All operations take `&self` and use
//! positioned reads only, so logically independent reads can run
//! concurrently against the same handle. The facade performs no caching and
//! no locking; both are caller concerns.

use crate::cluster::{Cluster, read_cluster};
use crate::codec::CodecRegistry;
use crate::entry::{DirectoryEntry, EntryLocator, read_entry_at};
use crate::error::Result;
use crate::header::Header;
use crate::io::{FileSource, SourceRead};
use crate::mime::read_mime_table;
use crate::pointer::{IndexWindow, OffsetStream, PointerTable};
use std::path::Path;
use tracing::debug;

/// A directory entry together with where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// Slot in the URL pointer table, when located by index
    pub index: Option<u32>,
    /// Absolute byte offset of the record
    pub offset: u64,
    pub entry: DirectoryEntry,
}

/// An open container
#[derive(Debug)]
pub struct Archive<S = FileSource> {
    source: S,
    header: Header,
    url_table: PointerTable,
    title_table: PointerTable,
    cluster_table: PointerTable,
    codecs: CodecRegistry,
}

impl Archive<FileSource> {
    /// Open a container file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_source(FileSource::open(path)?)
    }
}

impl<S: SourceRead> Archive<S> {
    /// Open a container over any positioned byte source
    pub fn from_source(source: S) -> Result<Self> {
        let header = Header::read(&source)?;
        debug!(
            "Opened archive {} with {} entries in {} clusters",
            header.uuid_hex(),
            header.entry_count,
            header.cluster_count
        );

        let url_table = PointerTable::new(header.url_ptr_pos, header.entry_count);
        let title_table = PointerTable::new(header.title_ptr_pos, header.entry_count);
        let cluster_table = PointerTable::new(header.cluster_ptr_pos, header.cluster_count);

        Ok(Self {
            source,
            header,
            url_table,
            title_table,
            cluster_table,
            codecs: CodecRegistry::standard(),
        })
    }

    /// Replace the codec registry
    pub fn with_codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Resolve and decode a directory entry.
    ///
    /// An index locator goes through the URL pointer table first; an offset
    /// locator reads the record directly.
    pub fn entry(&self, locator: EntryLocator) -> Result<ResolvedEntry> {
        let (index, offset) = match locator {
            EntryLocator::Index(index) => {
                (Some(index), self.url_table.resolve(&self.source, index)?)
            }
            EntryLocator::Offset(offset) => (None, offset),
        };
        let entry = read_entry_at(&self.source, offset)?;
        Ok(ResolvedEntry {
            index,
            offset,
            entry,
        })
    }

    /// Stream the URL pointer table
    pub fn entry_offsets(&self, window: Option<IndexWindow>) -> OffsetStream<'_, S> {
        self.url_table.stream(&self.source, window)
    }

    /// Stream the title pointer table
    pub fn title_offsets(&self, window: Option<IndexWindow>) -> OffsetStream<'_, S> {
        self.title_table.stream(&self.source, window)
    }

    /// Stream the cluster pointer table
    pub fn cluster_offsets(&self, window: Option<IndexWindow>) -> OffsetStream<'_, S> {
        self.cluster_table.stream(&self.source, window)
    }

    /// Read, decompress, and slice one cluster
    pub fn cluster(&self, index: u32) -> Result<Cluster> {
        read_cluster(&self.source, &self.cluster_table, &self.codecs, index)
    }

    /// Fetch a content entry's blob bytes; `None` for redirects
    pub fn content(&self, entry: &DirectoryEntry) -> Result<Option<Vec<u8>>> {
        let Some((cluster_index, blob_index)) = entry.location() else {
            return Ok(None);
        };
        let cluster = self.cluster(cluster_index)?;
        Ok(Some(cluster.blob(blob_index)?.to_vec()))
    }

    /// Read the archive's MIME type list
    pub fn mime_table(&self) -> Result<Vec<String>> {
        read_mime_table(&self.source, &self.header)
    }

    /// Release the underlying source
    pub fn into_source(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_open_truncated_container() {
        let data = vec![0u8; 40];
        let err = Archive::from_source(data).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedRead {
                expected: 80,
                actual: 40
            }
        ));
    }
}
