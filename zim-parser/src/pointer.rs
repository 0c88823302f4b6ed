//! Pointer-table resolution and lazy offset streaming
//!
//! Each pointer table is an array of 8-byte little-endian absolute offsets,
//! one per directory entry (URL and title tables) or per cluster. Tables are
//! never loaded whole; offsets are resolved one positioned read at a time.

use crate::error::{Error, Result};
use crate::io::SourceRead;
use tracing::trace;

/// A resolved absolute byte offset for the Nth record of a table.
///
/// Produced on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEntry {
    pub index: u32,
    pub offset: u64,
}

/// An inclusive index range limiting an offset stream
#[derive(Debug, Clone, Copy)]
pub struct IndexWindow {
    pub start: u32,
    pub end: u32,
}

/// A pointer table located at a fixed base offset
#[derive(Debug, Clone, Copy)]
pub struct PointerTable {
    base: u64,
    count: u32,
}

impl PointerTable {
    pub fn new(base: u64, count: u32) -> Self {
        Self { base, count }
    }

    /// Number of slots in the table
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Resolve the absolute byte offset stored in slot `index`.
    ///
    /// Fails with [`Error::OutOfRange`] past the table and
    /// [`Error::TruncatedRead`] when the slot's 8 bytes cannot be read.
    pub fn resolve<S: SourceRead + ?Sized>(&self, source: &S, index: u32) -> Result<u64> {
        if index >= self.count {
            return Err(Error::OutOfRange {
                index,
                count: self.count,
            });
        }

        let mut buf = [0u8; 8];
        source.read_exact_at(self.base + u64::from(index) * 8, &mut buf)?;
        let offset = u64::from_le_bytes(buf);
        trace!("Resolved pointer {index} -> {offset:#x}");
        Ok(offset)
    }

    /// Stream `(index, offset)` pairs in ascending index order.
    ///
    /// The stream is finite and forward-only; an optional window narrows it
    /// to `start..=end` by adjusting the first read offset, so skipped slots
    /// are never read. Emitted indices are absolute table indices. Dropping
    /// the stream releases its borrow of the source immediately.
    pub fn stream<'s, S: SourceRead + ?Sized>(
        &self,
        source: &'s S,
        window: Option<IndexWindow>,
    ) -> OffsetStream<'s, S> {
        let (next, end) = match window {
            Some(w) => (
                w.start.min(self.count),
                w.end.saturating_add(1).min(self.count),
            ),
            None => (0, self.count),
        };

        OffsetStream {
            source,
            base: self.base,
            next,
            end,
        }
    }
}

/// Lazy iterator over a pointer table's `(index, offset)` pairs.
///
/// One 8-byte positioned read per item. The first read failure ends the
/// stream after yielding the error.
pub struct OffsetStream<'s, S: ?Sized> {
    source: &'s S,
    base: u64,
    next: u32,
    end: u32,
}

impl<S: SourceRead + ?Sized> Iterator for OffsetStream<'_, S> {
    type Item = Result<PointerEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let mut buf = [0u8; 8];
        match self.source.read_exact_at(self.base + u64::from(index) * 8, &mut buf) {
            Ok(()) => Some(Ok(PointerEntry {
                index,
                offset: u64::from_le_bytes(buf),
            })),
            Err(e) => {
                self.next = self.end;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}
