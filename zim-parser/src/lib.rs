//! Random-access reader for ZIM archive containers
//!
//! A container holds a fixed 80-byte header, pointer tables of absolute
//! byte offsets, variable-length directory entries, and compressed clusters
//! of content blobs. This crate decodes all of it through positioned reads
//! against one open handle, without ever loading the whole file: headers and
//! pointers are resolved on demand, directory entries are decoded
//! incrementally, and clusters are decompressed and sliced per request.
//!
//! [`Archive`] is the entry point; the per-structure modules are public for
//! callers that want to drive the decoding pipeline directly.

pub mod archive;
pub mod cluster;
pub mod codec;
pub mod entry;
pub mod error;
pub mod header;
pub mod io;
pub mod mime;
pub mod pointer;

pub use archive::{Archive, ResolvedEntry};
pub use cluster::Cluster;
pub use codec::{Codec, CodecRegistry, FLAG_XZ, StoredCodec, XzCodec};
pub use entry::{DirectoryEntry, EntryLocator, EntryTarget, ParseStatus, REDIRECT_MIME};
pub use error::{CodecError, Error, Result};
pub use header::{HEADER_LEN, Header};
pub use io::{FileSource, SourceRead};
pub use pointer::{IndexWindow, OffsetStream, PointerEntry, PointerTable};
