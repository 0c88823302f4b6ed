//! Error types for ZIM container parsing

use thiserror::Error;

/// Result type for ZIM operations
pub type Result<T> = std::result::Result<T, Error>;

/// ZIM error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes available than the structure requires
    #[error("truncated read: expected {expected} bytes, got {actual}")]
    TruncatedRead { expected: u64, actual: u64 },

    /// Directory entry exhausted its source without both string terminators
    #[error("malformed directory entry at offset {offset:#x}")]
    MalformedEntry { offset: u64 },

    /// Blob-offset index of a decompressed cluster is non-monotonic or
    /// never terminates
    #[error("malformed blob index in cluster {index}")]
    MalformedCluster { index: u32 },

    /// Requested index is past the end of a table
    #[error("index {index} is out of range, must be less than {count}")]
    OutOfRange { index: u32, count: u32 },

    /// Decompression failed or the compression flag has no codec
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Cluster decompression error types
#[derive(Error, Debug)]
pub enum CodecError {
    /// No codec is registered for this compression flag
    #[error("unsupported compression flag: {0:#04x}")]
    UnsupportedFlag(u8),

    /// The registered codec rejected the cluster body
    #[error("decompression failed: {0}")]
    Decompress(String),
}
