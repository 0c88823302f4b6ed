//! Cluster body decompression
//!
//! A cluster's first byte selects how its body is decoded. Flags 0 and 1
//! mean the body is stored as-is; flag 4 selects the xz/LZMA codec. Every
//! other flag fails with [`CodecError::UnsupportedFlag`] unless a codec has
//! been registered for it.

use crate::error::{CodecError, Result};
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, trace};
use xz2::read::XzDecoder;

/// Compression flag selecting the xz/LZMA codec
pub const FLAG_XZ: u8 = 4;

/// Decodes a raw cluster body into its decompressed payload
pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;

    fn decode(&self, body: &[u8]) -> std::result::Result<Vec<u8>, CodecError>;
}

/// Flags 0 and 1 - body is stored uncompressed
pub struct StoredCodec;

impl Codec for StoredCodec {
    fn name(&self) -> &'static str {
        "stored"
    }

    fn decode(&self, body: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
        trace!("No compression - returning {} bytes as-is", body.len());
        Ok(body.to_vec())
    }
}

/// Flag 4 - xz/LZMA compression
pub struct XzCodec;

impl Codec for XzCodec {
    fn name(&self) -> &'static str {
        "xz"
    }

    fn decode(&self, body: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
        let mut decoder = XzDecoder::new(body);
        let mut result = Vec::new();

        decoder
            .read_to_end(&mut result)
            .map_err(|e| CodecError::Decompress(format!("xz decompression failed: {e}")))?;

        debug!("xz: {} bytes -> {} bytes", body.len(), result.len());
        Ok(result)
    }
}

/// Codecs keyed by compression-flag byte.
///
/// Swappable: callers can register additional codecs without touching the
/// cluster-reading logic. Decoding an unregistered flag is a named error,
/// never a silent fallback to either built-in branch.
pub struct CodecRegistry {
    codecs: HashMap<u8, Box<dyn Codec>>,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut flags: Vec<&u8> = self.codecs.keys().collect();
        flags.sort_unstable();
        f.debug_struct("CodecRegistry")
            .field("flags", &flags)
            .finish()
    }
}

impl CodecRegistry {
    /// Registry with the two standard codecs: stored (flags 0 and 1) and
    /// xz (flag 4)
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(0, Box::new(StoredCodec));
        registry.register(1, Box::new(StoredCodec));
        registry.register(FLAG_XZ, Box::new(XzCodec));
        registry
    }

    /// Registry with no codecs at all
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register `codec` for `flag`, replacing any previous codec
    pub fn register(&mut self, flag: u8, codec: Box<dyn Codec>) {
        self.codecs.insert(flag, codec);
    }

    /// Decode `body` with the codec registered for `flag`
    pub fn decode(&self, flag: u8, body: &[u8]) -> Result<Vec<u8>> {
        let codec = self
            .codecs
            .get(&flag)
            .ok_or(CodecError::UnsupportedFlag(flag))?;
        trace!("Decoding cluster body with {} codec (flag {flag:#04x})", codec.name());
        Ok(codec.decode(body)?)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    fn xz_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_stored_flags() {
        let registry = CodecRegistry::standard();
        let body = b"uncompressed cluster body";
        assert_eq!(registry.decode(0, body).unwrap(), body);
        assert_eq!(registry.decode(1, body).unwrap(), body);
    }

    #[test]
    fn test_xz_roundtrip() {
        let registry = CodecRegistry::standard();
        let original = b"some article text that compresses reasonably well well well";
        let compressed = xz_compress(original);

        let decoded = registry.decode(FLAG_XZ, &compressed).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_xz_rejects_garbage() {
        let registry = CodecRegistry::standard();
        let err = registry.decode(FLAG_XZ, b"not an xz stream").unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::Decompress(_))));
    }

    #[test]
    fn test_unsupported_flag() {
        let registry = CodecRegistry::standard();
        let err = registry.decode(2, b"zlib is not wired").unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::UnsupportedFlag(2))));
    }

    #[test]
    fn test_register_custom_codec() {
        struct Reversing;
        impl Codec for Reversing {
            fn name(&self) -> &'static str {
                "reversing"
            }
            fn decode(&self, body: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
                Ok(body.iter().rev().copied().collect())
            }
        }

        let mut registry = CodecRegistry::standard();
        registry.register(7, Box::new(Reversing));
        assert_eq!(registry.decode(7, b"abc").unwrap(), b"cba");
    }
}
