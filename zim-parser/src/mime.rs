//! MIME type list decoding
//!
//! The header's `mime_list_pos` names a run of NUL-terminated UTF-8
//! strings, closed by an empty string. Directory entries reference the run
//! by position through their `mime_type` code.

use crate::error::{Error, Result};
use crate::header::Header;
use crate::io::SourceRead;
use tracing::trace;

const READ_CHUNK: usize = 1024;

/// Read the archive's MIME type list.
pub fn read_mime_table<S: SourceRead + ?Sized>(source: &S, header: &Header) -> Result<Vec<String>> {
    let mut types = Vec::new();
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];
    let mut pos = 0;

    loop {
        if let Some(rel) = buf[pos..].iter().position(|b| *b == 0) {
            if rel == 0 {
                // Empty string closes the list.
                trace!("Read {} MIME types", types.len());
                return Ok(types);
            }
            types.push(String::from_utf8_lossy(&buf[pos..pos + rel]).into_owned());
            pos += rel + 1;
            continue;
        }

        let got = source.read_at(header.mime_list_pos + buf.len() as u64, &mut chunk)?;
        if got == 0 {
            return Err(Error::TruncatedRead {
                expected: buf.len() as u64 + 1,
                actual: buf.len() as u64,
            });
        }
        buf.extend_from_slice(&chunk[..got]);
    }
}
