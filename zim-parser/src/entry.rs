//! Variable-length directory entry decoding
//!
//! Entry records have no length field, so decoding is incremental: chunks
//! are read at growing offsets and a pure parse attempt runs after each one,
//! stopping the read as soon as a complete record is recognized.

use crate::error::{Error, Result};
use crate::io::SourceRead;
use tracing::trace;

/// MIME type code marking a redirect entry
pub const REDIRECT_MIME: u16 = 0xFFFF;

/// Prefix length of a redirect entry, and the minimum decodable record
const REDIRECT_PREFIX_LEN: usize = 12;

/// Prefix length of a content entry
const CONTENT_PREFIX_LEN: usize = 16;

/// Bytes requested from the source per parse attempt
const READ_CHUNK: usize = 1024;

/// What a directory entry points at.
///
/// A redirect aliases another entry by index; a content entry locates its
/// payload as a blob within a cluster. No entry carries both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTarget {
    Redirect { entry: u32 },
    Content { cluster: u32, blob: u32 },
}

/// A decoded directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Index into the archive's MIME type list, or [`REDIRECT_MIME`]
    pub mime_type: u16,
    /// Single-character classification tag
    pub namespace: char,
    /// Entry revision
    pub revision: u32,
    /// Redirect target or content locator
    pub target: EntryTarget,
    /// Entry URL
    pub url: String,
    /// Entry title (may be empty)
    pub title: String,
}

impl DirectoryEntry {
    pub fn is_redirect(&self) -> bool {
        matches!(self.target, EntryTarget::Redirect { .. })
    }

    /// Cluster and blob index for a content entry
    pub fn location(&self) -> Option<(u32, u32)> {
        match self.target {
            EntryTarget::Content { cluster, blob } => Some((cluster, blob)),
            EntryTarget::Redirect { .. } => None,
        }
    }

    /// Target entry index for a redirect
    pub fn redirect(&self) -> Option<u32> {
        match self.target {
            EntryTarget::Redirect { entry } => Some(entry),
            EntryTarget::Content { .. } => None,
        }
    }
}

/// Where to find a directory entry: a slot in the URL pointer table, or an
/// already-known absolute byte offset.
#[derive(Debug, Clone, Copy)]
pub enum EntryLocator {
    Index(u32),
    Offset(u64),
}

/// Outcome of a single parse attempt over the bytes gathered so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    /// At least this many further bytes are required
    NeedMoreBytes(usize),
    /// A complete record spanning `len` bytes of the buffer
    Parsed { entry: DirectoryEntry, len: usize },
}

/// Attempt to parse one directory entry from the start of `buf`.
///
/// Pure: no reads, no side effects. Short buffers are "not yet enough
/// data", never an error.
pub fn parse_directory_entry(buf: &[u8]) -> ParseStatus {
    if buf.len() < REDIRECT_PREFIX_LEN {
        return ParseStatus::NeedMoreBytes(REDIRECT_PREFIX_LEN - buf.len());
    }

    let mime_type = u16::from_le_bytes([buf[0], buf[1]]);
    let namespace = namespace_char(buf[3]);
    let revision = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);

    let (target, strings_start) = if mime_type == REDIRECT_MIME {
        let entry = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        (EntryTarget::Redirect { entry }, REDIRECT_PREFIX_LEN)
    } else {
        if buf.len() < CONTENT_PREFIX_LEN {
            return ParseStatus::NeedMoreBytes(CONTENT_PREFIX_LEN - buf.len());
        }
        let cluster = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let blob = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);
        (EntryTarget::Content { cluster, blob }, CONTENT_PREFIX_LEN)
    };

    let Some(url_len) = buf[strings_start..].iter().position(|b| *b == 0) else {
        return ParseStatus::NeedMoreBytes(1);
    };
    let title_start = strings_start + url_len + 1;
    let Some(title_len) = buf[title_start..].iter().position(|b| *b == 0) else {
        return ParseStatus::NeedMoreBytes(1);
    };

    let entry = DirectoryEntry {
        mime_type,
        namespace,
        revision,
        target,
        url: String::from_utf8_lossy(&buf[strings_start..strings_start + url_len]).into_owned(),
        title: String::from_utf8_lossy(&buf[title_start..title_start + title_len]).into_owned(),
    };

    ParseStatus::Parsed {
        entry,
        len: title_start + title_len + 1,
    }
}

/// Decode the directory entry starting at `offset`.
///
/// Reads growing chunks and re-attempts the parse after each, releasing the
/// source as soon as a complete record is found. A source that ends before
/// the 12-byte minimum fails with [`Error::TruncatedRead`]; one that ends
/// without both string terminators fails with [`Error::MalformedEntry`].
/// Partial records are never returned.
pub fn read_entry_at<S: SourceRead + ?Sized>(source: &S, offset: u64) -> Result<DirectoryEntry> {
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let got = source.read_at(offset + buf.len() as u64, &mut chunk)?;
        if got == 0 {
            return Err(if buf.len() < REDIRECT_PREFIX_LEN {
                Error::TruncatedRead {
                    expected: REDIRECT_PREFIX_LEN as u64,
                    actual: buf.len() as u64,
                }
            } else {
                Error::MalformedEntry { offset }
            });
        }
        buf.extend_from_slice(&chunk[..got]);

        match parse_directory_entry(&buf) {
            ParseStatus::Parsed { entry, len } => {
                trace!("Decoded {len}-byte entry at {offset:#x}: {}", entry.url);
                return Ok(entry);
            }
            ParseStatus::NeedMoreBytes(_) => {}
        }
    }
}

/// The namespace byte is a single UTF-8 character, which for one byte means
/// ASCII or the replacement character.
fn namespace_char(b: u8) -> char {
    if b.is_ascii() {
        b as char
    } else {
        char::REPLACEMENT_CHARACTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_entry(
        mime: u16,
        namespace: u8,
        revision: u32,
        cluster: u32,
        blob: u32,
        url: &str,
        title: &str,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&mime.to_le_bytes());
        buf.push(0); // parameter length, unused
        buf.push(namespace);
        buf.extend_from_slice(&revision.to_le_bytes());
        buf.extend_from_slice(&cluster.to_le_bytes());
        buf.extend_from_slice(&blob.to_le_bytes());
        buf.extend_from_slice(url.as_bytes());
        buf.push(0);
        buf.extend_from_slice(title.as_bytes());
        buf.push(0);
        buf
    }

    fn redirect_entry(namespace: u8, target: u32, url: &str, title: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&REDIRECT_MIME.to_le_bytes());
        buf.push(0);
        buf.push(namespace);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&target.to_le_bytes());
        buf.extend_from_slice(url.as_bytes());
        buf.push(0);
        buf.extend_from_slice(title.as_bytes());
        buf.push(0);
        buf
    }

    #[test]
    fn test_parse_content_entry() {
        let data = content_entry(0, b'-', 0, 9, 472, "j/body.js", "");
        let ParseStatus::Parsed { entry, len } = parse_directory_entry(&data) else {
            panic!("expected a complete record");
        };

        assert_eq!(entry.mime_type, 0);
        assert_eq!(entry.namespace, '-');
        assert_eq!(entry.revision, 0);
        assert_eq!(
            entry.target,
            EntryTarget::Content {
                cluster: 9,
                blob: 472
            }
        );
        assert_eq!(entry.url, "j/body.js");
        assert_eq!(entry.title, "");
        assert_eq!(len, data.len());
        assert!(!entry.is_redirect());
        assert_eq!(entry.location(), Some((9, 472)));
        assert_eq!(entry.redirect(), None);
    }

    #[test]
    fn test_parse_redirect_entry() {
        let data = redirect_entry(b'A', 2435, "index.htm", "Main Page");
        let ParseStatus::Parsed { entry, .. } = parse_directory_entry(&data) else {
            panic!("expected a complete record");
        };

        assert_eq!(entry.mime_type, REDIRECT_MIME);
        assert!(entry.is_redirect());
        assert_eq!(entry.redirect(), Some(2435));
        assert_eq!(entry.location(), None);
        assert_eq!(entry.url, "index.htm");
        assert_eq!(entry.title, "Main Page");
    }

    #[test]
    fn test_parse_needs_prefix() {
        assert_eq!(parse_directory_entry(&[]), ParseStatus::NeedMoreBytes(12));
        assert_eq!(
            parse_directory_entry(&[0; 5]),
            ParseStatus::NeedMoreBytes(7)
        );
    }

    #[test]
    fn test_parse_content_needs_sixteen_bytes() {
        let data = content_entry(0, b'A', 0, 1, 2, "a", "b");
        assert_eq!(
            parse_directory_entry(&data[..13]),
            ParseStatus::NeedMoreBytes(3)
        );
    }

    #[test]
    fn test_parse_needs_terminators() {
        let data = content_entry(0, b'A', 0, 1, 2, "article", "title");
        // Cut inside the URL, then inside the title.
        assert_eq!(
            parse_directory_entry(&data[..20]),
            ParseStatus::NeedMoreBytes(1)
        );
        assert_eq!(
            parse_directory_entry(&data[..data.len() - 1]),
            ParseStatus::NeedMoreBytes(1)
        );
    }

    #[test]
    fn test_read_entry_at_offset() {
        let mut data = vec![0xAAu8; 40];
        data.extend_from_slice(&content_entry(2, b'A', 7, 3, 1, "page.html", "A Page"));
        data.extend_from_slice(b"trailing bytes of the next record");

        let entry = read_entry_at(&data, 40).unwrap();
        assert_eq!(entry.url, "page.html");
        assert_eq!(entry.title, "A Page");
        assert_eq!(entry.location(), Some((3, 1)));
    }

    #[test]
    fn test_read_entry_spanning_chunks() {
        let url = "u/".repeat(900); // record longer than one read chunk
        let data = content_entry(0, b'A', 0, 0, 0, &url, "long");
        let entry = read_entry_at(&data, 0).unwrap();
        assert_eq!(entry.url.len(), 1800);
        assert_eq!(entry.title, "long");
    }

    #[test]
    fn test_read_entry_truncated() {
        let data = vec![0u8; 5];
        let err = read_entry_at(&data, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedRead {
                expected: 12,
                actual: 5
            }
        ));
    }

    #[test]
    fn test_read_entry_missing_terminator() {
        let data = content_entry(0, b'A', 0, 1, 2, "page", "title");
        let cut = &data[..data.len() - 1];
        let err = read_entry_at(&cut, 0).unwrap_err();
        assert!(matches!(err, Error::MalformedEntry { offset: 0 }));
    }

    #[test]
    fn test_non_ascii_namespace() {
        let data = content_entry(0, 0xC3, 0, 1, 2, "a", "b");
        let ParseStatus::Parsed { entry, .. } = parse_directory_entry(&data) else {
            panic!("expected a complete record");
        };
        assert_eq!(entry.namespace, char::REPLACEMENT_CHARACTER);
    }
}
