//! Positioned container access with memory mapping support

use crate::error::{Error, Result};
use memmap2::MmapOptions;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Offset-addressed byte source backing all container reads.
///
/// Every read names its own absolute offset, so logically independent reads
/// can be issued concurrently against one handle without a shared cursor.
pub trait SourceRead: Send + Sync {
    /// Read bytes at `offset`, filling as much of `buf` as the source can.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()` only
    /// when the end of the source is reached. A return of 0 means `offset`
    /// is at or past the end.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total size of the source in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read exactly `buf.len()` bytes at `offset`.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let got = self.read_at(offset, buf)?;
        if got < buf.len() {
            return Err(Error::TruncatedRead {
                expected: buf.len() as u64,
                actual: got as u64,
            });
        }
        Ok(())
    }
}

impl<T: SourceRead + ?Sized> SourceRead for &T {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn len(&self) -> u64 {
        (**self).len()
    }
}

impl SourceRead for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }

    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }
}

impl SourceRead for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.as_slice().read_at(offset, buf)
    }

    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }
}

/// Limit memory mapping to 2GB files
const MMAP_LIMIT: u64 = 2_147_483_648;

/// Container file opened for positioned reads, memory-mapped when possible
pub struct FileSource {
    /// Memory-mapped file (if available)
    mmap: Option<memmap2::Mmap>,
    /// Positioned-read fallback
    file: Option<File>,
    /// Size of the container
    size: u64,
}

impl FileSource {
    /// Open a container file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        debug!("Opening container: {:?} (size: {} bytes)", path, size);

        let mmap = if size > 0 && size < MMAP_LIMIT {
            match unsafe { MmapOptions::new().map(&file) } {
                Ok(mmap) => {
                    debug!("Successfully memory-mapped container");
                    Some(mmap)
                }
                Err(e) => {
                    debug!("Failed to memory-map container, using positioned reads: {}", e);
                    None
                }
            }
        } else {
            None
        };

        // If we couldn't mmap, keep the handle for positioned reads
        let file = if mmap.is_none() { Some(file) } else { None };

        Ok(Self { mmap, file, size })
    }

    /// Check if memory mapping is available
    pub fn is_memory_mapped(&self) -> bool {
        self.mmap.is_some()
    }
}

#[cfg(unix)]
fn read_at_file(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at_file(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

impl SourceRead for FileSource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        let n = buf.len().min((self.size - offset) as usize);

        if let Some(ref mmap) = self.mmap {
            // Fast path: memory-mapped access
            let start = offset as usize;
            buf[..n].copy_from_slice(&mmap[start..start + n]);
            Ok(n)
        } else if let Some(ref file) = self.file {
            // Slow path: positioned reads, retried until the range is full
            let mut filled = 0;
            while filled < n {
                match read_at_file(file, offset + filled as u64, &mut buf[filled..n]) {
                    Ok(0) => break,
                    Ok(read) => filled += read,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(Error::Io(e)),
                }
            }
            Ok(filled)
        } else {
            Ok(0)
        }
    }

    fn len(&self) -> u64 {
        self.size
    }
}
