#![forbid(unsafe_code)]

use std::{fs::File, io, path::Path, sync::Arc};

use crate::error::{Result, SimError};

#[cfg(test)]
macro_rules! io_test_log {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

#[cfg(not(test))]
macro_rules! io_test_log {
    ($($arg:tt)*) => {
        if false {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Positioned, read-only file I/O — trace files are never mutated by this
/// crate, so unlike a storage engine's `FileIo` this trait has no write side.
pub trait FileIo: Send + Sync + 'static {
    /// Reads bytes from the file at the specified offset into the buffer.
    /// Returns the number of bytes actually read (may be less than
    /// `dst.len()` at end of file).
    fn read_at(&self, off: u64, dst: &mut [u8]) -> Result<usize>;
    /// Reads exactly `dst.len()` bytes, failing on short reads.
    fn read_exact_at(&self, off: u64, dst: &mut [u8]) -> Result<()>;
    /// Returns the current length of the file in bytes.
    fn len(&self) -> Result<u64>;
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(unix)]
pub mod stdio_unix {
    use std::{fs::File, io::ErrorKind, os::unix::fs::FileExt, path::Path};

    use crate::error::{Result, SimError};

    use super::StdFileIo;

    pub fn open_ro(path: impl AsRef<Path>) -> Result<StdFileIo> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SimError::IoOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(StdFileIo::new(file))
    }

    pub fn read_exact(file: &File, mut off: u64, mut dst: &mut [u8]) -> std::io::Result<()> {
        io_test_log!("[io.read_exact] start off={} len={}", off, dst.len());
        while !dst.is_empty() {
            let read = file.read_at(dst, off)?;
            if read == 0 {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "read_at reached EOF",
                ));
            }
            let (_, tail) = dst.split_at_mut(read);
            dst = tail;
            off += read as u64;
        }
        Ok(())
    }

    pub fn read(file: &File, off: u64, dst: &mut [u8]) -> std::io::Result<usize> {
        file.read_at(dst, off)
    }
}

#[cfg(windows)]
pub mod stdio_win {
    use std::{fs::File, io::ErrorKind, os::windows::fs::FileExt, path::Path};

    use crate::error::{Result, SimError};

    use super::StdFileIo;

    pub fn open_ro(path: impl AsRef<Path>) -> Result<StdFileIo> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SimError::IoOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(StdFileIo::new(file))
    }

    pub fn read_exact(file: &File, mut off: u64, mut dst: &mut [u8]) -> std::io::Result<()> {
        while !dst.is_empty() {
            let read = file.seek_read(dst, off)?;
            if read == 0 {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "seek_read reached EOF",
                ));
            }
            let (_, tail) = dst.split_at_mut(read);
            dst = tail;
            off += read as u64;
        }
        Ok(())
    }

    pub fn read(file: &File, off: u64, dst: &mut [u8]) -> std::io::Result<usize> {
        file.seek_read(dst, off)
    }
}

/// Positioned read-only file handle, cheaply clonable via `Arc<File>` so a
/// reader `clone()` shares the underlying file descriptor without sharing a
/// cursor position.
#[derive(Clone)]
pub struct StdFileIo {
    inner: Arc<File>,
}

impl StdFileIo {
    pub fn new(file: File) -> Self {
        Self {
            inner: Arc::new(file),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        #[cfg(unix)]
        {
            return stdio_unix::open_ro(path);
        }
        #[cfg(windows)]
        {
            return stdio_win::open_ro(path);
        }
        #[allow(unreachable_code)]
        Err(SimError::ConfigInvalid(
            "positioned file I/O unsupported on this platform".into(),
        ))
    }

    fn file(&self) -> &File {
        &self.inner
    }
}

impl FileIo for StdFileIo {
    fn read_at(&self, off: u64, dst: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            stdio_unix::read(self.file(), off, dst).map_err(SimError::from)
        }
        #[cfg(windows)]
        {
            stdio_win::read(self.file(), off, dst).map_err(SimError::from)
        }
    }

    fn read_exact_at(&self, off: u64, dst: &mut [u8]) -> Result<()> {
        #[cfg(unix)]
        {
            stdio_unix::read_exact(self.file(), off, dst).map_err(SimError::from)
        }
        #[cfg(windows)]
        {
            stdio_win::read_exact(self.file(), off, dst).map_err(SimError::from)
        }
    }

    fn len(&self) -> Result<u64> {
        Ok(self
            .file()
            .metadata()
            .map_err(SimError::from)?
            .len())
    }
}
