//! File Module
//!
//! The narrow file capability the store depends on.
//!
//! ## Responsibilities
//! - Open an existing file for sequential reading
//! - Create (or truncate) a file for sequential writing
//! - Report the file size
//! - Release the handle on drop (there is no explicit close)

mod local;
mod memory;

use std::io;
use std::path::Path;

pub use local::{LocalFile, LocalFileSystem};

/// A byte-oriented handle owned by a single load or save
pub trait FileHandle: Send {
    /// Read up to `buf.len()` bytes. `Ok(0)` means end of input.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Total size of the underlying file in bytes. Legacy reads treat it as
    /// a hint; pipes may report zero.
    fn size(&self) -> io::Result<u64>;

    /// Flush written bytes to durable storage
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Opens and creates file handles by path
pub trait FileSystem: Send + Sync {
    /// Open an existing file for reading
    fn open(&self, path: &Path) -> io::Result<Box<dyn FileHandle>>;

    /// Create a file for writing, truncating it if it exists
    fn create(&self, path: &Path) -> io::Result<Box<dyn FileHandle>>;
}

impl<H: FileHandle + ?Sized> FileHandle for Box<H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write_all(buf)
    }

    fn size(&self) -> io::Result<u64> {
        (**self).size()
    }

    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

impl<H: FileHandle + ?Sized> FileHandle for &mut H {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write_all(buf)
    }

    fn size(&self) -> io::Result<u64> {
        (**self).size()
    }

    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}
