//! In-memory handle
//!
//! Lets the stream layer run against a `Cursor<Vec<u8>>`.

use std::io::{self, Cursor, Read, Write};

use super::FileHandle;

impl FileHandle for Cursor<Vec<u8>> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write_all(self, buf)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }
}
