//! Seekable reader and writer traits
//!
//! This module provides unified traits for streams that support both
//! reading (or writing) and seeking operations.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::tiff::errors::TiffResult;
use crate::tiff::validation;

/// Trait for readers that can both read and seek
///
/// Source containers are read out of order: strips, tiles and legacy
/// JPEG tables are scattered across the file.
pub trait SeekableReader: Read + Seek + Send + Sync {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Trait for writers that can both write and seek
///
/// Output containers are appended to, and patched only at the
/// reserved next-directory placeholders.
pub trait SeekableWriter: Write + Seek {}

impl<T: Write + Seek> SeekableWriter for T {}

/// Copies `length` bytes starting at `offset` in `reader` to the current
/// position of `writer`
///
/// Fails with `UnexpectedEof` if the source range is truncated.
pub fn copy_range<W: Write + ?Sized>(
    reader: &mut dyn SeekableReader,
    writer: &mut W,
    offset: u64,
    length: u64,
) -> io::Result<()> {
    reader.seek(SeekFrom::Start(offset))?;
    let copied = io::copy(&mut (&mut *reader).take(length), writer)?;

    if copied != length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("byte range at {} truncated: expected {} bytes, got {}", offset, length, copied),
        ));
    }

    Ok(())
}

/// Reads exactly `length` bytes at `offset`
///
/// The range is checked against the stream length before the buffer is
/// allocated, so a corrupt length field cannot request gigabytes.
pub fn read_range(reader: &mut dyn SeekableReader, offset: u64, length: u64) -> TiffResult<Vec<u8>> {
    let stream_size = validation::get_file_size(reader)?;
    validation::validate_data_range(offset, length, stream_size)?;

    reader.seek(SeekFrom::Start(offset))?;
    let mut buffer = vec![0u8; length as usize];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}
