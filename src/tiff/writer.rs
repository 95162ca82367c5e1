//! Classic TIFF directory writer
//!
//! Directories are written into an append-only stream: the values that do
//! not fit into a record are written first (word aligned), then the record
//! table itself. The caller owns the next-directory pointer that follows
//! each top-level directory, so pages can be chained one at a time.

use log::{debug, trace};
use std::io::{SeekFrom, Write};

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableWriter;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::validation::to_u32;
use crate::tiff::values::TagValue;
use crate::utils::{tag_utils, write_utils};

/// Writes headers and directories in one byte order
pub struct TiffWriter {
    byte_order: ByteOrder,
    handler: Box<dyn ByteOrderHandler>,
}

impl TiffWriter {
    /// Creates a writer for the given byte order
    pub fn new(byte_order: ByteOrder) -> Self {
        TiffWriter {
            byte_order,
            handler: byte_order.create_handler(),
        }
    }

    /// The byte order everything is written in
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Writes the byte order marker and the version number
    ///
    /// The first-directory offset is left to the caller.
    pub fn write_header<W: Write + ?Sized>(&self, out: &mut W) -> TiffResult<()> {
        let mut bytes = self.byte_order.marker().to_vec();
        self.handler.write_u16(&mut bytes, header::TIFF_VERSION)?;
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Writes a 32-bit value at the current position
    pub fn write_u32<W: Write + ?Sized>(&self, out: &mut W, value: u32) -> TiffResult<()> {
        out.write_all(&self.encode_u32(value)?)?;
        Ok(())
    }

    fn encode_u32(&self, value: u32) -> TiffResult<[u8; 4]> {
        let mut encoded = Vec::with_capacity(4);
        self.handler.write_u32(&mut encoded, value)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&encoded);
        Ok(bytes)
    }

    /// Overwrites the 32-bit value at `position`, then returns to the end
    pub fn patch_u32(&self, out: &mut dyn SeekableWriter, position: u64, value: u32) -> TiffResult<()> {
        trace!("Patching offset at {} with {}", position, value);
        out.seek(SeekFrom::Start(position))?;
        self.write_u32(out, value)?;
        out.seek(SeekFrom::End(0))?;
        Ok(())
    }

    /// Writes a directory and everything it references, except pixel data
    ///
    /// Nested directories are written first, each followed by a zero
    /// next-directory pointer. Returns the offset of the directory itself.
    /// No next-directory pointer is written after it.
    pub fn write_directory(&self, ifd: &IFD, out: &mut dyn SeekableWriter) -> TiffResult<u64> {
        let entries = write_utils::get_unique_sorted_entries(ifd.get_entries());
        let entry_count = u16::try_from(entries.len())
            .map_err(|_| TiffError::GenericError(format!("Too many entries in IFD: {}", entries.len())))?;

        let mut fields = Vec::with_capacity(entries.len());
        for entry in &entries {
            let bytes = match &entry.value {
                TagValue::Ifd(children) => {
                    let mut offsets = Vec::with_capacity(children.len());
                    for child in children {
                        debug!("Writing {} sub-IFD #{}", tag_utils::get_tag_name(entry.tag), child.number);
                        offsets.push(to_u32(self.write_directory(child, out)?)?);
                        self.write_u32(out, 0)?;
                    }
                    TagValue::Long(offsets).to_bytes(self.handler.as_ref())?
                },
                value => value.to_bytes(self.handler.as_ref())?,
            };
            fields.push(self.place_value(&bytes, out)?);
        }

        let offset = write_utils::pad_to_word_boundary(out)?;
        to_u32(offset)?;

        let mut table = Vec::with_capacity(2 + entries.len() * 12);
        self.handler.write_u16(&mut table, entry_count)?;
        for (entry, field) in entries.iter().zip(fields) {
            self.handler.write_u16(&mut table, entry.tag)?;
            self.handler.write_u16(&mut table, entry.field_type)?;
            self.handler.write_u32(&mut table, to_u32(entry.count() as u64)?)?;
            table.extend_from_slice(&field);
        }
        out.write_all(&table)?;

        debug!("Wrote IFD with {} entries at offset {}", entry_count, offset);
        Ok(offset)
    }

    /// Returns the 4-byte record field for a value
    ///
    /// Values up to 4 bytes are stored left-justified in the field; larger
    /// ones are written to the stream and the field holds their offset.
    fn place_value(&self, bytes: &[u8], out: &mut dyn SeekableWriter) -> TiffResult<[u8; 4]> {
        let mut field = [0u8; 4];

        if bytes.len() <= 4 {
            field[..bytes.len()].copy_from_slice(bytes);
            return Ok(field);
        }

        let position = to_u32(write_utils::pad_to_word_boundary(out)?)?;
        out.write_all(bytes)?;

        self.encode_u32(position)
    }
}
