//! TIFF file reader implementation
//!
//! This module parses a TIFF stream into its chain of page directories,
//! using the Strategy pattern to handle the two byte orders. Entry values
//! are resolved (inline or out-of-line) and nested directories are parsed
//! recursively, so the resulting directories can be rewritten anywhere.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Cursor, SeekFrom};
use std::path::Path;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;
use crate::tiff::validation;
use crate::tiff::values::{self, TagValue};
use crate::utils::tag_utils;

/// Maximum nesting of sub-directories (SubIFDs inside Exif inside ...)
pub const MAX_DIRECTORY_DEPTH: usize = 8;

/// Upper bound on pages in one chain
const MAX_PAGES: usize = 65_535;

/// Size of one classic TIFF directory record
const ENTRY_SIZE: u64 = 12;

/// An entry as stored on disk, before its value is resolved
struct RawEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    value_field: [u8; 4],
}

/// Reader for classic TIFF files
pub struct TiffReader {
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Size of the stream being read
    file_size: u64,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            file_size: u64::MAX,
        }
    }

    /// Returns the byte order handler, with proper error handling for None case
    fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Loads a TIFF file from the given path
    ///
    /// Opens the file and delegates to the read() method.
    pub fn load(&mut self, filepath: &str) -> TiffResult<TIFF> {
        info!("Loading TIFF file: {}", filepath);

        let file = File::open(Path::new(filepath))?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file); // 1MB buffer

        self.read(&mut reader)
    }

    /// Reads a TIFF stream
    ///
    /// This method handles the core process of reading a TIFF stream:
    /// 1. Detect byte order (little/big endian)
    /// 2. Check the version number
    /// 3. Read all page directories in the chain
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        reader.seek(SeekFrom::Start(0))?;
        self.file_size = validation::get_file_size(reader)?;

        let byte_order = ByteOrder::detect(reader)?;
        debug!("Detected byte order: {}", byte_order.name());
        self.byte_order_handler = Some(byte_order.create_handler());

        let handler = self.handler()?;
        let version = handler.read_u16(reader)?;
        match version {
            header::TIFF_VERSION => debug!("Detected standard TIFF format"),
            // BigTIFF offsets cannot be carried into a classic container
            _ => return Err(TiffError::UnsupportedVersion(version)),
        }

        let first_ifd_offset = handler.read_u32(reader)? as u64;
        debug!("First IFD offset: {}", first_ifd_offset);
        validation::validate_ifd_offset(first_ifd_offset, self.file_size)?;

        let mut tiff = TIFF::new(byte_order);
        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset)?;

        info!("Read {} page(s) from TIFF stream", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads the chain of top-level IFDs starting from the given offset
    ///
    /// The chain ends at a zero offset. An offset outside the stream or one
    /// that was already visited ends the chain with a warning.
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_ifd_offset: u64) -> TiffResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 {
            if ifds.len() >= MAX_PAGES {
                warn!("Stopping IFD chain after {} pages", MAX_PAGES);
                break;
            }

            if !visited.insert(ifd_offset) {
                warn!("IFD chain loops back to offset {}, stopping", ifd_offset);
                break;
            }

            if validation::validate_ifd_offset(ifd_offset, self.file_size).is_err() {
                warn!("IFD offset {} outside file of size {}, stopping IFD chain", ifd_offset, self.file_size);
                break;
            }

            let (ifd, next_offset) = self.read_ifd(reader, ifd_offset, ifds.len(), 0)?;
            debug!("Read IFD #{} with {} entries, next at {}", ifd.number, ifd.entry_count(), next_offset);

            ifds.push(ifd);
            ifd_offset = next_offset;
        }

        Ok(ifds)
    }

    /// Reads one IFD and the offset of the IFD that follows it
    ///
    /// `depth` is 0 for pages and grows by one per level of nesting.
    pub fn read_ifd(
        &self,
        reader: &mut dyn SeekableReader,
        offset: u64,
        number: usize,
        depth: usize,
    ) -> TiffResult<(IFD, u64)> {
        let handler = self.handler()?;
        reader.seek(SeekFrom::Start(offset))?;

        let entry_count = handler.read_u16(reader)? as u64;
        validation::validate_data_range(offset, 2 + entry_count * ENTRY_SIZE + 4, self.file_size)?;

        let mut raw_entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let tag = handler.read_u16(reader)?;
            let field_type = handler.read_u16(reader)?;
            let count = handler.read_u32(reader)?;
            let mut value_field = [0u8; 4];
            reader.read_exact(&mut value_field)?;

            raw_entries.push(RawEntry { tag, field_type, count, value_field });
        }
        let next_offset = handler.read_u32(reader)? as u64;

        let mut ifd = IFD::new(number, offset);
        for raw in raw_entries {
            if let Some(entry) = self.resolve_entry(reader, &raw, depth)? {
                ifd.add_entry(entry);
            }
        }

        Ok((ifd, next_offset))
    }

    /// Resolves a raw record into an entry with its value
    ///
    /// Returns None for field types whose element size is unknown.
    fn resolve_entry(
        &self,
        reader: &mut dyn SeekableReader,
        raw: &RawEntry,
        depth: usize,
    ) -> TiffResult<Option<IFDEntry>> {
        let handler = self.handler()?;
        let tag_name = tag_utils::get_tag_name(raw.tag);

        let size = match values::element_size(raw.field_type) {
            Some(size) => size as u64,
            None => {
                warn!("Skipping tag {} ({}) with unknown field type {}", raw.tag, tag_name, raw.field_type);
                return Ok(None);
            }
        };

        let count = raw.count as usize;
        let total_size = size * raw.count as u64;

        let value = if total_size <= 4 {
            let mut inline = Cursor::new(raw.value_field);
            TagValue::read(raw.field_type, count, &mut inline, handler)?
        } else {
            let value_offset = handler.read_u32(&mut Cursor::new(raw.value_field))? as u64;
            validation::validate_data_range(value_offset, total_size, self.file_size)?;
            reader.seek(SeekFrom::Start(value_offset))?;
            TagValue::read(raw.field_type, count, reader, handler)?
        };

        let points_to_directories = raw.field_type == field_types::IFD
            || (raw.field_type == field_types::LONG && tags::SUB_DIRECTORY_TAGS.contains(&raw.tag));

        if !points_to_directories {
            return Ok(Some(IFDEntry::new(raw.tag, raw.field_type, value)));
        }

        if depth + 1 > MAX_DIRECTORY_DEPTH {
            return Err(TiffError::DirectoryDepthExceeded(MAX_DIRECTORY_DEPTH));
        }

        let mut children = Vec::new();
        for (index, child_offset) in value.to_u64_vec(raw.tag)?.into_iter().enumerate() {
            debug!("Reading {} sub-IFD #{} at offset {}", tag_name, index, child_offset);
            validation::validate_ifd_offset(child_offset, self.file_size)?;
            let (child, _) = self.read_ifd(reader, child_offset, index, depth + 1)?;
            children.push(child);
        }

        Ok(Some(IFDEntry::new(raw.tag, raw.field_type, TagValue::Ifd(children))))
    }
}
