//! TIFF validation utilities
//!
//! This module provides validation functions for TIFF streams
//! to ensure data integrity and prevent errors when processing
//! potentially malformed files.

use log::warn;
use std::io::SeekFrom;

use crate::io::seekable::SeekableReader;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::constants::header;

/// Validates an IFD offset to ensure it's within reasonable bounds
pub fn validate_ifd_offset(offset: u64, file_size: u64) -> TiffResult<()> {
    if offset >= file_size || offset < header::HEADER_SIZE {
        return Err(TiffError::GenericError(format!(
            "Invalid IFD offset: {} (file size: {})",
            offset, file_size
        )));
    }

    Ok(())
}

/// Validates that a byte range lies inside the stream
pub fn validate_data_range(offset: u64, length: u64, file_size: u64) -> TiffResult<()> {
    match offset.checked_add(length) {
        Some(end) if end <= file_size => Ok(()),
        _ => Err(TiffError::GenericError(format!(
            "Data range {}+{} exceeds file size {}",
            offset, length, file_size
        ))),
    }
}

/// Gets the stream size for validation purposes
///
/// # Returns
/// The size or u64::MAX if it couldn't be determined
pub fn get_file_size(reader: &mut dyn SeekableReader) -> TiffResult<u64> {
    let current_position = reader.stream_position()?;
    let file_size = match reader.seek(SeekFrom::End(0)) {
        Ok(size) => size,
        Err(e) => {
            warn!("Could not determine file size: {}", e);
            u64::MAX
        }
    };
    reader.seek(SeekFrom::Start(current_position))?;

    Ok(file_size)
}

/// Converts an offset or count into a classic TIFF 32-bit field
pub fn to_u32(value: u64) -> TiffResult<u32> {
    u32::try_from(value).map_err(|_| TiffError::OffsetOverflow(value))
}
