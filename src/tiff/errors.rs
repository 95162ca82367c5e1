//! Custom error types for TIFF processing

use std::fmt;
use std::io;

/// TIFF-specific error types
#[derive(Debug)]
pub enum TiffError {
    /// I/O error
    IoError(io::Error),
    /// Invalid TIFF header
    InvalidHeader,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Unsupported TIFF version
    UnsupportedVersion(u16),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported field type
    UnsupportedFieldType(u16),
    /// A value could not be read as an offset or byte count array
    UnsupportedValueType { tag: u16, field_type: u16 },
    /// Offset and byte count arrays differ in length
    MismatchedByteRanges { offsets: usize, byte_counts: usize },
    /// Old-style JPEG layout that cannot be converted
    UnsupportedLegacyJpeg(String),
    /// Multi-strip old-style JPEG whose first strip does not start with SOS
    MissingStartOfScan,
    /// Old-style and new-style JPEG data on the same page
    AmbiguousJpegTables(String),
    /// Old-style JPEG entries survived the conversion
    TranscodeInvariant(u16),
    /// Nested directories deeper than the supported limit
    DirectoryDepthExceeded(usize),
    /// Offset or count does not fit a classic TIFF 32-bit field
    OffsetOverflow(u64),
    /// Orientation value outside the eight defined codes
    InvalidOrientation(u64),
    /// Rotation that is not 90, 180 or 270 degrees
    InvalidRotation(i32),
    /// Page index beyond the number of pages
    PageIndexOutOfRange { index: usize, count: usize },
    /// Existing output stream is not an appendable container
    InvalidContainer(String),
    /// Configuration file problem
    ConfigError(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::IoError(e) => write!(f, "I/O error: {}", e),
            TiffError::InvalidHeader => write!(f, "Invalid TIFF header"),
            TiffError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            TiffError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            TiffError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            TiffError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            TiffError::UnsupportedValueType { tag, field_type } =>
                write!(f, "Unsupported value type {} for tag {}, expected SHORT or LONG", field_type, tag),
            TiffError::MismatchedByteRanges { offsets, byte_counts } =>
                write!(f, "Mismatch between {} offsets and {} byte counts", offsets, byte_counts),
            TiffError::UnsupportedLegacyJpeg(msg) => write!(f, "Unsupported old-style JPEG: {}", msg),
            TiffError::MissingStartOfScan =>
                write!(f, "Old-style JPEG with multiple strips is only supported if the first strip starts with SOS"),
            TiffError::AmbiguousJpegTables(msg) => write!(f, "Found old-style and new-style JPEG data: {}", msg),
            TiffError::TranscodeInvariant(tag) =>
                write!(f, "Failed to transform old-style JPEG: tag {} still present", tag),
            TiffError::DirectoryDepthExceeded(depth) =>
                write!(f, "Nested directories exceed maximum depth of {}", depth),
            TiffError::OffsetOverflow(v) => write!(f, "Value {} does not fit in a 32-bit TIFF field", v),
            TiffError::InvalidOrientation(v) => write!(f, "Invalid orientation value: {}", v),
            TiffError::InvalidRotation(d) =>
                write!(f, "Invalid rotation of {} degrees, only 90, 180 and 270 are supported", d),
            TiffError::PageIndexOutOfRange { index, count } =>
                write!(f, "Page index {} out of range, document has {} pages", index, count),
            TiffError::InvalidContainer(msg) => write!(f, "Invalid output container: {}", msg),
            TiffError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            TiffError::GenericError(msg) => write!(f, "TIFF error: {}", msg),
        }
    }
}

impl std::error::Error for TiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TiffError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TiffError {
    fn from(error: io::Error) -> Self {
        TiffError::IoError(error)
    }
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;

impl From<String> for TiffError {
    fn from(msg: String) -> Self {
        TiffError::GenericError(msg)
    }
}
