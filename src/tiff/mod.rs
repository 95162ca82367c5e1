//! TIFF container parsing and writing
//!
//! This module provides the directory model (entries with decoded values,
//! nested directories) and the reader and writer for classic TIFF streams.

pub mod constants;
pub mod errors;
pub mod ifd;
pub mod reader;
pub mod types;
pub(crate) mod validation;
pub mod values;
pub mod writer;

#[cfg(test)]
pub(crate) mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
pub use values::TagValue;
pub use writer::TiffWriter;
