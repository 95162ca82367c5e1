//! Unit tests for page rewriting, containers and orientation

mod container_tests;

use std::cell::RefCell;
use std::io::Cursor;

use crate::pages::operations::{get_pages, write_pages, WriteOptions};
use crate::pages::page::ByteRanges;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::types::TIFF;

/// Parses a written container
pub(crate) fn read_back(bytes: &[u8]) -> TIFF {
    TiffReader::new().read(&mut Cursor::new(bytes.to_vec())).unwrap()
}

/// The bytes of each strip or tile of `ifd`
pub(crate) fn range_bytes(bytes: &[u8], ifd: &IFD) -> Vec<Vec<u8>> {
    let ranges = ByteRanges::locate(ifd).unwrap().unwrap();
    ranges.offsets.iter().zip(&ranges.byte_counts)
        .map(|(&offset, &count)| bytes[offset as usize..(offset + count) as usize].to_vec())
        .collect()
}

/// Writes every page of `source` into a new little-endian container
pub(crate) fn rewrite_all(source: Vec<u8>) -> Vec<u8> {
    let source = RefCell::new(Cursor::new(source));
    let pages = get_pages(&source).unwrap();
    write_pages(Cursor::new(Vec::new()), pages, &WriteOptions::default())
        .unwrap()
        .into_inner()
}
