//! Tests for the TIFF reader

extern crate std;

use std::io::Cursor;
use byteorder::{LittleEndian, WriteBytesExt};

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{field_types, tags};
use crate::tiff::errors::TiffError;
use crate::tiff::reader::{TiffReader, MAX_DIRECTORY_DEPTH};
use crate::tiff::tests::test_utils::{walk_chain, FixtureBuilder, FixtureValue};
use crate::tiff::values::TagValue;

/// Directories nested `levels` deep below the returned entry list
fn nested_entries(levels: usize) -> Vec<(u16, FixtureValue)> {
    if levels == 0 {
        return vec![(tags::IMAGE_WIDTH, FixtureValue::Long(vec![1]))];
    }
    vec![(tags::EXIF_IFD, FixtureValue::Ifd(nested_entries(levels - 1)))]
}

#[test]
fn test_read_page_chain() {
    let mut builder = FixtureBuilder::new();
    builder.page(vec![(tags::IMAGE_WIDTH, FixtureValue::Long(vec![640]))]);
    builder.page(vec![(tags::IMAGE_WIDTH, FixtureValue::Long(vec![320]))]);
    builder.page(vec![(tags::IMAGE_WIDTH, FixtureValue::Short(vec![160]))]);
    let mut cursor = builder.cursor();

    let tiff = TiffReader::new().read(&mut cursor).unwrap();

    std::assert_eq!(tiff.byte_order, ByteOrder::LittleEndian);
    std::assert_eq!(tiff.ifd_count(), 3);
    let widths: Vec<_> = tiff.ifds.iter().map(|ifd| ifd.get_tag_value(tags::IMAGE_WIDTH)).collect();
    std::assert_eq!(widths, vec![Some(640), Some(320), Some(160)]);
    std::assert_eq!(tiff.ifds[2].number, 2);
}

#[test]
fn test_read_big_endian_values() {
    let mut builder = FixtureBuilder::big_endian();
    builder.page(vec![
        (tags::IMAGE_WIDTH, FixtureValue::Short(vec![0x0102])),
        (tags::IMAGE_LENGTH, FixtureValue::Long(vec![0x01020304])),
        (tags::BITS_PER_SAMPLE, FixtureValue::Short(vec![8, 8, 8])),
    ]);
    let mut cursor = builder.cursor();

    let tiff = TiffReader::new().read(&mut cursor).unwrap();
    let ifd = &tiff.ifds[0];

    std::assert_eq!(tiff.byte_order, ByteOrder::BigEndian);
    std::assert_eq!(ifd.get_dimensions(), Some((0x0102, 0x01020304)));
    std::assert_eq!(ifd.get_entry(tags::BITS_PER_SAMPLE).unwrap().value, TagValue::Short(vec![8, 8, 8]));
}

#[test]
fn test_read_out_of_line_values() {
    let mut builder = FixtureBuilder::new();
    builder.page(vec![
        (tags::STRIP_OFFSETS, FixtureValue::Long(vec![100, 200, 300])),
        (tags::SOFTWARE, FixtureValue::Ascii("tiffsplice")),
        (282, FixtureValue::Rational(vec![(300, 1)])),
        (tags::JPEG_TABLES, FixtureValue::Undefined(vec![0xFF, 0xD8, 0xFF, 0xD9, 0x00])),
    ]);
    let mut cursor = builder.cursor();

    let tiff = TiffReader::new().read(&mut cursor).unwrap();
    let ifd = &tiff.ifds[0];

    std::assert_eq!(ifd.get_entry(tags::STRIP_OFFSETS).unwrap().value, TagValue::Long(vec![100, 200, 300]));
    std::assert_eq!(ifd.get_entry(tags::SOFTWARE).unwrap().value, TagValue::Ascii(b"tiffsplice\0".to_vec()));
    std::assert_eq!(ifd.get_entry(282).unwrap().value, TagValue::Rational(vec![(300, 1)]));
    std::assert_eq!(ifd.get_entry(tags::JPEG_TABLES).unwrap().count(), 5);
}

#[test]
fn test_read_nested_directory() {
    let mut builder = FixtureBuilder::new();
    builder.page(vec![
        (tags::IMAGE_WIDTH, FixtureValue::Long(vec![8])),
        (tags::EXIF_IFD, FixtureValue::Ifd(vec![
            (36864, FixtureValue::Undefined(b"0230".to_vec())),
        ])),
    ]);
    let mut cursor = builder.cursor();

    let tiff = TiffReader::new().read(&mut cursor).unwrap();
    let entry = tiff.ifds[0].get_entry(tags::EXIF_IFD).unwrap();

    std::assert!(entry.is_sub_directory());
    std::assert_eq!(entry.field_type, field_types::LONG);
    match &entry.value {
        TagValue::Ifd(children) => {
            std::assert_eq!(children.len(), 1);
            std::assert_eq!(children[0].get_entry(36864).unwrap().value, TagValue::Undefined(b"0230".to_vec()));
        },
        other => std::panic!("expected nested directory, got {:?}", other),
    }
}

#[test]
fn test_nesting_depth_limit() {
    let mut builder = FixtureBuilder::new();
    builder.page(nested_entries(MAX_DIRECTORY_DEPTH));
    std::assert!(TiffReader::new().read(&mut builder.cursor()).is_ok());

    let mut builder = FixtureBuilder::new();
    builder.page(nested_entries(MAX_DIRECTORY_DEPTH + 1));
    let result = TiffReader::new().read(&mut builder.cursor());
    std::assert!(matches!(result, Err(TiffError::DirectoryDepthExceeded(MAX_DIRECTORY_DEPTH))));
}

#[test]
fn test_chain_cycle_stops() {
    let mut builder = FixtureBuilder::new();
    builder.page(vec![(tags::IMAGE_WIDTH, FixtureValue::Long(vec![1]))]);
    builder.page(vec![(tags::IMAGE_WIDTH, FixtureValue::Long(vec![2]))]);
    let mut bytes = builder.build();

    // Point the second page back at the first
    let chain = walk_chain(&bytes);
    let (first_offset, _) = chain[0];
    let (_, last_pointer) = chain[1];
    bytes[last_pointer..last_pointer + 4].copy_from_slice(&first_offset.to_le_bytes());

    let tiff = TiffReader::new().read(&mut Cursor::new(bytes)).unwrap();
    std::assert_eq!(tiff.ifd_count(), 2);
}

#[test]
fn test_next_offset_outside_stream_stops() {
    let mut builder = FixtureBuilder::new();
    builder.page(vec![(tags::IMAGE_WIDTH, FixtureValue::Long(vec![1]))]);
    let mut bytes = builder.build();

    let (_, pointer) = walk_chain(&bytes)[0];
    bytes[pointer..pointer + 4].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());

    let tiff = TiffReader::new().read(&mut Cursor::new(bytes)).unwrap();
    std::assert_eq!(tiff.ifd_count(), 1);
}

#[test]
fn test_unknown_field_type_is_skipped() {
    let mut builder = FixtureBuilder::new();
    builder.page(vec![
        (tags::IMAGE_WIDTH, FixtureValue::Long(vec![4])),
        (50000, FixtureValue::Raw { field_type: 99, count: 1, field: [1, 2, 3, 4] }),
    ]);
    let mut cursor = builder.cursor();

    let tiff = TiffReader::new().read(&mut cursor).unwrap();
    std::assert_eq!(tiff.ifds[0].entry_count(), 1);
    std::assert!(!tiff.ifds[0].has_tag(50000));
}

#[test]
fn test_big_tiff_is_rejected() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"II");
    buffer.write_u16::<LittleEndian>(43).unwrap();
    buffer.write_u16::<LittleEndian>(8).unwrap();
    buffer.write_u16::<LittleEndian>(0).unwrap();
    buffer.write_u64::<LittleEndian>(16).unwrap();

    let result = TiffReader::new().read(&mut Cursor::new(buffer));
    std::assert!(matches!(result, Err(TiffError::UnsupportedVersion(43))));
}

#[test]
fn test_invalid_marker_is_rejected() {
    let buffer = b"XX\x2a\x00\x08\x00\x00\x00".to_vec();
    let result = TiffReader::new().read(&mut Cursor::new(buffer));
    std::assert!(matches!(result, Err(TiffError::InvalidByteOrder(_))));
}

#[test]
fn test_first_offset_outside_stream() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"II");
    buffer.write_u16::<LittleEndian>(42).unwrap();
    buffer.write_u32::<LittleEndian>(4096).unwrap();

    std::assert!(TiffReader::new().read(&mut Cursor::new(buffer)).is_err());
}
