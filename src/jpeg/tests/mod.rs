//! Tests for old-style JPEG table merging and strip repacking

extern crate std;

use std::io::{Cursor, Seek, SeekFrom};

use crate::jpeg::interchange::{plan_transcode, starts_with_sos, write_transcoded, Interchange, Transcode, TranscodedRanges};
use crate::jpeg::tables::merge_tables;
use crate::tiff::errors::TiffError;

/// A zero-filled source of `size` bytes with `parts` copied in at their offsets
fn source(size: usize, parts: &[(usize, &[u8])]) -> Cursor<Vec<u8>> {
    let mut buffer = vec![0u8; size];
    for (offset, bytes) in parts {
        buffer[*offset..*offset + bytes.len()].copy_from_slice(bytes);
    }
    Cursor::new(buffer)
}

/// A Huffman table with `symbols` codes of length 1
fn huffman_table(symbols: &[u8]) -> Vec<u8> {
    let mut table = vec![0u8; 16];
    table[0] = symbols.len() as u8;
    table.extend_from_slice(symbols);
    table
}

const HEADER: [u8; 6] = [0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x02];
const SOS_SEGMENT: [u8; 6] = [0xFF, 0xDA, 0x00, 0x04, 0xAA, 0xBB];

#[test]
fn test_merge_tables_layout() {
    let q_table: Vec<u8> = (1..=64).collect();
    let dc_table = huffman_table(&[5]);
    let ac_table = huffman_table(&[1, 2]);
    let mut reader = source(256, &[(0, &q_table), (64, &dc_table), (100, &ac_table)]);

    let blob = merge_tables(&mut reader, &[0], &[64], &[100]).unwrap();

    std::assert_eq!(blob.len(), 2 + 69 + 22 + 23 + 2);
    std::assert_eq!(&blob[0..2], &[0xFF, 0xD8]);

    // DQT: length 67, id 0, then the 64 table bytes
    std::assert_eq!(&blob[2..7], &[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    std::assert_eq!(&blob[7..71], q_table.as_slice());

    // DC table keeps the class bit clear
    std::assert_eq!(&blob[71..76], &[0xFF, 0xC4, 0x00, 20, 0x00]);
    std::assert_eq!(&blob[76..93], dc_table.as_slice());

    // AC table carries the class bit
    std::assert_eq!(&blob[93..98], &[0xFF, 0xC4, 0x00, 21, 0x10]);
    std::assert_eq!(&blob[98..116], ac_table.as_slice());

    std::assert_eq!(&blob[116..], &[0xFF, 0xD9]);
}

#[test]
fn test_merge_tables_ids_follow_position() {
    let first: Vec<u8> = vec![1; 64];
    let second: Vec<u8> = vec![2; 64];
    let ac_table = huffman_table(&[7]);
    let mut reader = source(256, &[(0, &first), (64, &second), (128, &ac_table)]);

    let blob = merge_tables(&mut reader, &[0, 64], &[], &[128, 128]).unwrap();

    std::assert_eq!(blob[6], 0x00);
    std::assert_eq!(blob[6 + 69], 0x01);
    let ac_start = 2 + 2 * 69;
    std::assert_eq!(blob[ac_start + 4], 0x10);
    std::assert_eq!(blob[ac_start + 22 + 4], 0x11);
}

#[test]
fn test_merge_tables_without_tables() {
    let mut reader = source(16, &[]);
    let blob = merge_tables(&mut reader, &[], &[], &[]).unwrap();
    std::assert_eq!(blob, vec![0xFF, 0xD8, 0xFF, 0xD9]);
}

#[test]
fn test_merge_tables_rejects_too_many_tables() {
    let mut reader = source(128, &[]);
    let offsets = vec![0u64; 17];

    let result = merge_tables(&mut reader, &offsets, &[], &[]);
    std::assert!(matches!(result, Err(TiffError::UnsupportedLegacyJpeg(_))));
}

#[test]
fn test_merge_tables_truncated_table() {
    let mut reader = source(32, &[]);
    std::assert!(merge_tables(&mut reader, &[0], &[], &[]).is_err());
}

#[test]
fn test_starts_with_sos() {
    std::assert!(starts_with_sos(&SOS_SEGMENT));
    std::assert!(!starts_with_sos(&HEADER));
    std::assert!(!starts_with_sos(&[0xFF]));
}

#[test]
fn test_identical_header_and_strip() {
    let mut reader = source(64, &[(16, &HEADER)]);
    let interchange = Interchange { offset: 16, length: None };

    let plan = plan_transcode(&mut reader, &interchange, &[16], &[6]).unwrap();
    std::assert_eq!(plan, Transcode::Identical);

    let mut out = Cursor::new(Vec::new());
    let written = write_transcoded(&mut reader, &mut out, &plan, &[16], &[6]).unwrap();
    std::assert!(written.is_none());
    std::assert!(out.into_inner().is_empty());
}

#[test]
fn test_prepend_header_to_adjacent_strip() {
    let strip = [0x01, 0x02, 0x03, 0xFF, 0xD9];
    let mut reader = source(64, &[(20, &HEADER), (26, &strip)]);
    let interchange = Interchange { offset: 20, length: Some(6) };

    let plan = plan_transcode(&mut reader, &interchange, &[26], &[5]).unwrap();
    std::assert_eq!(plan, Transcode::Prepend { header_offset: 20, header_length: 6 });

    let mut out = Cursor::new(vec![0u8; 8]);
    out.seek(SeekFrom::End(0)).unwrap();
    let written = write_transcoded(&mut reader, &mut out, &plan, &[26], &[5]).unwrap();

    std::assert_eq!(written, Some(TranscodedRanges { offsets: vec![8], byte_counts: vec![11] }));
    let bytes = out.into_inner();
    std::assert_eq!(&bytes[8..14], &HEADER);
    std::assert_eq!(&bytes[14..], &strip);
}

#[test]
fn test_repack_inserts_scan_header() {
    let first_strip = [0xFF, 0xDA, 0x00, 0x04, 0xAA, 0xBB, 0xCC];
    let second_strip = [0x11, 0x22];
    let mut reader = source(128, &[(8, &HEADER), (40, &first_strip), (80, &second_strip)]);
    let interchange = Interchange { offset: 8, length: Some(6) };
    let offsets = [40, 80];
    let byte_counts = [7, 2];

    let plan = plan_transcode(&mut reader, &interchange, &offsets, &byte_counts).unwrap();
    std::assert_eq!(plan, Transcode::Repack { header: HEADER.to_vec(), start_of_scan: SOS_SEGMENT.to_vec() });

    let mut out = Cursor::new(Vec::new());
    let written = write_transcoded(&mut reader, &mut out, &plan, &offsets, &byte_counts).unwrap().unwrap();

    std::assert_eq!(written.offsets, vec![0, 13]);
    std::assert_eq!(written.byte_counts, vec![13, 14]);

    let mut expected = HEADER.to_vec();
    expected.extend_from_slice(&first_strip);
    expected.extend_from_slice(&HEADER);
    expected.extend_from_slice(&SOS_SEGMENT);
    expected.extend_from_slice(&second_strip);
    std::assert_eq!(out.into_inner(), expected);
}

#[test]
fn test_single_detached_strip_is_repacked() {
    let strip = [0xFF, 0xDA, 0x00, 0x02, 0x42];
    let mut reader = source(64, &[(8, &HEADER), (32, &strip)]);
    let interchange = Interchange { offset: 8, length: Some(6) };

    let plan = plan_transcode(&mut reader, &interchange, &[32], &[5]).unwrap();
    std::assert_eq!(plan, Transcode::Repack { header: HEADER.to_vec(), start_of_scan: vec![0xFF, 0xDA, 0x00, 0x02] });

    let mut out = Cursor::new(Vec::new());
    let written = write_transcoded(&mut reader, &mut out, &plan, &[32], &[5]).unwrap().unwrap();
    std::assert_eq!(written.byte_counts, vec![11]);
}

#[test]
fn test_repack_requires_scan_header_in_first_strip() {
    let mut reader = source(128, &[(8, &HEADER), (40, &[0x11, 0x22, 0x33, 0x44]), (80, &SOS_SEGMENT)]);
    let interchange = Interchange { offset: 8, length: Some(6) };

    let result = plan_transcode(&mut reader, &interchange, &[40, 80], &[4, 6]);
    std::assert!(matches!(result, Err(TiffError::MissingStartOfScan)));

    // Too short to hold a segment header
    let result = plan_transcode(&mut reader, &interchange, &[80, 40], &[2, 4]);
    std::assert!(matches!(result, Err(TiffError::MissingStartOfScan)));
}

#[test]
fn test_repack_rejects_scan_header_without_length() {
    // A declared segment length below 2 cannot even cover the length field
    let mut reader = source(128, &[(8, &HEADER), (40, &[0xFF, 0xDA, 0x00, 0x01, 0x00]), (80, &SOS_SEGMENT)]);
    let interchange = Interchange { offset: 8, length: Some(6) };

    let result = plan_transcode(&mut reader, &interchange, &[40, 80], &[5, 6]);
    std::assert!(matches!(result, Err(TiffError::MissingStartOfScan)));
}

#[test]
fn test_repack_rejects_ranges_beyond_stream() {
    let mut reader = source(64, &[(8, &HEADER), (32, &SOS_SEGMENT), (48, &[0x11, 0x22])]);

    // A corrupt header length is refused before any buffer is allocated
    let interchange = Interchange { offset: 8, length: Some(0xFFFF_FFF0) };
    let result = plan_transcode(&mut reader, &interchange, &[32, 48], &[6, 2]);
    std::assert!(matches!(result, Err(TiffError::GenericError(_))));

    let interchange = Interchange { offset: 8, length: Some(6) };
    let result = plan_transcode(&mut reader, &interchange, &[32, 48], &[6, 0xFFFF_0000]);
    std::assert!(matches!(result, Err(TiffError::GenericError(_))));
}

#[test]
fn test_missing_length_is_unsupported() {
    let mut reader = source(64, &[(8, &HEADER), (32, &SOS_SEGMENT)]);
    let interchange = Interchange { offset: 8, length: None };

    let result = plan_transcode(&mut reader, &interchange, &[32], &[6]);
    std::assert!(matches!(result, Err(TiffError::UnsupportedLegacyJpeg(_))));
}

#[test]
fn test_no_strips_is_unsupported() {
    let mut reader = source(64, &[(8, &HEADER)]);
    let interchange = Interchange { offset: 8, length: Some(6) };

    let result = plan_transcode(&mut reader, &interchange, &[], &[]);
    std::assert!(matches!(result, Err(TiffError::UnsupportedLegacyJpeg(_))));
}
