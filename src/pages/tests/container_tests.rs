//! Tests for the container offset chain

extern crate std;

use std::cell::RefCell;
use std::io::{Cursor, Seek, SeekFrom};

use super::{range_bytes, read_back};
use crate::io::byte_order::ByteOrder;
use crate::pages::container::ContainerWriter;
use crate::pages::operations::{get_pages, merge_pages, write_pages, WriteOptions};
use crate::tiff::errors::TiffError;
use crate::tiff::tests::test_utils::{le_u32, plain_page, walk_chain, FixtureBuilder};
use crate::utils::progress::ProgressTracker;

/// A source with one single-strip page per entry of `strips`
fn source_with_pages(strips: &[&[u8]]) -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let mut pages = Vec::new();
    for strip in strips {
        let offset = builder.blob(strip);
        pages.push(plain_page(vec![offset], vec![strip.len() as u32]));
    }
    for page in pages {
        builder.page(page);
    }
    builder.build()
}

#[test]
fn test_chain_links_every_page() {
    let first = source_with_pages(&[&[1], &[2, 2]]);
    let second = source_with_pages(&[&[3, 3, 3]]);

    let output = merge_pages(
        vec![Cursor::new(first), Cursor::new(second)],
        Cursor::new(Vec::new()),
        &WriteOptions::default(),
    ).unwrap().into_inner();

    let chain = walk_chain(&output);
    std::assert_eq!(chain.len(), 3);

    // K pages: K-1 links between directories and one trailing zero
    let links: Vec<u32> = chain.iter().map(|&(_, pointer)| le_u32(&output, pointer)).collect();
    std::assert_eq!(links.iter().filter(|&&link| link != 0).count(), 2);
    std::assert_eq!(links[2], 0);
    std::assert_eq!(chain[2].1, output.len() - 4);

    let tiff = read_back(&output);
    let strips: Vec<_> = tiff.ifds.iter().map(|ifd| range_bytes(&output, ifd)).collect();
    std::assert_eq!(strips, vec![vec![vec![1]], vec![vec![2, 2]], vec![vec![3, 3, 3]]]);
}

#[test]
fn test_empty_container() {
    let output = merge_pages(Vec::<Cursor<Vec<u8>>>::new(), Cursor::new(Vec::new()), &WriteOptions::default())
        .unwrap()
        .into_inner();
    std::assert_eq!(output, vec![0x49, 0x49, 42, 0, 0, 0, 0, 0]);
}

#[test]
fn test_big_endian_container() {
    let options = WriteOptions { byte_order: ByteOrder::BigEndian, progress: None };
    let output = merge_pages(vec![Cursor::new(source_with_pages(&[&[5, 6]]))], Cursor::new(Vec::new()), &options)
        .unwrap()
        .into_inner();

    std::assert_eq!(&output[0..4], &[0x4D, 0x4D, 0, 42]);
    let tiff = read_back(&output);
    std::assert_eq!(tiff.byte_order, ByteOrder::BigEndian);
    std::assert_eq!(range_bytes(&output, &tiff.ifds[0]), vec![vec![5, 6]]);
}

#[test]
fn test_new_container_must_start_at_zero() {
    let mut output = Cursor::new(vec![0u8; 3]);
    output.seek(SeekFrom::End(0)).unwrap();

    let result = ContainerWriter::new(output, ByteOrder::LittleEndian);
    std::assert!(matches!(result, Err(TiffError::InvalidContainer(_))));
}

#[test]
fn test_append_resumes_chain() {
    let options = WriteOptions::default();

    let first = RefCell::new(Cursor::new(source_with_pages(&[&[1, 1], &[2]])));
    let output = write_pages(Cursor::new(Vec::new()), get_pages(&first).unwrap(), &options).unwrap();

    let second = RefCell::new(Cursor::new(source_with_pages(&[&[3, 3, 3]])));
    let output = write_pages(output, get_pages(&second).unwrap(), &options).unwrap().into_inner();

    std::assert_eq!(walk_chain(&output).len(), 3);
    let tiff = read_back(&output);
    let strips: Vec<_> = tiff.ifds.iter().map(|ifd| range_bytes(&output, ifd)).collect();
    std::assert_eq!(strips, vec![vec![vec![1, 1]], vec![vec![2]], vec![vec![3, 3, 3]]]);
}

#[test]
fn test_append_keeps_existing_byte_order() {
    let big = WriteOptions { byte_order: ByteOrder::BigEndian, progress: None };
    let first = RefCell::new(Cursor::new(source_with_pages(&[&[1]])));
    let output = write_pages(Cursor::new(Vec::new()), get_pages(&first).unwrap(), &big).unwrap();

    let second = RefCell::new(Cursor::new(source_with_pages(&[&[2]])));
    let output = write_pages(output, get_pages(&second).unwrap(), &WriteOptions::default())
        .unwrap()
        .into_inner();

    let tiff = read_back(&output);
    std::assert_eq!(tiff.byte_order, ByteOrder::BigEndian);
    std::assert_eq!(tiff.ifd_count(), 2);
    std::assert_eq!(range_bytes(&output, &tiff.ifds[1]), vec![vec![2]]);
}

#[test]
fn test_append_to_existing_file() {
    let existing = source_with_pages(&[&[8, 8]]);
    let mut container = ContainerWriter::append(Cursor::new(existing)).unwrap();

    let source = RefCell::new(Cursor::new(source_with_pages(&[&[9]])));
    container.write_pages(get_pages(&source).unwrap()).unwrap();
    std::assert_eq!(container.pages_written(), 1);
    let output = container.into_inner().unwrap().into_inner();

    let tiff = read_back(&output);
    std::assert_eq!(tiff.ifd_count(), 2);
    std::assert_eq!(range_bytes(&output, &tiff.ifds[0]), vec![vec![8, 8]]);
    std::assert_eq!(range_bytes(&output, &tiff.ifds[1]), vec![vec![9]]);
}

#[test]
fn test_append_rejects_closed_chain() {
    let mut bytes = source_with_pages(&[&[1]]);
    bytes.extend_from_slice(&[1, 2, 3, 4]);

    let result = ContainerWriter::append(Cursor::new(bytes));
    std::assert!(matches!(result, Err(TiffError::InvalidContainer(_))));

    let result = ContainerWriter::append(Cursor::new(vec![0x49, 0x49, 42]));
    std::assert!(matches!(result, Err(TiffError::InvalidContainer(_))));

    let result = ContainerWriter::append(Cursor::new(b"XXXX\0\0\0\0".to_vec()));
    std::assert!(matches!(result, Err(TiffError::InvalidByteOrder(_))));
}

#[test]
fn test_progress_counts_pages() {
    let progress = ProgressTracker::hidden();
    let options = WriteOptions { byte_order: ByteOrder::LittleEndian, progress: Some(progress.clone()) };

    merge_pages(
        vec![Cursor::new(source_with_pages(&[&[1], &[2]])), Cursor::new(source_with_pages(&[&[3]]))],
        Cursor::new(Vec::new()),
        &options,
    ).unwrap();

    std::assert_eq!(progress.position(), 3);
}
