//! TIFF writing utilities
//!
//! Helper functions for laying out directories and values in an output
//! stream: word alignment and tag ordering.

use crate::io::seekable::SeekableWriter;
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFDEntry;
use std::collections::HashSet;

/// Calculate padding required to align to 4-byte boundary
///
/// Directories and out-of-line values start on word boundaries.
pub fn calculate_padding(position: u64) -> u64 {
    (4 - (position % 4)) % 4
}

/// Pads the stream with zero bytes up to the next word boundary
///
/// Returns the aligned position, which is where the next write lands.
pub fn pad_to_word_boundary(writer: &mut dyn SeekableWriter) -> TiffResult<u64> {
    let position = writer.stream_position()?;
    let padding = calculate_padding(position);
    if padding > 0 {
        writer.write_all(&vec![0u8; padding as usize])?;
    }
    Ok(position + padding)
}

/// Get a list of IFD entries sorted by tag number with duplicates removed
///
/// Directory records must be sorted by tag with each tag appearing once.
/// If multiple entries have the same tag ID, only the last occurrence is kept.
pub fn get_unique_sorted_entries(entries: &[IFDEntry]) -> Vec<IFDEntry> {
    let mut seen_tags = HashSet::new();

    // Walk backwards so the last occurrence of each tag wins
    let mut unique_entries: Vec<IFDEntry> = entries.iter()
        .rev()
        .filter(|entry| seen_tags.insert(entry.tag))
        .cloned()
        .collect();

    // Stable sort keeps equal tags (there are none left) in place
    unique_entries.sort_by_key(|entry| entry.tag);
    unique_entries
}
