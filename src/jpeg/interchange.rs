//! Old-style JPEG stream repacking
//!
//! An old-style page may store the start of its JPEG stream (SOI, tables,
//! frame header) once, under `JPEGInterchangeFormat` (513) and
//! `JPEGInterchangeFormatLength` (514), and only scan data in its strips.
//! Depending on where that header sits relative to the strips, it is
//! either already the strip, directly in front of it, or has to be copied
//! in front of every strip.

use log::{debug, info};

use crate::io::seekable::{copy_range, read_range, SeekableReader, SeekableWriter};
use crate::tiff::constants::jpeg_markers;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::validation;

/// Location of the shared JPEG header in the source stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interchange {
    /// Value of `JPEGInterchangeFormat`
    pub offset: u64,
    /// Value of `JPEGInterchangeFormatLength`, if the page has one
    pub length: Option<u64>,
}

/// How the pixel data of an old-style page is rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcode {
    /// The header is the single strip; the strip is copied unchanged
    Identical,
    /// The single strip directly follows the header; both become one strip
    Prepend { header_offset: u64, header_length: u64 },
    /// The header (and the scan header if missing) is copied in front of every strip
    Repack { header: Vec<u8>, start_of_scan: Vec<u8> },
}

/// Strip data written by a transcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodedRanges {
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

/// Returns true if the bytes open with an SOS marker
pub fn starts_with_sos(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && u16::from_be_bytes([bytes[0], bytes[1]]) == jpeg_markers::SOS
}

/// Chooses the transcode strategy for a page
///
/// Only reads from the source: header and scan header bytes needed by a
/// repack are captured here, so a page that cannot be converted is
/// rejected before anything is written.
pub fn plan_transcode(
    reader: &mut dyn SeekableReader,
    interchange: &Interchange,
    offsets: &[u64],
    byte_counts: &[u64],
) -> TiffResult<Transcode> {
    if offsets.is_empty() {
        return Err(TiffError::UnsupportedLegacyJpeg(
            "JPEGInterchangeFormat without strip or tile data".to_string()));
    }

    if offsets.len() == 1 && offsets[0] == interchange.offset {
        debug!("JPEGInterchangeFormat is identical to the strip data");
        return Ok(Transcode::Identical);
    }

    let header_length = interchange.length.ok_or_else(|| TiffError::UnsupportedLegacyJpeg(
        "JPEGInterchangeFormat without JPEGInterchangeFormatLength".to_string()))?;

    if offsets.len() == 1 && interchange.offset.checked_add(header_length) == Some(offsets[0]) {
        debug!("Strip data directly follows JPEGInterchangeFormat, prepending header");
        return Ok(Transcode::Prepend {
            header_offset: interchange.offset,
            header_length,
        });
    }

    // Every strip is copied behind the header, so all of them must exist
    let stream_size = validation::get_file_size(reader)?;
    for (&offset, &byte_count) in offsets.iter().zip(byte_counts) {
        validation::validate_data_range(offset, byte_count, stream_size)?;
    }

    let header = read_range(reader, interchange.offset, header_length)?;
    let start_of_scan = read_start_of_scan(reader, offsets[0], byte_counts[0])?;

    debug!("Repacking {} strips with a {} byte header and a {} byte scan header",
           offsets.len(), header.len(), start_of_scan.len());
    Ok(Transcode::Repack { header, start_of_scan })
}

/// Captures the complete SOS segment that opens the first strip
///
/// The segment is the marker, its two-byte length and the payload the
/// length announces.
fn read_start_of_scan(reader: &mut dyn SeekableReader, offset: u64, byte_count: u64) -> TiffResult<Vec<u8>> {
    if byte_count < 4 {
        return Err(TiffError::MissingStartOfScan);
    }

    let opening = read_range(reader, offset, 4)?;
    if !starts_with_sos(&opening) {
        return Err(TiffError::MissingStartOfScan);
    }

    let declared_length = u16::from_be_bytes([opening[2], opening[3]]) as u64;
    if declared_length < 2 {
        return Err(TiffError::MissingStartOfScan);
    }

    let mut segment = opening;
    let payload = read_range(reader, offset + 4, declared_length - 2)?;
    segment.extend_from_slice(&payload);
    Ok(segment)
}

/// Writes the strip data of a planned transcode at the current position
///
/// Returns None for `Identical`, where the strips are relocated like any
/// other page.
pub fn write_transcoded(
    reader: &mut dyn SeekableReader,
    out: &mut dyn SeekableWriter,
    plan: &Transcode,
    offsets: &[u64],
    byte_counts: &[u64],
) -> TiffResult<Option<TranscodedRanges>> {
    match plan {
        Transcode::Identical => Ok(None),

        Transcode::Prepend { header_offset, header_length } => {
            let position = out.stream_position()?;
            copy_range(reader, out, *header_offset, *header_length)?;
            copy_range(reader, out, offsets[0], byte_counts[0])?;

            info!("Prepended {} byte JPEG header to strip data", header_length);
            Ok(Some(TranscodedRanges {
                offsets: vec![position],
                byte_counts: vec![header_length + byte_counts[0]],
            }))
        },

        Transcode::Repack { header, start_of_scan } => {
            let mut ranges = TranscodedRanges {
                offsets: Vec::with_capacity(offsets.len()),
                byte_counts: Vec::with_capacity(offsets.len()),
            };

            for (&offset, &byte_count) in offsets.iter().zip(byte_counts) {
                // Only the marker is needed, the strip itself is streamed
                let opening = read_range(reader, offset, byte_count.min(2))?;
                let mut written = header.len() as u64 + byte_count;

                ranges.offsets.push(out.stream_position()?);
                out.write_all(header)?;
                if !starts_with_sos(&opening) {
                    out.write_all(start_of_scan)?;
                    written += start_of_scan.len() as u64;
                }
                copy_range(reader, out, offset, byte_count)?;

                ranges.byte_counts.push(written);
            }

            info!("Repacked {} old-style JPEG strips", offsets.len());
            Ok(Some(ranges))
        },
    }
}
