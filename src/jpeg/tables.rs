//! Old-style JPEG table merging
//!
//! Old-style pages reference each quantization and Huffman table by file
//! offset (tags 519, 520 and 521). New-style pages carry all tables in one
//! abbreviated JPEG stream under `JPEGTables` (347). The merged stream is
//! SOI, one DQT segment per quantization table, one DHT segment per DC and
//! AC table, then EOI.

use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
use std::io::SeekFrom;

use crate::io::seekable::{read_range, SeekableReader};
use crate::tiff::constants::jpeg_markers;
use crate::tiff::errors::{TiffError, TiffResult};

/// Builds a `JPEGTables` blob from old-style table offsets
///
/// Any of the three offset lists may be empty. Table ids are the position
/// of the offset in its list; AC tables additionally carry the class bit.
pub fn merge_tables(
    reader: &mut dyn SeekableReader,
    q_tables: &[u64],
    dc_tables: &[u64],
    ac_tables: &[u64],
) -> TiffResult<Vec<u8>> {
    let mut blob = Vec::new();
    blob.write_u16::<BigEndian>(jpeg_markers::SOI)?;

    for (index, &offset) in q_tables.iter().enumerate() {
        let table = read_range(reader, offset, jpeg_markers::QUANT_TABLE_SIZE as u64)?;

        blob.write_u16::<BigEndian>(jpeg_markers::DQT)?;
        blob.write_u16::<BigEndian>(3 + jpeg_markers::QUANT_TABLE_SIZE as u16)?;
        blob.write_u8(table_id(index)?)?;
        blob.extend_from_slice(&table);
    }

    // DC and AC tables share the DHT marker, the class lives in the id
    for (index, &offset) in dc_tables.iter().enumerate() {
        write_huffman_segment(reader, &mut blob, offset, table_id(index)?)?;
    }

    for (index, &offset) in ac_tables.iter().enumerate() {
        write_huffman_segment(reader, &mut blob, offset, jpeg_markers::AC_TABLE_CLASS | table_id(index)?)?;
    }

    blob.write_u16::<BigEndian>(jpeg_markers::EOI)?;

    debug!("Merged {} quantization, {} DC and {} AC tables into {} bytes of JPEGTables",
           q_tables.len(), dc_tables.len(), ac_tables.len(), blob.len());
    Ok(blob)
}

/// Reads a Huffman table at the reader's current position
///
/// The table is 16 code-length counts followed by as many symbol bytes as
/// the counts add up to. Both parts are returned together.
pub fn read_huffman_table(reader: &mut dyn SeekableReader) -> TiffResult<Vec<u8>> {
    let mut table = vec![0u8; jpeg_markers::HUFFMAN_COUNTS_SIZE];
    reader.read_exact(&mut table)?;

    let symbol_count: usize = table.iter().map(|&count| count as usize).sum();
    let mut symbols = vec![0u8; symbol_count];
    reader.read_exact(&mut symbols)?;

    table.extend_from_slice(&symbols);
    Ok(table)
}

fn write_huffman_segment(
    reader: &mut dyn SeekableReader,
    blob: &mut Vec<u8>,
    offset: u64,
    table_id: u8,
) -> TiffResult<()> {
    reader.seek(SeekFrom::Start(offset))?;
    let table = read_huffman_table(reader)?;

    blob.write_u16::<BigEndian>(jpeg_markers::DHT)?;
    // At most 16 + 16 * 255 bytes, always fits
    blob.write_u16::<BigEndian>(3 + table.len() as u16)?;
    blob.write_u8(table_id)?;
    blob.extend_from_slice(&table);
    Ok(())
}

/// Table ids are four bits wide
fn table_id(index: usize) -> TiffResult<u8> {
    if index >= 16 {
        return Err(TiffError::UnsupportedLegacyJpeg(format!("too many tables: table index {}", index)));
    }
    Ok(index as u8)
}
