//! A single page of a TIFF container
//!
//! A page is one directory plus a shared handle on the stream it was read
//! from. Writing a page copies its pixel data into the output stream and
//! produces a new directory pointing at the copies. Old-style JPEG pages are
//! converted to compression 7 on the way.
//!
//! Rewriting runs in two phases. Planning reads the source, validates every
//! directory of the page and captures what the conversion needs. Only when
//! the whole page is known to be writable does execution write to the
//! output, so a rejected page leaves the output untouched.

use log::{debug, info, trace};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::io::seekable::{copy_range, SeekableReader, SeekableWriter};
use crate::jpeg::interchange::{self, Interchange, Transcode};
use crate::jpeg::tables;
use crate::pages::orientation::Orientation;
use crate::tiff::constants::{compression, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::reader::MAX_DIRECTORY_DEPTH;
use crate::tiff::validation::to_u32;
use crate::tiff::values::TagValue;
use crate::tiff::writer::TiffWriter;

/// Old-style JPEG entries that do not survive a rewrite
const LEGACY_INTERCHANGE_TAGS: [u16; 2] = [tags::JPEG_INTERCHANGE_FORMAT, tags::JPEG_INTERCHANGE_FORMAT_LENGTH];
const LEGACY_TABLE_TAGS: [u16; 3] = [tags::JPEG_Q_TABLES, tags::JPEG_DC_TABLES, tags::JPEG_AC_TABLES];

/// Which pair of tags holds a page's pixel data ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFamily {
    Strips,
    Tiles,
}

impl RangeFamily {
    pub fn offsets_tag(self) -> u16 {
        match self {
            RangeFamily::Strips => tags::STRIP_OFFSETS,
            RangeFamily::Tiles => tags::TILE_OFFSETS,
        }
    }

    pub fn byte_counts_tag(self) -> u16 {
        match self {
            RangeFamily::Strips => tags::STRIP_BYTE_COUNTS,
            RangeFamily::Tiles => tags::TILE_BYTE_COUNTS,
        }
    }
}

/// Parallel offset and byte count arrays of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRanges {
    pub family: RangeFamily,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

impl ByteRanges {
    /// Finds the byte ranges of a directory
    ///
    /// Strips are preferred; tiles are used only when a strip pair is not
    /// present. Both tags of a pair are required.
    pub fn locate(ifd: &IFD) -> TiffResult<Option<ByteRanges>> {
        for family in [RangeFamily::Strips, RangeFamily::Tiles] {
            let (offsets, byte_counts) = match (ifd.get_entry(family.offsets_tag()), ifd.get_entry(family.byte_counts_tag())) {
                (Some(offsets), Some(byte_counts)) => (offsets, byte_counts),
                _ => continue,
            };

            let offsets = offsets.value.to_u64_vec(family.offsets_tag())?;
            let byte_counts = byte_counts.value.to_u64_vec(family.byte_counts_tag())?;
            if offsets.len() != byte_counts.len() {
                return Err(TiffError::MismatchedByteRanges {
                    offsets: offsets.len(),
                    byte_counts: byte_counts.len(),
                });
            }

            return Ok(Some(ByteRanges { family, offsets, byte_counts }));
        }

        Ok(None)
    }
}

/// Everything needed to write one directory, gathered without writing
struct DirectoryPlan {
    source: IFD,
    children: HashMap<u16, Vec<DirectoryPlan>>,
    ranges: Option<ByteRanges>,
    transcode: Option<Transcode>,
    jpeg_tables: Option<Vec<u8>>,
}

/// One page of a TIFF container
pub struct Page<'a, R: SeekableReader> {
    ifd: IFD,
    source: &'a RefCell<R>,
}

impl<'a, R: SeekableReader> Page<'a, R> {
    /// Wraps a directory read from `source`
    pub fn new(ifd: IFD, source: &'a RefCell<R>) -> Self {
        Page { ifd, source }
    }

    /// The current directory of this page
    pub fn ifd(&self) -> &IFD {
        &self.ifd
    }

    /// The page's orientation, TopLeft when the tag is absent
    pub fn orientation(&self) -> TiffResult<Orientation> {
        match self.ifd.get_tag_value(tags::ORIENTATION) {
            Some(code) => Orientation::from_code(code),
            None => Ok(Orientation::default()),
        }
    }

    /// Rotates the page clockwise by 90, 180 or 270 degrees
    ///
    /// Only the Orientation tag changes; pixel data is untouched.
    pub fn rotate(&mut self, degree: i32) -> TiffResult<()> {
        let current = self.orientation()?;
        let rotated = current.rotate(degree)?;
        debug!("Rotating page {} by {} degrees: {} -> {}", self.ifd.number, degree, current, rotated);

        let mut entries = self.ifd.get_entries().to_vec();
        entries.push(IFDEntry::short(tags::ORIENTATION, vec![rotated.code()]));

        let mut ifd = IFD::from_entries(self.ifd.number, entries);
        ifd.offset = self.ifd.offset;
        self.ifd = ifd;
        Ok(())
    }

    /// Copies the page's pixel data to `out` and returns the new directory
    ///
    /// The output is left positioned right after the written pixel data.
    /// Nothing is written if the page cannot be converted.
    pub fn rewrite(self, out: &mut dyn SeekableWriter) -> TiffResult<IFD> {
        let mut source = self.source.borrow_mut();
        let reader: &mut dyn SeekableReader = &mut *source;

        let plan = plan_directory(&self.ifd, reader, 0)?;
        execute_plan(plan, reader, out)
    }

    /// Rewrites the page and writes its directory
    ///
    /// Returns the offset of the directory. The next-directory pointer is
    /// left to the caller.
    pub fn write(self, out: &mut dyn SeekableWriter, writer: &TiffWriter) -> TiffResult<u64> {
        let number = self.ifd.number;
        let ifd = self.rewrite(out)?;
        let offset = writer.write_directory(&ifd, out)?;

        info!("Wrote page {} with {} entries at offset {}", number, ifd.entry_count(), offset);
        Ok(offset)
    }
}

/// Validates a directory and captures what its rewrite needs
fn plan_directory(ifd: &IFD, reader: &mut dyn SeekableReader, depth: usize) -> TiffResult<DirectoryPlan> {
    let mut children = HashMap::new();
    for entry in ifd.get_entries() {
        if let TagValue::Ifd(nested) = &entry.value {
            if depth + 1 > MAX_DIRECTORY_DEPTH {
                return Err(TiffError::DirectoryDepthExceeded(MAX_DIRECTORY_DEPTH));
            }

            let plans = nested.iter()
                .map(|child| plan_directory(child, reader, depth + 1))
                .collect::<TiffResult<Vec<_>>>()?;
            children.insert(entry.tag, plans);
        }
    }

    let ranges = ByteRanges::locate(ifd)?;
    let transcode = plan_interchange(ifd, reader, ranges.as_ref())?;
    let jpeg_tables = plan_tables(ifd, reader)?;

    Ok(DirectoryPlan {
        source: ifd.clone(),
        children,
        ranges,
        transcode,
        jpeg_tables,
    })
}

fn plan_interchange(
    ifd: &IFD,
    reader: &mut dyn SeekableReader,
    ranges: Option<&ByteRanges>,
) -> TiffResult<Option<Transcode>> {
    let format = match ifd.get_entry(tags::JPEG_INTERCHANGE_FORMAT) {
        Some(entry) => entry,
        None if ifd.has_tag(tags::JPEG_INTERCHANGE_FORMAT_LENGTH) => {
            return Err(TiffError::UnsupportedLegacyJpeg(
                "JPEGInterchangeFormatLength without JPEGInterchangeFormat".to_string()));
        },
        None => return Ok(None),
    };

    if ifd.has_tag(tags::JPEG_TABLES) {
        return Err(TiffError::AmbiguousJpegTables(
            "JPEGInterchangeFormat and JPEGTables on the same page".to_string()));
    }

    let offset = format.value.to_u64_vec(tags::JPEG_INTERCHANGE_FORMAT)?
        .first()
        .copied()
        .ok_or_else(|| TiffError::UnsupportedLegacyJpeg("JPEGInterchangeFormat has no value".to_string()))?;

    let length = match ifd.get_entry(tags::JPEG_INTERCHANGE_FORMAT_LENGTH) {
        Some(entry) => Some(entry.value.to_u64_vec(tags::JPEG_INTERCHANGE_FORMAT_LENGTH)?
            .first()
            .copied()
            .ok_or_else(|| TiffError::UnsupportedLegacyJpeg("JPEGInterchangeFormatLength has no value".to_string()))?),
        None => None,
    };

    let ranges = ranges.ok_or_else(|| TiffError::UnsupportedLegacyJpeg(
        "JPEGInterchangeFormat without strip or tile data".to_string()))?;

    let interchange = Interchange { offset, length };
    let plan = interchange::plan_transcode(reader, &interchange, &ranges.offsets, &ranges.byte_counts)?;
    Ok(Some(plan))
}

fn plan_tables(ifd: &IFD, reader: &mut dyn SeekableReader) -> TiffResult<Option<Vec<u8>>> {
    if !LEGACY_TABLE_TAGS.iter().any(|&tag| ifd.has_tag(tag)) {
        return Ok(None);
    }

    if ifd.has_tag(tags::JPEG_TABLES) {
        return Err(TiffError::AmbiguousJpegTables(
            "old-style JPEG tables and JPEGTables on the same page".to_string()));
    }

    let offsets_of = |tag: u16| -> TiffResult<Vec<u64>> {
        match ifd.get_entry(tag) {
            Some(entry) => entry.value.to_u64_vec(tag),
            None => Ok(Vec::new()),
        }
    };

    let blob = tables::merge_tables(
        reader,
        &offsets_of(tags::JPEG_Q_TABLES)?,
        &offsets_of(tags::JPEG_DC_TABLES)?,
        &offsets_of(tags::JPEG_AC_TABLES)?,
    )?;
    Ok(Some(blob))
}

/// Writes the pixel data of a planned directory and builds its new entries
fn execute_plan(
    plan: DirectoryPlan,
    reader: &mut dyn SeekableReader,
    out: &mut dyn SeekableWriter,
) -> TiffResult<IFD> {
    let DirectoryPlan { source, mut children, ranges, transcode, jpeg_tables } = plan;

    let mut entries = Vec::with_capacity(source.entry_count() + 2);
    for entry in source.get_entries() {
        match children.remove(&entry.tag) {
            Some(child_plans) => {
                let rewritten = child_plans.into_iter()
                    .map(|child| execute_plan(child, reader, out))
                    .collect::<TiffResult<Vec<_>>>()?;
                // Source field type is kept: Exif and GPS pointers stay LONG,
                // which is what most readers look for
                entries.push(IFDEntry::new(entry.tag, entry.field_type, TagValue::Ifd(rewritten)));
            },
            None => entries.push(entry.clone()),
        }
    }

    let mut removed: Vec<u16> = Vec::new();
    let mut replacements: Vec<IFDEntry> = Vec::new();

    let mut relocated = false;
    if let (Some(plan), Some(ranges)) = (&transcode, &ranges) {
        removed.extend_from_slice(&LEGACY_INTERCHANGE_TAGS);

        if let Some(written) = interchange::write_transcoded(reader, out, plan, &ranges.offsets, &ranges.byte_counts)? {
            replacements.push(long_entry(ranges.family.offsets_tag(), &written.offsets)?);
            replacements.push(long_entry(ranges.family.byte_counts_tag(), &written.byte_counts)?);
            relocated = true;
        }
    }

    if let (false, Some(ranges)) = (relocated, &ranges) {
        let offsets = relocate_ranges(reader, out, ranges)?;
        replacements.push(long_entry(ranges.family.offsets_tag(), &offsets)?);
    }

    if let Some(blob) = jpeg_tables {
        removed.extend_from_slice(&LEGACY_TABLE_TAGS);
        replacements.push(IFDEntry::undefined(tags::JPEG_TABLES, blob));
    }

    if source.get_tag_value(tags::COMPRESSION) == Some(compression::JPEG_OLD as u64) {
        replacements.push(IFDEntry::short(tags::COMPRESSION, vec![compression::JPEG]));
    }

    entries.retain(|entry| !removed.contains(&entry.tag));
    entries.extend(replacements);

    let mut ifd = IFD::from_entries(source.number, entries);
    ifd.offset = source.offset;

    // Old-style JPEG header entries must never reach the output
    if let Some(&tag) = LEGACY_INTERCHANGE_TAGS.iter().find(|&&tag| ifd.has_tag(tag)) {
        return Err(TiffError::TranscodeInvariant(tag));
    }

    trace!("Rewrote IFD #{} into {} entries", ifd.number, ifd.entry_count());
    Ok(ifd)
}

/// Copies each byte range verbatim and returns the new offsets
fn relocate_ranges(
    reader: &mut dyn SeekableReader,
    out: &mut dyn SeekableWriter,
    ranges: &ByteRanges,
) -> TiffResult<Vec<u64>> {
    let mut offsets = Vec::with_capacity(ranges.offsets.len());
    for (&offset, &byte_count) in ranges.offsets.iter().zip(&ranges.byte_counts) {
        offsets.push(out.stream_position()?);
        copy_range(reader, out, offset, byte_count)?;
    }

    debug!("Relocated {} {:?} byte ranges", offsets.len(), ranges.family);
    Ok(offsets)
}

fn long_entry(tag: u16, values: &[u64]) -> TiffResult<IFDEntry> {
    let values = values.iter()
        .map(|&value| to_u32(value))
        .collect::<TiffResult<Vec<u32>>>()?;
    Ok(IFDEntry::long(tag, values))
}
