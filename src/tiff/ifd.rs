//! Image File Directory (IFD) structures and methods
//!
//! This module implements the directory model the page rewriter works on.
//! An IFD is an ordered collection of tag entries; each tag describes one
//! aspect of a page. Directories are treated as immutable snapshots: rewriting
//! a page builds a new entry list rather than editing one in place.

use std::collections::HashMap;
use std::fmt;
use crate::tiff::constants::{field_types, tags};
use crate::tiff::values::TagValue;
use log::{debug, trace};
use crate::utils::tag_utils;

/// Represents an Image File Directory (IFD) in a TIFF file
///
/// An IFD contains metadata about an image, stored as a series of tag entries.
/// TIFF files can contain multiple IFDs, each describing a separate page in
/// a multipage TIFF.
#[derive(Debug, Clone, PartialEq)]
pub struct IFD {
    /// Entries in this IFD
    entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    /// Tag to entry index lookup
    tag_map: HashMap<u16, usize>,
}

/// Represents an entry in an Image File Directory (IFD)
///
/// Each entry describes one aspect of the image (dimensions, color space,
/// compression, etc.) using a tag-value pair. Values are held decoded, so
/// entries can be written to any position and byte order.
#[derive(Debug, Clone, PartialEq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Decoded value
    pub value: TagValue,
}

impl IFDEntry {
    /// Creates a new IFD entry with an explicit field type
    pub fn new(tag: u16, field_type: u16, value: TagValue) -> Self {
        trace!("Creating IFD entry: tag={} ({}), type={} ({}), count={}",
               tag, tag_utils::get_tag_name(tag), field_type,
               tag_utils::get_field_type_name(field_type), value.count());

        Self {
            tag,
            field_type,
            value,
        }
    }

    /// Creates a SHORT entry
    pub fn short(tag: u16, values: Vec<u16>) -> Self {
        Self::new(tag, field_types::SHORT, TagValue::Short(values))
    }

    /// Creates a LONG entry
    pub fn long(tag: u16, values: Vec<u32>) -> Self {
        Self::new(tag, field_types::LONG, TagValue::Long(values))
    }

    /// Creates an UNDEFINED entry holding raw bytes
    pub fn undefined(tag: u16, bytes: Vec<u8>) -> Self {
        Self::new(tag, field_types::UNDEFINED, TagValue::Undefined(bytes))
    }

    /// Number of values in this entry
    pub fn count(&self) -> usize {
        self.value.count()
    }

    /// Returns true if the entry holds nested directories
    pub fn is_sub_directory(&self) -> bool {
        matches!(self.value, TagValue::Ifd(_))
    }

    /// Returns a human-readable description of this entry
    ///
    /// This is useful for debugging and logging purposes.
    pub fn description(&self) -> String {
        let tag_name = tag_utils::get_tag_name(self.tag);
        let field_type_name = tag_utils::get_field_type_name(self.field_type);

        // Special handling for common tags to provide more meaningful output
        let value_display = match (self.tag, self.value.first_u64()) {
            (tags::COMPRESSION, Some(code)) => format!("{} ({})",
                                                     code,
                                                     tag_utils::get_compression_name(code)),

            (tags::PHOTOMETRIC_INTERPRETATION, Some(code)) => format!("{} ({})",
                                                                    code,
                                                                    tag_utils::get_photometric_name(code)),

            _ => self.value.summary()
        };

        format!("Tag: {} ({}), Type: {} ({}), Count: {}, Value: {}",
                self.tag, tag_name, self.field_type, field_type_name, self.count(), value_display)
    }
}

impl IFD {
    /// Creates a new, empty IFD
    ///
    /// Initializes an empty Image File Directory with the specified
    /// number (index) and file offset.
    pub fn new(number: usize, offset: u64) -> Self {
        debug!("Creating new IFD #{} at offset {}", number, offset);

        Self {
            entries: Vec::new(),
            number,
            offset,
            tag_map: HashMap::new(),
        }
    }

    /// Builds an IFD snapshot from a list of entries
    ///
    /// Later entries replace earlier ones with the same tag.
    pub fn from_entries(number: usize, entries: Vec<IFDEntry>) -> Self {
        let mut ifd = IFD::new(number, 0);
        for entry in entries {
            ifd.add_entry(entry);
        }
        ifd
    }

    /// Adds an entry to this IFD
    ///
    /// Tag ids are unique within a directory: an entry with a tag that is
    /// already present replaces the earlier one in place.
    pub fn add_entry(&mut self, entry: IFDEntry) {
        trace!("Adding entry to IFD #{}: {}", self.number, entry.description());

        match self.tag_map.get(&entry.tag) {
            Some(&index) => self.entries[index] = entry,
            None => {
                self.tag_map.insert(entry.tag, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Gets the first value of a tag as an unsigned number
    ///
    /// This is a convenience method for quickly retrieving scalar tags
    /// such as compression or orientation.
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        let value = self.get_entry(tag).and_then(|entry| entry.value.first_u64());

        if let Some(val) = value {
            trace!("Found tag {} ({}) in IFD #{}: value={}", tag, tag_utils::get_tag_name(tag), self.number, val);
        }

        value
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    /// Gets an IFD entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).map(|&index| &self.entries[index])
    }

    /// Gets the dimensions of the image described by this IFD
    pub fn get_dimensions(&self) -> Option<(u64, u64)> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Gets all entries for this IFD, in insertion order
    pub fn get_entries(&self) -> &[IFDEntry] {
        &self.entries
    }

    /// Gets the number of entries in this IFD
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        writeln!(f, "  Number of entries: {}", self.entries.len())?;

        if let Some((width, height)) = self.get_dimensions() {
            writeln!(f, "  Dimensions: {}x{}", width, height)?;
        }

        writeln!(f, "  Tags:")?;
        for entry in &self.entries {
            writeln!(f, "    {}", entry.description())?;

            if let TagValue::Ifd(children) = &entry.value {
                for child in children {
                    for line in child.to_string().lines() {
                        writeln!(f, "      {}", line)?;
                    }
                }
            }
        }

        Ok(())
    }
}
