//! Builders for in-memory TIFF streams used across the unit tests

use std::io::Cursor;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

/// A tag value as it is laid out in a fixture
#[derive(Debug, Clone)]
pub enum FixtureValue {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Undefined(Vec<u8>),
    Ascii(&'static str),
    Rational(Vec<(u32, u32)>),
    /// Raw record with an arbitrary field type and count, value field as given
    Raw { field_type: u16, count: u32, field: [u8; 4] },
    /// A nested directory referenced through a LONG offset
    Ifd(Vec<(u16, FixtureValue)>),
}

/// Lays out a classic TIFF stream: header, data blobs, then directories
pub struct FixtureBuilder {
    buffer: Vec<u8>,
    big_endian: bool,
    pages: Vec<Vec<(u16, FixtureValue)>>,
}

impl FixtureBuilder {
    /// A little-endian stream
    pub fn new() -> Self {
        Self::with_order(false)
    }

    /// A big-endian stream
    pub fn big_endian() -> Self {
        Self::with_order(true)
    }

    fn with_order(big_endian: bool) -> Self {
        let mut builder = FixtureBuilder {
            buffer: Vec::new(),
            big_endian,
            pages: Vec::new(),
        };

        let marker = if big_endian { b"MM" } else { b"II" };
        builder.buffer.extend_from_slice(marker);
        builder.put_u16_at_end(42);
        builder.put_u32_at_end(0);
        builder
    }

    /// Appends raw bytes and returns their offset
    pub fn blob(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.buffer.len() as u32;
        self.buffer.extend_from_slice(bytes);
        offset
    }

    /// Adds a page; entries are written in the given order
    pub fn page(&mut self, entries: Vec<(u16, FixtureValue)>) -> &mut Self {
        self.pages.push(entries);
        self
    }

    /// Writes the directories, chains them and returns the stream bytes
    pub fn build(mut self) -> Vec<u8> {
        let pages = std::mem::take(&mut self.pages);
        let mut pointer = 4usize;

        for entries in &pages {
            let offset = self.write_directory(entries);
            self.patch_u32(pointer, offset);
            pointer = offset as usize + 2 + 12 * entries.len();
        }

        self.buffer
    }

    /// Same as `build`, wrapped in a cursor
    pub fn cursor(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.build())
    }

    fn write_directory(&mut self, entries: &[(u16, FixtureValue)]) -> u32 {
        let mut records = Vec::new();

        for (tag, value) in entries {
            let (field_type, count, bytes) = match value {
                FixtureValue::Short(v) => (3u16, v.len() as u32, self.encode_u16s(v)),
                FixtureValue::Long(v) => (4, v.len() as u32, self.encode_u32s(v)),
                FixtureValue::Undefined(v) => (7, v.len() as u32, v.clone()),
                FixtureValue::Ascii(text) => {
                    let mut bytes = text.as_bytes().to_vec();
                    bytes.push(0);
                    (2, bytes.len() as u32, bytes)
                },
                FixtureValue::Rational(v) => {
                    let flat: Vec<u32> = v.iter().flat_map(|&(n, d)| [n, d]).collect();
                    (5, v.len() as u32, self.encode_u32s(&flat))
                },
                FixtureValue::Raw { field_type, count, field } => (*field_type, *count, field.to_vec()),
                FixtureValue::Ifd(children) => {
                    let child = self.write_directory(children);
                    (4, 1, self.encode_u32s(&[child]))
                },
            };

            let mut field = [0u8; 4];
            if bytes.len() <= 4 {
                field[..bytes.len()].copy_from_slice(&bytes);
            } else {
                self.align();
                let offset = self.blob(&bytes);
                field.copy_from_slice(&self.encode_u32s(&[offset]));
            }
            records.push((*tag, field_type, count, field));
        }

        self.align();
        let offset = self.buffer.len() as u32;
        self.put_u16_at_end(records.len() as u16);
        for (tag, field_type, count, field) in records {
            self.put_u16_at_end(tag);
            self.put_u16_at_end(field_type);
            self.put_u32_at_end(count);
            self.buffer.extend_from_slice(&field);
        }
        self.put_u32_at_end(0);
        offset
    }

    fn align(&mut self) {
        while self.buffer.len() % 4 != 0 {
            self.buffer.push(0);
        }
    }

    fn encode_u16s(&self, values: &[u16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for &v in values {
            if self.big_endian {
                bytes.write_u16::<BigEndian>(v).unwrap();
            } else {
                bytes.write_u16::<LittleEndian>(v).unwrap();
            }
        }
        bytes
    }

    fn encode_u32s(&self, values: &[u32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for &v in values {
            if self.big_endian {
                bytes.write_u32::<BigEndian>(v).unwrap();
            } else {
                bytes.write_u32::<LittleEndian>(v).unwrap();
            }
        }
        bytes
    }

    fn put_u16_at_end(&mut self, value: u16) {
        let bytes = self.encode_u16s(&[value]);
        self.buffer.extend_from_slice(&bytes);
    }

    fn put_u32_at_end(&mut self, value: u32) {
        let bytes = self.encode_u32s(&[value]);
        self.buffer.extend_from_slice(&bytes);
    }

    fn patch_u32(&mut self, position: usize, value: u32) {
        let bytes = self.encode_u32s(&[value]);
        self.buffer[position..position + 4].copy_from_slice(&bytes);
    }
}

/// Reads a little-endian u16 at `position`
pub fn le_u16(bytes: &[u8], position: usize) -> u16 {
    u16::from_le_bytes([bytes[position], bytes[position + 1]])
}

/// Reads a little-endian u32 at `position`
pub fn le_u32(bytes: &[u8], position: usize) -> u32 {
    u32::from_le_bytes([bytes[position], bytes[position + 1], bytes[position + 2], bytes[position + 3]])
}

/// Offsets of every top-level directory of a little-endian stream, in chain order
///
/// Also returns the position of each next-directory pointer.
pub fn walk_chain(bytes: &[u8]) -> Vec<(u32, usize)> {
    let mut chain = Vec::new();
    let mut pointer = 4usize;

    loop {
        let offset = le_u32(bytes, pointer);
        if offset == 0 {
            break;
        }
        let count = le_u16(bytes, offset as usize) as usize;
        let next_pointer = offset as usize + 2 + 12 * count;
        chain.push((offset, next_pointer));
        pointer = next_pointer;
    }

    chain
}

/// A small plain page: 2x2 grey pixels, one strip per given blob
pub fn plain_page(strip_offsets: Vec<u32>, strip_counts: Vec<u32>) -> Vec<(u16, FixtureValue)> {
    vec![
        (256, FixtureValue::Long(vec![2])),
        (257, FixtureValue::Long(vec![2])),
        (258, FixtureValue::Short(vec![8])),
        (259, FixtureValue::Short(vec![1])),
        (262, FixtureValue::Short(vec![1])),
        (273, FixtureValue::Long(strip_offsets)),
        (279, FixtureValue::Long(strip_counts)),
    ]
}
