//! Typed tag values
//!
//! Entry values are decoded into native numbers when a directory is parsed,
//! so a page read from a big-endian file can be written into a little-endian
//! container without reinterpreting bytes.

use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::field_types;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;

/// The value of a directory entry
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Byte(Vec<u8>),
    Ascii(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    /// Nested directories (SubIFDs, Exif, GPS, ...)
    Ifd(Vec<IFD>),
}

/// Size in bytes of a single value of the given field type
///
/// Returns None for field types this crate does not know how to relocate.
pub fn element_size(field_type: u16) -> Option<usize> {
    match field_type {
        field_types::BYTE | field_types::ASCII | field_types::SBYTE | field_types::UNDEFINED => Some(1),
        field_types::SHORT | field_types::SSHORT => Some(2),
        field_types::LONG | field_types::SLONG | field_types::FLOAT | field_types::IFD => Some(4),
        field_types::RATIONAL | field_types::SRATIONAL | field_types::DOUBLE => Some(8),
        _ => None,
    }
}

impl TagValue {
    /// Reads `count` values of `field_type` from the reader's current position
    ///
    /// IFD-typed values come back as `Long` offsets; the directory reader
    /// resolves them into nested directories.
    pub fn read(
        field_type: u16,
        count: usize,
        reader: &mut dyn SeekableReader,
        handler: &dyn ByteOrderHandler,
    ) -> TiffResult<TagValue> {
        let value = match field_type {
            field_types::BYTE => TagValue::Byte(read_bytes(reader, count)?),
            field_types::ASCII => TagValue::Ascii(read_bytes(reader, count)?),
            field_types::UNDEFINED => TagValue::Undefined(read_bytes(reader, count)?),
            field_types::SBYTE => TagValue::SByte(
                read_bytes(reader, count)?.into_iter().map(|b| b as i8).collect()),
            field_types::SHORT => TagValue::Short(
                (0..count).map(|_| handler.read_u16(reader)).collect::<Result<_, _>>()?),
            field_types::SSHORT => TagValue::SShort(
                (0..count).map(|_| handler.read_u16(reader).map(|v| v as i16)).collect::<Result<_, _>>()?),
            field_types::LONG | field_types::IFD => TagValue::Long(
                (0..count).map(|_| handler.read_u32(reader)).collect::<Result<_, _>>()?),
            field_types::SLONG => TagValue::SLong(
                (0..count).map(|_| handler.read_u32(reader).map(|v| v as i32)).collect::<Result<_, _>>()?),
            field_types::RATIONAL => TagValue::Rational(
                (0..count).map(|_| handler.read_rational(reader)).collect::<Result<_, _>>()?),
            field_types::SRATIONAL => TagValue::SRational(
                (0..count).map(|_| handler.read_srational(reader)).collect::<Result<_, _>>()?),
            field_types::FLOAT => TagValue::Float(
                (0..count).map(|_| handler.read_f32(reader)).collect::<Result<_, _>>()?),
            field_types::DOUBLE => TagValue::Double(
                (0..count).map(|_| handler.read_f64(reader)).collect::<Result<_, _>>()?),
            _ => return Err(TiffError::UnsupportedFieldType(field_type)),
        };

        Ok(value)
    }

    /// Number of values held
    pub fn count(&self) -> usize {
        match self {
            TagValue::Byte(v) | TagValue::Ascii(v) | TagValue::Undefined(v) => v.len(),
            TagValue::Short(v) => v.len(),
            TagValue::Long(v) => v.len(),
            TagValue::Rational(v) => v.len(),
            TagValue::SByte(v) => v.len(),
            TagValue::SShort(v) => v.len(),
            TagValue::SLong(v) => v.len(),
            TagValue::SRational(v) => v.len(),
            TagValue::Float(v) => v.len(),
            TagValue::Double(v) => v.len(),
            TagValue::Ifd(v) => v.len(),
        }
    }

    /// The field type this value is written as when no other type is given
    pub fn natural_field_type(&self) -> u16 {
        match self {
            TagValue::Byte(_) => field_types::BYTE,
            TagValue::Ascii(_) => field_types::ASCII,
            TagValue::Short(_) => field_types::SHORT,
            TagValue::Long(_) => field_types::LONG,
            TagValue::Rational(_) => field_types::RATIONAL,
            TagValue::SByte(_) => field_types::SBYTE,
            TagValue::Undefined(_) => field_types::UNDEFINED,
            TagValue::SShort(_) => field_types::SSHORT,
            TagValue::SLong(_) => field_types::SLONG,
            TagValue::SRational(_) => field_types::SRATIONAL,
            TagValue::Float(_) => field_types::FLOAT,
            TagValue::Double(_) => field_types::DOUBLE,
            TagValue::Ifd(_) => field_types::IFD,
        }
    }

    /// Normalizes an offset or byte-count value into a fixed-width sequence
    ///
    /// Only unsigned integer arrays are accepted; any other value type is an
    /// unsupported source for byte ranges.
    pub fn to_u64_vec(&self, tag: u16) -> TiffResult<Vec<u64>> {
        match self {
            TagValue::Byte(v) => Ok(v.iter().map(|&x| x as u64).collect()),
            TagValue::Short(v) => Ok(v.iter().map(|&x| x as u64).collect()),
            TagValue::Long(v) => Ok(v.iter().map(|&x| x as u64).collect()),
            other => Err(TiffError::UnsupportedValueType {
                tag,
                field_type: other.natural_field_type(),
            }),
        }
    }

    /// First value as an unsigned number, if the value is numeric
    pub fn first_u64(&self) -> Option<u64> {
        match self {
            TagValue::Byte(v) => v.first().map(|&x| x as u64),
            TagValue::Short(v) => v.first().map(|&x| x as u64),
            TagValue::Long(v) => v.first().map(|&x| x as u64),
            TagValue::SByte(v) => v.first().map(|&x| x as u64),
            TagValue::SShort(v) => v.first().map(|&x| x as u64),
            TagValue::SLong(v) => v.first().map(|&x| x as u64),
            _ => None,
        }
    }

    /// Encodes the value in the given byte order
    ///
    /// Nested directories have no byte form of their own; the directory
    /// writer lays them out and stores their offsets instead.
    pub fn to_bytes(&self, handler: &dyn ByteOrderHandler) -> TiffResult<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();

        match self {
            TagValue::Byte(v) | TagValue::Ascii(v) | TagValue::Undefined(v) => out.extend_from_slice(v),
            TagValue::SByte(v) => out.extend(v.iter().map(|&b| b as u8)),
            TagValue::Short(v) => for &x in v { handler.write_u16(&mut out, x)? },
            TagValue::SShort(v) => for &x in v { handler.write_u16(&mut out, x as u16)? },
            TagValue::Long(v) => for &x in v { handler.write_u32(&mut out, x)? },
            TagValue::SLong(v) => for &x in v { handler.write_u32(&mut out, x as u32)? },
            TagValue::Rational(v) => for &(n, d) in v {
                handler.write_u32(&mut out, n)?;
                handler.write_u32(&mut out, d)?;
            },
            TagValue::SRational(v) => for &(n, d) in v {
                handler.write_u32(&mut out, n as u32)?;
                handler.write_u32(&mut out, d as u32)?;
            },
            TagValue::Float(v) => for &x in v { handler.write_f32(&mut out, x)? },
            TagValue::Double(v) => for &x in v { handler.write_f64(&mut out, x)? },
            TagValue::Ifd(_) => {
                return Err(TiffError::GenericError(
                    "Nested directories cannot be encoded as plain values".to_string()));
            }
        }

        Ok(out)
    }

    /// Short description used in directory listings
    pub fn summary(&self) -> String {
        match self {
            TagValue::Ascii(v) => {
                let text = String::from_utf8_lossy(v);
                format!("\"{}\"", text.trim_end_matches('\0'))
            },
            TagValue::Ifd(dirs) => format!("<{} sub-IFD(s)>", dirs.len()),
            TagValue::Byte(v) | TagValue::Undefined(v) if v.len() > 8 => format!("<{} bytes>", v.len()),
            other => match other.first_u64() {
                Some(first) if other.count() == 1 => first.to_string(),
                Some(first) => format!("{} ... ({} values)", first, other.count()),
                None => format!("<{} values>", other.count()),
            },
        }
    }
}

fn read_bytes(reader: &mut dyn SeekableReader, count: usize) -> TiffResult<Vec<u8>> {
    let mut buffer = vec![0u8; count];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}
