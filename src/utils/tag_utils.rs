//! TIFF tag utilities
//!
//! Human-readable names for tags, field types and codes, used in logs and
//! directory listings.

use crate::tiff::constants::{field_types, tags, compression, photometric};

/// Get the name of a TIFF tag
///
/// Returns a human-readable name for a tag based on its numeric ID.
/// If the tag is not recognized, returns "Unknown".
pub fn get_tag_name(tag: u16) -> &'static str {
    match tag {
        // Basic image structure tags
        tags::NEW_SUBFILE_TYPE => "NewSubfileType",
        tags::IMAGE_WIDTH => "ImageWidth",
        tags::IMAGE_LENGTH => "ImageLength",
        tags::BITS_PER_SAMPLE => "BitsPerSample",
        tags::COMPRESSION => "Compression",
        tags::PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        tags::STRIP_OFFSETS => "StripOffsets",
        tags::ORIENTATION => "Orientation",
        tags::SAMPLES_PER_PIXEL => "SamplesPerPixel",
        tags::ROWS_PER_STRIP => "RowsPerStrip",
        tags::STRIP_BYTE_COUNTS => "StripByteCounts",
        tags::PLANAR_CONFIGURATION => "PlanarConfiguration",
        tags::SOFTWARE => "Software",

        // Tiling tags
        tags::TILE_WIDTH => "TileWidth",
        tags::TILE_LENGTH => "TileLength",
        tags::TILE_OFFSETS => "TileOffsets",
        tags::TILE_BYTE_COUNTS => "TileByteCounts",
        tags::SUB_IFDS => "SubIFDs",

        // JPEG tags
        tags::JPEG_TABLES => "JPEGTables",
        tags::JPEG_PROC => "JPEGProc",
        tags::JPEG_INTERCHANGE_FORMAT => "JPEGInterchangeFormat",
        tags::JPEG_INTERCHANGE_FORMAT_LENGTH => "JPEGInterchangeFormatLength",
        tags::JPEG_RESTART_INTERVAL => "JPEGRestartInterval",
        tags::JPEG_Q_TABLES => "JPEGQTables",
        tags::JPEG_DC_TABLES => "JPEGDCTables",
        tags::JPEG_AC_TABLES => "JPEGACTables",

        // Private directories
        tags::EXIF_IFD => "ExifIFD",
        tags::GPS_IFD => "GPSInfo",
        tags::INTEROP_IFD => "InteroperabilityIFD",

        // Default for unknown tags
        _ => "Unknown",
    }
}

/// Get the name of a TIFF field type
pub fn get_field_type_name(field_type: u16) -> &'static str {
    match field_type {
        field_types::BYTE => "BYTE",
        field_types::ASCII => "ASCII",
        field_types::SHORT => "SHORT",
        field_types::LONG => "LONG",
        field_types::RATIONAL => "RATIONAL",
        field_types::SBYTE => "SBYTE",
        field_types::UNDEFINED => "UNDEFINED",
        field_types::SSHORT => "SSHORT",
        field_types::SLONG => "SLONG",
        field_types::SRATIONAL => "SRATIONAL",
        field_types::FLOAT => "FLOAT",
        field_types::DOUBLE => "DOUBLE",
        field_types::IFD => "IFD",
        _ => "Unknown",
    }
}

/// Get the name of a compression method
pub fn get_compression_name(compression_code: u64) -> &'static str {
    match compression_code as u16 {
        compression::NONE => "None",
        compression::CCITT_RLE => "CCITT RLE",
        compression::CCITT_FAX3 => "CCITT Group 3 Fax",
        compression::CCITT_FAX4 => "CCITT Group 4 Fax",
        compression::LZW => "LZW",
        compression::JPEG_OLD => "Old JPEG",
        compression::JPEG => "JPEG",
        compression::DEFLATE => "Adobe Deflate",
        compression::PACKBITS => "PackBits",
        _ => "Unknown",
    }
}

/// Get the name of a photometric interpretation method
pub fn get_photometric_name(photometric_code: u64) -> &'static str {
    match photometric_code as u16 {
        photometric::WHITE_IS_ZERO => "WhiteIsZero",
        photometric::BLACK_IS_ZERO => "BlackIsZero",
        photometric::RGB => "RGB",
        photometric::PALETTE => "Palette",
        photometric::CMYK => "CMYK",
        photometric::YCBCR => "YCbCr",
        _ => "Unknown",
    }
}
