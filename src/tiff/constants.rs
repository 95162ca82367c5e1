//! TIFF format constants
//!
//! This module defines constants used throughout the TIFF processing code,
//! making the code more readable and maintainable by replacing magic numbers
//! with descriptive names.

/// TIFF header constants
pub mod header {
    /// Standard TIFF version number (42)
    pub const TIFF_VERSION: u16 = 42;

    /// "II" byte order marker for little-endian
    pub const LITTLE_ENDIAN_MARKER: [u8; 2] = [0x49, 0x49];

    /// "MM" byte order marker for big-endian
    pub const BIG_ENDIAN_MARKER: [u8; 2] = [0x4D, 0x4D];

    /// Size of a classic TIFF header (marker, version, first IFD offset)
    pub const HEADER_SIZE: u64 = 8;
}

/// Field types as defined by TIFF 6.0
pub mod field_types {
    pub const BYTE: u16 = 1;       // 8-bit unsigned integer
    pub const ASCII: u16 = 2;      // 8-bit byte containing ASCII character
    pub const SHORT: u16 = 3;      // 16-bit unsigned integer
    pub const LONG: u16 = 4;       // 32-bit unsigned integer
    pub const RATIONAL: u16 = 5;   // Two LONGs: numerator and denominator
    pub const SBYTE: u16 = 6;      // 8-bit signed integer
    pub const UNDEFINED: u16 = 7;  // 8-bit byte with unspecified format
    pub const SSHORT: u16 = 8;     // 16-bit signed integer
    pub const SLONG: u16 = 9;      // 32-bit signed integer
    pub const SRATIONAL: u16 = 10; // Two SLONGs: numerator and denominator
    pub const FLOAT: u16 = 11;     // Single precision IEEE floating point
    pub const DOUBLE: u16 = 12;    // Double precision IEEE floating point
    pub const IFD: u16 = 13;       // 32-bit offset to a nested IFD
}

/// Standard TIFF tags
pub mod tags {
    // Basic image structure tags
    pub const NEW_SUBFILE_TYPE: u16 = 254;         // Subfile data descriptor
    pub const IMAGE_WIDTH: u16 = 256;              // Width of the image in pixels
    pub const IMAGE_LENGTH: u16 = 257;             // Height of the image in pixels
    pub const BITS_PER_SAMPLE: u16 = 258;          // Bits per component
    pub const COMPRESSION: u16 = 259;              // Compression scheme
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262; // Color space of image data
    pub const STRIP_OFFSETS: u16 = 273;            // Offsets to the data strips
    pub const ORIENTATION: u16 = 274;              // Image orientation
    pub const SAMPLES_PER_PIXEL: u16 = 277;        // Number of components per pixel
    pub const ROWS_PER_STRIP: u16 = 278;           // Rows per strip of data
    pub const STRIP_BYTE_COUNTS: u16 = 279;        // Bytes counts for strips
    pub const PLANAR_CONFIGURATION: u16 = 284;     // How components are stored
    pub const SOFTWARE: u16 = 305;                 // Software used to create the image

    pub const TILE_WIDTH: u16 = 322;               // Width of a tile
    pub const TILE_LENGTH: u16 = 323;              // Length of a tile
    pub const TILE_OFFSETS: u16 = 324;             // Offsets to the data tiles
    pub const TILE_BYTE_COUNTS: u16 = 325;         // Byte counts for tiles
    pub const SUB_IFDS: u16 = 330;                 // Offsets to child IFDs

    // New-style JPEG
    pub const JPEG_TABLES: u16 = 347;              // Abbreviated table-specification stream

    // Old-style JPEG (TIFF 6.0 section 22)
    pub const JPEG_PROC: u16 = 512;                        // Baseline or lossless process
    pub const JPEG_INTERCHANGE_FORMAT: u16 = 513;          // Offset to the JPEG SOI
    pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 514;   // Length of the interchange stream
    pub const JPEG_RESTART_INTERVAL: u16 = 515;            // Restart interval
    pub const JPEG_Q_TABLES: u16 = 519;                    // Offsets to 64-byte quantization tables
    pub const JPEG_DC_TABLES: u16 = 520;                   // Offsets to DC Huffman tables
    pub const JPEG_AC_TABLES: u16 = 521;                   // Offsets to AC Huffman tables

    // Nested directories
    pub const EXIF_IFD: u16 = 34665;               // Exif private IFD
    pub const GPS_IFD: u16 = 34853;                // GPS private IFD
    pub const INTEROP_IFD: u16 = 40965;            // Interoperability IFD

    /// Tags whose LONG values point at nested directories
    pub const SUB_DIRECTORY_TAGS: [u16; 4] = [SUB_IFDS, EXIF_IFD, GPS_IFD, INTEROP_IFD];
}

/// Compression types
pub mod compression {
    pub const NONE: u16 = 1;              // No compression
    pub const CCITT_RLE: u16 = 2;         // CCITT modified Huffman RLE
    pub const CCITT_FAX3: u16 = 3;        // CCITT Group 3 fax
    pub const CCITT_FAX4: u16 = 4;        // CCITT Group 4 fax
    pub const LZW: u16 = 5;               // LZW compression
    pub const JPEG_OLD: u16 = 6;          // Old JPEG (deprecated)
    pub const JPEG: u16 = 7;              // JPEG compression
    pub const DEFLATE: u16 = 8;           // Adobe Deflate (zlib)
    pub const PACKBITS: u16 = 32773;      // PackBits compression
}

/// Photometric interpretation values
pub mod photometric {
    pub const WHITE_IS_ZERO: u16 = 0;     // Minimum value is white
    pub const BLACK_IS_ZERO: u16 = 1;     // Minimum value is black
    pub const RGB: u16 = 2;               // RGB color model
    pub const PALETTE: u16 = 3;           // Palette color (color map indexed)
    pub const CMYK: u16 = 5;              // CMYK color model
    pub const YCBCR: u16 = 6;             // YCbCr color model
}

/// Orientation values
pub mod orientation {
    pub const TOP_LEFT: u16 = 1;          // 0th row = top, 0th column = left side
    pub const TOP_RIGHT: u16 = 2;         // 0th row = top, 0th column = right side
    pub const BOTTOM_RIGHT: u16 = 3;      // 0th row = bottom, 0th column = right side
    pub const BOTTOM_LEFT: u16 = 4;       // 0th row = bottom, 0th column = left side
    pub const LEFT_TOP: u16 = 5;          // 0th row = left side, 0th column = top
    pub const RIGHT_TOP: u16 = 6;         // 0th row = right side, 0th column = top
    pub const RIGHT_BOTTOM: u16 = 7;      // 0th row = right side, 0th column = bottom
    pub const LEFT_BOTTOM: u16 = 8;       // 0th row = left side, 0th column = bottom
}

/// JPEG marker codes used when synthesizing table and scan headers
pub mod jpeg_markers {
    pub const SOI: u16 = 0xFFD8;          // Start of image
    pub const EOI: u16 = 0xFFD9;          // End of image
    pub const SOS: u16 = 0xFFDA;          // Start of scan
    pub const DQT: u16 = 0xFFDB;          // Define quantization table
    pub const DHT: u16 = 0xFFC4;          // Define Huffman table

    /// Size of one quantization table in the old-style encoding
    pub const QUANT_TABLE_SIZE: usize = 64;
    /// Number of code-length counts that open a Huffman table
    pub const HUFFMAN_COUNTS_SIZE: usize = 16;
    /// Table class bit marking an AC Huffman table
    pub const AC_TABLE_CLASS: u8 = 0x10;
}
