//! Old-style JPEG conversion
//!
//! Pages compressed with the deprecated TIFF 6.0 JPEG scheme keep their
//! tables and their stream header outside the strips. This module turns
//! those fragments into the self-contained representation used by
//! compression 7: a `JPEGTables` blob and one complete stream per strip.

pub mod interchange;
pub mod tables;

#[cfg(test)]
mod tests;

pub use interchange::{Interchange, Transcode};
pub use tables::merge_tables;
