//! Unit tests for the TIFF container model

pub(crate) mod test_utils;

mod reader_tests;
