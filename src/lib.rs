pub mod io;
pub mod tiff;
pub mod jpeg;
pub mod pages;
pub mod commands;
pub mod config;
pub mod utils;

pub use config::Config;
pub use pages::{
    apply_orientation, get_pages, merge_files, merge_pages, rotate_all_pages, rotate_file, rotate_page, split_file,
    split_pages, write_pages, ContainerWriter, Orientation, Page, WriteOptions,
};
pub use tiff::{TiffError, TiffReader, TiffResult, TiffWriter};
