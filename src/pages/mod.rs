//! Page rewriting
//!
//! Pages read from one container are written into another: pixel data is
//! relocated, old-style JPEG is converted and the directory chain is
//! rebuilt. Rotation is applied through the Orientation tag only.

pub mod container;
pub mod operations;
pub mod orientation;
pub mod page;

#[cfg(test)]
mod tests;

pub use container::ContainerWriter;
pub use operations::{
    get_pages, merge_files, merge_pages, rotate_all_pages, rotate_file, rotate_page, split_file, split_pages,
    write_pages, WriteOptions,
};
pub use orientation::{apply_orientation, Orientation};
pub use page::Page;
