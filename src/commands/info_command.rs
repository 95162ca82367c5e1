//! Info command
//!
//! Prints the directories of every page, including nested directories,
//! and flags pages that a rewrite would convert from old-style JPEG.

use clap::ArgMatches;
use log::{info, warn};

use crate::commands::command_traits::Command;
use crate::commands::required_arg;
use crate::pages::orientation::Orientation;
use crate::tiff::constants::{compression, tags};
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFD;
use crate::tiff::TiffReader;
use crate::utils::logger::Logger;

/// Command for displaying the structure of a TIFF file
pub struct InfoCommand<'a> {
    /// Path to the input file
    input_file: String,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> InfoCommand<'a> {
    /// Create a new info command
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> TiffResult<Self> {
        let input_file = required_arg(args, "input", "input file")?;

        Ok(InfoCommand {
            input_file,
            logger,
        })
    }

    fn display_page_notes(&self, ifd: &IFD) {
        match ifd.get_tag_value(tags::ORIENTATION).map(Orientation::from_code) {
            Some(Ok(orientation)) => info!("  Orientation: {}", orientation),
            Some(Err(e)) => warn!("  {}", e),
            None => info!("  Orientation: {} (default)", Orientation::default()),
        }

        if ifd.get_tag_value(tags::COMPRESSION) == Some(compression::JPEG_OLD as u64) {
            info!("  Old-style JPEG: will be converted to compression {} when written", compression::JPEG);
        }
    }
}

impl<'a> Command for InfoCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        let tiff = TiffReader::new().load(&self.input_file)?;

        info!("TIFF File: {}", self.input_file);
        info!("  Byte order: {}", tiff.byte_order.name());
        info!("  Number of pages: {}", tiff.ifd_count());

        for ifd in &tiff.ifds {
            info!("{}", ifd);
            self.display_page_notes(ifd);
        }

        self.logger.log(&format!("Listed {} page(s) of {}", tiff.ifd_count(), self.input_file))?;
        Ok(())
    }
}
