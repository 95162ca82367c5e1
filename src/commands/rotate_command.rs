//! Rotate command
//!
//! Rotates all pages, or a single page, of a TIFF file by rewriting the
//! Orientation tag. Pixel data is copied unchanged.

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{finish_progress, required_arg, write_options};
use crate::config::Config;
use crate::pages::operations;
use crate::pages::orientation;
use crate::pages::WriteOptions;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::logger::Logger;

/// Command for rotating pages
pub struct RotateCommand<'a> {
    input_file: String,
    output_file: String,
    /// Clockwise rotation: 90, 180 or 270
    degree: i32,
    /// Page to rotate, all pages if None
    page: Option<usize>,
    options: WriteOptions,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> RotateCommand<'a> {
    /// Create a new rotate command
    ///
    /// The degree is validated here so a bad value fails before any file
    /// is created.
    pub fn new(args: &ArgMatches, logger: &'a Logger, config: &Config) -> TiffResult<Self> {
        let input_file = required_arg(args, "input", "input file")?;
        let output_file = required_arg(args, "output", "output file")?;

        let degree = *args.get_one::<i32>("degree")
            .ok_or_else(|| TiffError::GenericError("Missing rotation degree".to_string()))?;
        orientation::quarter_turns(degree)?;

        let page = args.get_one::<usize>("page").copied();

        let total = if config.progress_enabled {
            operations::count_pages(&input_file)? as u64
        } else {
            0
        };

        Ok(RotateCommand {
            input_file,
            output_file,
            degree,
            page,
            options: write_options(config, total, "Rotating"),
            logger,
        })
    }
}

impl<'a> Command for RotateCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        match self.page {
            Some(page) => info!("Rotating page {} of {} by {} degrees", page, self.input_file, self.degree),
            None => info!("Rotating all pages of {} by {} degrees", self.input_file, self.degree),
        }

        operations::rotate_file(&self.input_file, &self.output_file, self.degree, self.page, &self.options)?;
        finish_progress(&self.options);

        self.logger.log(&format!("Rotated {} by {} degrees into {}", self.input_file, self.degree, self.output_file))?;
        Ok(())
    }
}
