//! Split command
//!
//! Writes every page of a TIFF file to its own single-page file.

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{finish_progress, required_arg, write_options};
use crate::config::Config;
use crate::pages::operations;
use crate::pages::WriteOptions;
use crate::tiff::errors::TiffResult;
use crate::utils::logger::Logger;

/// Command for splitting a TIFF file into pages
pub struct SplitCommand<'a> {
    /// Path to the input file
    input_file: String,
    /// Directory receiving one file per page
    output_dir: String,
    /// Digits in the output file names
    name_width: usize,
    options: WriteOptions,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> SplitCommand<'a> {
    /// Create a new split command
    pub fn new(args: &ArgMatches, logger: &'a Logger, config: &Config) -> TiffResult<Self> {
        let input_file = required_arg(args, "input", "input file")?;
        let output_dir = required_arg(args, "dir", "output directory")?;

        let total = if config.progress_enabled {
            operations::count_pages(&input_file)? as u64
        } else {
            0
        };

        Ok(SplitCommand {
            options: write_options(config, total, "Splitting"),
            name_width: config.split_name_width,
            input_file,
            output_dir,
            logger,
        })
    }
}

impl<'a> Command for SplitCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        info!("Splitting {} into {}", self.input_file, self.output_dir);

        let outputs = operations::split_file(&self.input_file, &self.output_dir, self.name_width, &self.options)?;
        finish_progress(&self.options);

        for path in &outputs {
            info!("  {}", path.display());
        }

        self.logger.log(&format!("Split {} into {} file(s)", self.input_file, outputs.len()))?;
        Ok(())
    }
}
