//! Merge command
//!
//! Writes all pages of several TIFF files, in argument order, into one
//! new multi-page file.

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{finish_progress, required_arg, write_options};
use crate::config::Config;
use crate::pages::operations;
use crate::pages::WriteOptions;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::logger::Logger;

/// Command for merging TIFF files
pub struct MergeCommand<'a> {
    /// Paths of the input files, in page order
    input_files: Vec<String>,
    /// Path of the merged file
    output_file: String,
    options: WriteOptions,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> MergeCommand<'a> {
    /// Create a new merge command
    ///
    /// # Arguments
    /// * `args` - Matches of the `merge` subcommand
    /// * `logger` - Logger for recording operations
    /// * `config` - Loaded configuration
    pub fn new(args: &ArgMatches, logger: &'a Logger, config: &Config) -> TiffResult<Self> {
        let input_files: Vec<String> = args.get_many::<String>("input")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        if input_files.is_empty() {
            return Err(TiffError::GenericError("Missing input files".to_string()));
        }

        let output_file = required_arg(args, "output", "output file")?;

        // Page count is only known once each input is parsed
        let options = write_options(config, 0, "Merging");

        Ok(MergeCommand {
            input_files,
            output_file,
            options,
            logger,
        })
    }
}

impl<'a> Command for MergeCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        info!("Merging {} file(s) into {}", self.input_files.len(), self.output_file);

        operations::merge_files(&self.input_files, &self.output_file, &self.options)?;
        finish_progress(&self.options);

        self.logger.log(&format!("Merged {} into {}", self.input_files.join(", "), self.output_file))?;
        Ok(())
    }
}
