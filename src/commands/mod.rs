//! CLI command implementations
//!
//! This module contains implementations of the commands supported by the
//! CLI application using the Command pattern: one subcommand, one struct.

pub mod command_traits;
pub mod info_command;
pub mod merge_command;
pub mod rotate_command;
pub mod split_command;

pub use command_traits::{Command, CommandFactory};
pub use info_command::InfoCommand;
pub use merge_command::MergeCommand;
pub use rotate_command::RotateCommand;
pub use split_command::SplitCommand;

use clap::ArgMatches;
use crate::config::Config;
use crate::pages::WriteOptions;
use crate::utils::logger::Logger;
use crate::utils::progress::ProgressTracker;
use crate::tiff::errors::{TiffError, TiffResult};

/// Factory for creating command instances based on CLI arguments
///
/// This factory examines the subcommand given on the command line and
/// creates the matching command instance for execution.
pub struct TiffspliceCommandFactory {
    config: Config,
}

impl TiffspliceCommandFactory {
    /// Create a new factory instance
    pub fn new(config: Config) -> Self {
        TiffspliceCommandFactory { config }
    }
}

impl<'a> CommandFactory<'a> for TiffspliceCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> TiffResult<Box<dyn Command + 'a>> {
        match args.subcommand() {
            Some(("merge", sub_args)) => Ok(Box::new(MergeCommand::new(sub_args, logger, &self.config)?)),
            Some(("split", sub_args)) => Ok(Box::new(SplitCommand::new(sub_args, logger, &self.config)?)),
            Some(("rotate", sub_args)) => Ok(Box::new(RotateCommand::new(sub_args, logger, &self.config)?)),
            Some(("info", sub_args)) => Ok(Box::new(InfoCommand::new(sub_args, logger)?)),
            Some((name, _)) => Err(TiffError::GenericError(format!("Unknown command: {}", name))),
            None => Err(TiffError::GenericError("No command given, see --help".to_string())),
        }
    }
}

/// Builds write options from the configuration
///
/// `total` is the number of pages expected, if known up front.
pub(crate) fn write_options(config: &Config, total: u64, description: &str) -> WriteOptions {
    let progress = config.progress_enabled.then(|| ProgressTracker::new(total, description));

    WriteOptions {
        byte_order: config.byte_order,
        progress,
    }
}

/// Reads a required string argument
pub(crate) fn required_arg(args: &ArgMatches, name: &str, what: &str) -> TiffResult<String> {
    args.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| TiffError::GenericError(format!("Missing {}", what)))
}

/// Finishes the progress bar, if one is shown
pub(crate) fn finish_progress(options: &WriteOptions) {
    if let Some(progress) = &options.progress {
        progress.finish();
    }
}
