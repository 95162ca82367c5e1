use clap::{value_parser, Arg, ArgAction, Command as ClapCommand};
use std::process;
use log::error;

use tiffsplice::config::Config;
use tiffsplice::utils::logger::Logger;
use tiffsplice::commands::{CommandFactory, TiffspliceCommandFactory};

fn build_cli() -> ClapCommand {
    ClapCommand::new("tiffsplice")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Merge, split and rotate multi-page TIFF files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file overriding the built-in defaults")
                .value_name("FILE")
                .global(true),
        )
        .subcommand(
            ClapCommand::new("merge")
                .about("Merge the pages of several TIFF files into one file")
                .arg(
                    Arg::new("input")
                        .help("Input TIFF files, in page order")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Merged output file")
                        .value_name("FILE")
                        .required(true),
                ),
        )
        .subcommand(
            ClapCommand::new("split")
                .about("Write each page of a TIFF file to its own file")
                .arg(
                    Arg::new("input")
                        .help("Input TIFF file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("dir")
                        .short('d')
                        .long("dir")
                        .help("Output directory")
                        .value_name("DIR")
                        .required(true),
                ),
        )
        .subcommand(
            ClapCommand::new("rotate")
                .about("Rotate pages by rewriting their orientation tag")
                .arg(
                    Arg::new("input")
                        .help("Input TIFF file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output TIFF file")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(
                    Arg::new("degree")
                        .long("degree")
                        .help("Clockwise rotation: 90, 180 or 270")
                        .value_name("DEGREE")
                        .value_parser(value_parser!(i32))
                        .required(true),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .help("Rotate only this page (0-based)")
                        .value_name("N")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            ClapCommand::new("info")
                .about("Show the directories of every page")
                .arg(
                    Arg::new("input")
                        .help("Input TIFF file")
                        .required(true)
                        .index(1),
                ),
        )
}

fn main() {
    let matches = build_cli().get_matches();

    let config = match Config::load(matches.get_one::<String>("config").map(String::as_str)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let verbose = matches.get_flag("verbose");
    if let Err(e) = Logger::init_global_logger(&config.log_file, verbose) {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }

    let command_log = format!("{}.commands", config.log_file);
    let logger = match Logger::new(&command_log) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    let factory = TiffspliceCommandFactory::new(config);

    let command_result = factory.create_command(&matches, &logger);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
