use std::fmt::Display;

use clap::{App, Arg, ArgMatches};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use crate::project::Config;

// Exit Codes for different types of errors
pub const ERR_CONFIG: i32 = 1;
pub const ERR_IO: i32 = 2;
pub const ERR_EXPAND: i32 = 3;
pub const ERR_PARSE: i32 = 4;
pub const ERR_CODEGEN: i32 = 5;
pub const ERR_EMULATOR: i32 = 6;
pub const ERR_EXPORT: i32 = 7;

/// The stage after which the toolchain stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Expand,
    Parse,
    Generate,
}

pub fn print_errs<E: Display>(errs: &[E]) {
    for e in errs {
        println!("{}", e);
    }
}

pub fn configure_cli() -> clap::App<'static, 'static> {
    App::new("Serpent Assembler")
        .version("0.1.0")
        .about("Assembles structured .sasm programs into a snake shaped grid of command cells, or runs them in an emulator")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .required(true)
                .help("Source file to assemble. Files ending in .asm are primitive and skip expansion"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("File the JSON grid export is written to"),
        )
        .arg(
            Arg::with_name("emit-asm")
                .long("emit-asm")
                .takes_value(true)
                .help("Write the expanded primitive program to this file"),
        )
        .arg(
            Arg::with_name("emulate")
                .long("emulate")
                .help("Run the program in the emulator instead of generating a grid"),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .help("YAML configuration file. Flags override its values"),
        )
        .arg(
            Arg::with_name("registers")
                .short("r")
                .long("registers")
                .takes_value(true)
                .help("Number of registers"),
        )
        .arg(
            Arg::with_name("width")
                .short("w")
                .long("width")
                .takes_value(true)
                .help("Cells per grid row, including the two turn marker columns"),
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .possible_values(&["error", "warn", "info", "debug", "trace"])
                .takes_value(true)
                .help("Print log messages at or above this level to stderr"),
        )
        .arg(
            Arg::with_name("stage")
                .long("stage")
                .possible_values(&["expand", "parse", "generate"])
                .takes_value(true)
                .help("Stop after the given stage"),
        )
}

pub fn get_log_level(args: &ArgMatches) -> Option<LevelFilter> {
    let level = match args.value_of("log-level")? {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => return None,
    };
    Some(level)
}

pub fn configure_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Debug)
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

pub fn get_stage(args: &ArgMatches) -> Option<Stage> {
    match args.value_of("stage")? {
        "expand" => Some(Stage::Expand),
        "parse" => Some(Stage::Parse),
        "generate" => Some(Stage::Generate),
        _ => None,
    }
}

/// Build the configuration from the `--config` file, if any, then apply the
/// flags which override it.
pub fn read_config(args: &ArgMatches) -> Result<Config, String> {
    let mut config = match args.value_of("config") {
        Some(path) => {
            let mut file =
                std::fs::File::open(path).map_err(|e| format!("Could not open {}: {}", path, e))?;
            Config::read(&mut file).map_err(|e| format!("Invalid config {}: {}", path, e))?
        }
        None => Config::default(),
    };

    if let Some(registers) = parse_flag(args, "registers")? {
        config.registers = registers;
    }
    if let Some(width) = parse_flag(args, "width")? {
        config.row_width = width;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn parse_flag(args: &ArgMatches, name: &str) -> Result<Option<usize>, String> {
    match args.value_of(name) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| format!("--{} expects a number but got {}", name, v)),
        None => Ok(None),
    }
}
