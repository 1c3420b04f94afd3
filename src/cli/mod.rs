// FILE: src/cli/mod.rs

mod config;
mod handlers;

pub use config::ConfigFile;

use crate::error::Result;
use crate::ExtractOptions;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON object
    Json,
    /// Indented JSON object
    Pretty,
    /// `NAME=value` lines for shells
    Env,
}

pub struct EnhancedCli {
    config: ConfigFile,
    start_time: Instant,
}

impl Default for EnhancedCli {
    fn default() -> Self {
        Self::new()
    }
}

impl EnhancedCli {
    pub fn new() -> Self {
        Self {
            config: ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        self.setup_logging(matches.get_count("verbose"))?;

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        let result = match matches.subcommand() {
            Some(("extract", sub_matches)) => handlers::handle_extract_command(self, sub_matches),
            Some(("names", sub_matches)) => handlers::handle_names_command(sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        };

        log::debug!("Finished in {}ms", self.start_time.elapsed().as_millis());
        result
    }

    fn build_cli(&self) -> Command {
        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path (.json or .toml)")
                    .global(true)
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .global(true)
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("extract")
                    .about("Resolve the global variables of a stylesheet to JSON")
                    .arg(Arg::new("input").help("Entry point stylesheet").required(true).index(1))
                    .arg(Arg::new("include").short('I').long("include").value_name("DIR").help("Add import search directory").action(ArgAction::Append))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Write the result to FILE instead of stdout"))
                    .arg(Arg::new("format").short('f').long("format").value_parser(clap::value_parser!(OutputFormat)).help("Output format [default: json]"))
                    .arg(Arg::new("extension").long("extension").value_name("EXT").help("Extension appended to imports without one [default: .scss]"))
                    .arg(Arg::new("debug").short('d').long("debug").help("Log the synthetic program and extraction details").action(ArgAction::SetTrue))
                    .arg(Arg::new("watch").short('w').long("watch").help("Watch for stylesheet changes and re-extract").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("names")
                    .about("List the variable names found in a stylesheet without compiling it")
                    .arg(Arg::new("input").help("Stylesheet to scan").required(true).index(1)),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let mut builder = env_logger::Builder::from_default_env();
        let rust_log_set = std::env::var_os("RUST_LOG").is_some();
        if let Some(log_level) = verbosity_filter(verbose_count, rust_log_set) {
            builder.filter_level(log_level);
        }
        builder.format_timestamp_secs().init();
        Ok(())
    }

    pub fn build_extract_options(&self, matches: &clap::ArgMatches) -> Result<ExtractOptions> {
        let mut options = ExtractOptions::default();

        if let Some(include_dirs) = matches.get_many::<String>("include") {
            options.search_roots.extend(include_dirs.map(PathBuf::from));
        }
        if let Some(config_includes) = &self.config.include_directories {
            options.search_roots.extend(config_includes.iter().map(PathBuf::from));
        }

        if let Some(extension) = matches
            .get_one::<String>("extension")
            .or(self.config.default_extension.as_ref())
        {
            options.default_extension = normalize_extension(extension);
        }

        options.debug_mode = matches.get_flag("debug");
        Ok(options)
    }

    /// Explicit `--format`, else the config's `pretty` switch, else compact JSON.
    pub fn output_format(&self, matches: &clap::ArgMatches) -> OutputFormat {
        if let Some(format) = matches.get_one::<OutputFormat>("format") {
            return *format;
        }
        match self.config.pretty {
            Some(true) => OutputFormat::Pretty,
            _ => OutputFormat::Json,
        }
    }

    pub fn output_path(&self, matches: &clap::ArgMatches) -> Option<PathBuf> {
        matches
            .get_one::<String>("output")
            .or(self.config.output.as_ref())
            .map(PathBuf::from)
    }
}

/// Level selected by `-v` repetitions. `RUST_LOG`, when set, takes precedence.
fn verbosity_filter(verbose_count: u8, rust_log_set: bool) -> Option<log::LevelFilter> {
    if rust_log_set {
        return None;
    }
    Some(match verbose_count {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    })
}

fn normalize_extension(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}
