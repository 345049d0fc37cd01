use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "passman")]
#[command(about = "A simple cross platform CLI password manager", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Database file to use
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Database password to use (visible to other local users; prefer the prompt)
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Log file to write to
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Minimum level recorded in the log file
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
