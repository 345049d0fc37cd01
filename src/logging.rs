//! Logging infrastructure for passman.
//!
//! This module provides structured logging with file output, timestamps,
//! and configurable log levels. Secrets are never passed to the logger.

use anyhow::{Result, anyhow};
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Path to the log file.
    pub path: PathBuf,
    /// Minimum log level to record.
    pub level: LevelFilter,
    /// Maximum log file size in bytes before rotation (0 = no limit).
    pub max_size: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("passman.log"),
            level: LevelFilter::Info,
            max_size: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl LogConfig {
    /// Creates a new LogConfig with the specified path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Sets the log level.
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Sets the maximum log file size.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }
}

/// Initializes the logging system with the given configuration.
///
/// This sets up a combined logger that writes to both:
/// - Log file (at the configured level, with timestamps)
/// - Terminal (warnings and errors on stderr, only when stderr is a terminal)
pub fn init_logging(config: &LogConfig) -> Result<()> {
    if config.level == LevelFilter::Off {
        return Ok(());
    }

    // Ensure the parent directory exists
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if needs_rotation(&config.path, config.max_size) {
        rotate_log(&config.path)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.path)
        .map_err(|e| anyhow!("Failed to open log file: {}", e))?;

    let file_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Debug)
        .build();

    let term_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off) // No timestamps in terminal
        .set_target_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![];
    loggers.push(WriteLogger::new(config.level, file_config, log_file));

    // Interactive prompts share the terminal, so only warnings go there.
    if std::io::stderr().is_terminal() {
        loggers.push(TermLogger::new(
            LevelFilter::Warn,
            term_config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    log::info!("Logging initialized at level {:?}", config.level);
    log::debug!("Log file: {}", config.path.display());

    Ok(())
}

fn needs_rotation(path: &Path, max_size: u64) -> bool {
    max_size > 0
        && std::fs::metadata(path)
            .map(|metadata| metadata.len() > max_size)
            .unwrap_or(false)
}

/// Rotates the log file by renaming it with a timestamp suffix.
fn rotate_log(path: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let rotated_name = format!(
        "{}.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("passman.log"),
        timestamp
    );

    let rotated_path = path.with_file_name(rotated_name);
    std::fs::rename(path, &rotated_path)?;
    Ok(rotated_path)
}

/// Logs a warning, and also prints it on stderr when no installed logger
/// records warnings (logging off, or the log file could not be opened).
pub fn surface_warning(message: &str) {
    log::warn!("{}", message);
    if !warnings_recorded(log::max_level()) {
        eprintln!("Warning: {}", message);
    }
}

fn warnings_recorded(max_level: LevelFilter) -> bool {
    max_level >= LevelFilter::Warn
}

/// Runs `f` and logs how long it took.
pub fn timed<T, F: FnOnce() -> T>(operation: &str, f: F) -> T {
    let start = std::time::Instant::now();
    let result = f();
    let duration = start.elapsed();

    log::debug!("{} completed in {:?}", operation, duration);
    result
}
