use std::process::ExitCode;

use clap::Parser;

use passman::cli::{Cli, VERSION};
use passman::config;
use passman::console::TerminalConsole;
use passman::logging::{LogConfig, init_logging};
use passman::session::{self, SessionOptions};
use passman::SessionError;

/// Exit status when the user aborts secret entry with Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("Version: {}", VERSION);
        return ExitCode::SUCCESS;
    }

    let log_path = cli.log_file.unwrap_or_else(config::default_log_path);
    let log_config = LogConfig::new(log_path).with_level(cli.log_level.into());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let path = match cli.file {
        Some(path) => path,
        None => match config::default_database_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Error: cannot prepare default database location: {:#}", e);
                return ExitCode::from(1);
            }
        },
    };

    let mut options = SessionOptions::new(path);
    if let Some(password) = cli.password {
        options = options.with_password(password);
    }

    let mut console = TerminalConsole::new();
    match session::run(&mut console, options) {
        Ok(outcome) => {
            log::debug!("Session finished: {:?}", outcome);
            ExitCode::from(outcome.exit_code())
        }
        Err(SessionError::Cancelled) => {
            eprintln!();
            log::info!("Session cancelled");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
