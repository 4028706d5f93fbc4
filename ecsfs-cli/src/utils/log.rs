// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU8, Ordering};

use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Normal as u8);

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn log_level() -> LogLevel {
    match LOG_LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Quiet,
        2 => LogLevel::Verbose,
        _ => LogLevel::Normal,
    }
}

/// Maps `-q` / `-v` occurrences to the console level and the engine's log filter.
pub fn levels_from_flags(quiet: bool, verbose: u8) -> (LogLevel, LevelFilter) {
    match (quiet, verbose) {
        (true, _) => (LogLevel::Quiet, LevelFilter::Error),
        (false, 0) => (LogLevel::Normal, LevelFilter::Warn),
        (false, 1) => (LogLevel::Verbose, LevelFilter::Debug),
        (false, _) => (LogLevel::Verbose, LevelFilter::Trace),
    }
}

/// Engine records go to stderr so `cat` output stays clean.
struct CliLogger;

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => " WARN".yellow().bold(),
            Level::Info => " INFO".blue(),
            Level::Debug => "DEBUG".green(),
            Level::Trace => "TRACE".bright_black(),
        };
        eprintln!("[{level}] {}", record.args());
    }

    fn flush(&self) {}
}

/// Installs the logger once; later calls only adjust the levels.
pub fn init(quiet: bool, verbose: u8) {
    static LOGGER: CliLogger = CliLogger;
    let (level, filter) = levels_from_flags(quiet, verbose);
    set_log_level(level);
    // already installed (tests call this repeatedly)
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(filter);
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if $crate::utils::log_level() != $crate::utils::LogLevel::Quiet {
            println!("[ecsfs] {}", format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_verbose {
    ($($arg:tt)*) => {
        if $crate::utils::log_level() == $crate::utils::LogLevel::Verbose {
            println!("[ecsfs] {}", format_args!($($arg)*));
        }
    };
}
