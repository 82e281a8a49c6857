//! ## Sets up logging by reading configuration from environment variables.
//!
//! Environment variables used:
//! - LOG_MODE: "stdout" (default) or "file"
//! - LOG_LEVEL: log level ("trace", "debug", "info", "warn", "error"); default is "info"
//! - LOG_FILE_PATH: when using file mode, the path of the log file (default "logs/relayer.log")

use chrono::{NaiveDate, Utc};
use log::{info, LevelFilter};
use simplelog::{Config, SimpleLogger, WriteLogger};
use std::{
    env,
    fs::{create_dir_all, File},
    path::Path,
};

pub fn setup_logging() {
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    let log_mode = env::var("LOG_MODE").unwrap_or_else(|_| "stdout".to_string());

    if log_mode.eq_ignore_ascii_case("file") {
        let base_path =
            env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/relayer.log".to_string());
        let file_path = rolled_file_path(&base_path, Utc::now().date_naive());

        if let Some(parent) = Path::new(&file_path).parent() {
            create_dir_all(parent).expect("Failed to create log directory");
        }
        let log_file = File::create(&file_path)
            .unwrap_or_else(|e| panic!("Unable to create log file {file_path}: {e}"));

        WriteLogger::init(level, Config::default(), log_file)
            .expect("Failed to initialize file logger");
    } else {
        SimpleLogger::init(level, Config::default()).expect("Failed to initialize simple logger");
    }

    info!("Logging is successfully configured (mode: {log_mode})");
}

/// Appends the UTC date to the configured file name, so each day rolls into
/// its own file.
fn rolled_file_path(base_path: &str, date: NaiveDate) -> String {
    let date_str = date.format("%Y-%m-%d");
    match base_path.strip_suffix(".log") {
        Some(stem) => format!("{stem}-{date_str}.log"),
        None => format!("{base_path}-{date_str}.log"),
    }
}
