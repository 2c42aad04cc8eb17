/*
 * Logging setup for hosts and the demo binary. The library itself only
 * emits through the `log` facade; installing a logger is left to whoever
 * owns the process.
 */

use crate::error::Result;

use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, ThreadLogMode, WriteLogger,
};
use std::fs::File;
use std::path::Path;

/// Log file written next to the configuration file.
pub const LOG_FILENAME: &str = "soft_input.log";

fn logger_config() -> Config {
    ConfigBuilder::new()
        .set_thread_level(LevelFilter::Error)
        .set_thread_mode(ThreadLogMode::Names)
        .set_target_level(LevelFilter::Off)
        .build()
}

/*
 * Installs a terminal logger at `level`, plus a file logger when `log_file`
 * is given. Fails if the process already has a global logger; callers that
 * may run after another component set one up can ignore that error.
 */
pub fn initialize_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        logger_config(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let file = File::create(path)?;
        loggers.push(WriteLogger::new(level, logger_config(), file));
    }
    CombinedLogger::init(loggers)?;
    log::debug!("Logging: Initialized at level {level} (file: {log_file:?}).");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SoftInputError;
    use tempfile::tempdir;

    #[test]
    fn test_unwritable_log_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join(LOG_FILENAME);

        let err = initialize_logging(LevelFilter::Info, Some(&path)).unwrap_err();
        assert!(matches!(err, SoftInputError::Io(_)), "got {err:?}");
    }
}
