use super::error::UtilError;
use log::{error, LevelFilter};
use std::fs::{create_dir_all, File, OpenOptions};
use std::path::Path;

/// Convert a configured level name into a `LevelFilter`. Unknown names fall back to `Warn`
pub(crate) fn log_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Warn,
    }
}

/// Open the log file for appending, creating its parent directory if needed
pub(crate) fn create_log_file(path: &str) -> Result<File, UtilError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = create_dir_all(parent) {
                error!("[gptcore] Failed to create logging directory for {path}. Error: {err:?}");
                return Err(UtilError::LogFile);
            }
        }
    }

    let log_result = OpenOptions::new().append(true).create(true).open(path);
    match log_result {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[gptcore] Failed to create log file at {path}. Error: {err:?}");
            Err(UtilError::LogFile)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{create_log_file, log_level};
    use log::LevelFilter;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(log_level("error"), LevelFilter::Error);
        assert_eq!(log_level("verbose"), LevelFilter::Warn);
    }

    #[test]
    fn test_create_log_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("logs/gptedit.log");
        let _ = create_log_file(&path.display().to_string()).unwrap();
        assert!(path.is_file());
    }
}
