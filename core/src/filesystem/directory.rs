use super::error::FileSystemError;
use log::{error, warn};
use std::{fs::create_dir_all, fs::read_dir, path::Path};
use walkdir::WalkDir;

/// Check if path is a directory
pub(crate) fn is_directory(path: &str) -> bool {
    let dir = Path::new(path);
    if dir.is_dir() {
        return true;
    }
    false
}

/// Create a directory and all of its parents
pub(crate) fn create_directories(path: &str) -> Result<(), FileSystemError> {
    if is_directory(path) {
        return Ok(());
    }
    match create_dir_all(path) {
        Ok(_) => Ok(()),
        Err(err) => {
            error!("[gptcore] Failed to create directory {path}: {err:?}");
            Err(FileSystemError::CreateDirectory)
        }
    }
}

/// Get the sorted list of directories directly inside a provided directory
pub(crate) fn list_directories(path: &str) -> Result<Vec<String>, FileSystemError> {
    if !is_directory(path) {
        return Err(FileSystemError::NotDirectory);
    }
    let dir = match read_dir(path) {
        Ok(result) => result,
        Err(err) => {
            error!("[gptcore] Failed to get directory contents: {err:?}");
            return Err(FileSystemError::ReadDirectory);
        }
    };

    let mut dirs = Vec::new();
    for entry_result in dir {
        let entry = match entry_result {
            Ok(result) => result,
            Err(err) => {
                error!("[gptcore] Failed to get directory entry: {err:?}");
                continue;
            }
        };
        let full_path = entry.path();
        if full_path.is_dir() {
            dirs.push(full_path.display().to_string());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Recursively find files ending with the provided extension (case-insensitive). Results are sorted
pub(crate) fn find_files(path: &str, extension: &str) -> Result<Vec<String>, FileSystemError> {
    if !is_directory(path) {
        return Err(FileSystemError::NotDirectory);
    }

    let mut files = Vec::new();
    for entries in WalkDir::new(path).sort_by_file_name() {
        let entry = match entries {
            Ok(result) => result,
            Err(err) => {
                warn!("[gptcore] Failed to walk directory entry: {err:?}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            files.push(entry.path().display().to_string());
        }
    }
    files.sort();
    Ok(files)
}

/// Check if a directory contains at least one file with the provided extension
pub(crate) fn has_files(path: &str, extension: &str) -> bool {
    match find_files(path, extension) {
        Ok(result) => !result.is_empty(),
        Err(_) => false,
    }
}
