use super::{directory::create_directories, error::FileSystemError};
use log::{error, warn};
use std::{
    fs::{metadata, read, remove_file},
    io::Write,
    path::Path,
};
use tempfile::NamedTempFile;

/// Check if path is a file
pub(crate) fn is_file(path: &str) -> bool {
    let file = Path::new(path);
    if file.is_file() {
        return true;
    }
    false
}

/// Read a file into memory. Files larger than 2GB are refused
pub(crate) fn read_file(path: &str) -> Result<Vec<u8>, FileSystemError> {
    if !is_file(path) {
        return Err(FileSystemError::NotFile);
    }
    if file_too_large(path) {
        return Err(FileSystemError::LargeFile);
    }

    let read_result = read(path);
    match read_result {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[gptcore] Failed to read file {path}: {err:?}");
            Err(FileSystemError::ReadFile)
        }
    }
}

/// Write data to a uniquely named sibling temporary file and then rename it over `path`
pub(crate) fn write_file_atomic(path: &str, data: &[u8]) -> Result<(), FileSystemError> {
    let target = Path::new(path);
    let parent = match target.parent() {
        Some(result) if !result.as_os_str().is_empty() => result,
        _ => Path::new("."),
    };
    create_directories(&parent.display().to_string())?;

    // The temporary file is removed on drop if it never reaches `path`
    let mut temp = match NamedTempFile::new_in(parent) {
        Ok(result) => result,
        Err(err) => {
            error!(
                "[gptcore] Failed to create temporary file in {}: {err:?}",
                parent.display()
            );
            return Err(FileSystemError::WriteFile);
        }
    };
    if let Err(err) = write_temp(&mut temp, data) {
        error!(
            "[gptcore] Failed to write temporary file {}: {err:?}",
            temp.path().display()
        );
        return Err(FileSystemError::WriteFile);
    }

    if let Err(err) = temp.persist(target) {
        error!("[gptcore] Failed to move temporary file into place at {path}: {err:?}");
        return Err(FileSystemError::RenameFile);
    }
    Ok(())
}

/// Delete a file. A missing file is not an error
pub(crate) fn delete_file(path: &str) -> Result<(), FileSystemError> {
    if !Path::new(path).exists() {
        return Ok(());
    }
    match remove_file(path) {
        Ok(_) => Ok(()),
        Err(err) => {
            error!("[gptcore] Failed to remove file {path}: {err:?}");
            Err(FileSystemError::RemoveFile)
        }
    }
}

fn write_temp(temp: &mut NamedTempFile, data: &[u8]) -> std::io::Result<()> {
    temp.write_all(data)?;
    temp.as_file().sync_all()
}

fn file_too_large(path: &str) -> bool {
    let max_size = 2147483648;
    match metadata(path) {
        Ok(result) => result.len() > max_size,
        Err(err) => {
            warn!("[gptcore] Failed to get metadata for {path}: {err:?}");
            false
        }
    }
}
