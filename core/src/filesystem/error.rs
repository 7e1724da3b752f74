use std::fmt;

#[derive(Debug)]
pub(crate) enum FileSystemError {
    ReadDirectory,
    NotDirectory,
    CreateDirectory,
    ReadFile,
    NotFile,
    LargeFile,
    WriteFile,
    RenameFile,
    RemoveFile,
}

impl std::error::Error for FileSystemError {}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSystemError::ReadDirectory => write!(f, "Could not read directory path"),
            FileSystemError::NotDirectory => write!(f, "Not a directory"),
            FileSystemError::CreateDirectory => write!(f, "Could not create directory"),
            FileSystemError::ReadFile => write!(f, "Could not read file"),
            FileSystemError::NotFile => write!(f, "Not a file"),
            FileSystemError::LargeFile => write!(f, "File larger than 2GB"),
            FileSystemError::WriteFile => write!(f, "Could not write file"),
            FileSystemError::RenameFile => write!(f, "Could not move file into place"),
            FileSystemError::RemoveFile => write!(f, "Could not remove file"),
        }
    }
}
