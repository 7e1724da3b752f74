use std::fmt;

#[derive(Debug)]
pub enum CoreError {
    NoFile,
    BadToml,
    BadDefinitions,
    BadRegistryFile,
}

impl std::error::Error for CoreError {}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::NoFile => write!(f, "Could not read file"),
            CoreError::BadToml => write!(f, "Failed to parse TOML data"),
            CoreError::BadDefinitions => write!(f, "Failed to load policy definitions"),
            CoreError::BadRegistryFile => write!(f, "Failed to parse Registry.pol file"),
        }
    }
}
