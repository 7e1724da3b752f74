use std::fmt;

#[derive(Debug)]
pub(crate) enum UtilError {
    ReadXml,
    UtfType,
    ParseXml,
    LogFile,
    BadToml,
}

impl std::error::Error for UtilError {}

impl fmt::Display for UtilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilError::ReadXml => write!(f, "Failed to read XML"),
            UtilError::UtfType => write!(f, "Failed to decode UTF XML data"),
            UtilError::ParseXml => write!(f, "Failed to parse XML"),
            UtilError::LogFile => write!(f, "Could not create log file"),
            UtilError::BadToml => write!(f, "Failed to parse TOML data"),
        }
    }
}
