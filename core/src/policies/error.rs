use std::fmt;

#[derive(Debug)]
pub(crate) enum AdmxError {
    NotDirectory,
    ReadDirectory,
    ReadAdmx,
    ParseAdmx,
}

impl std::error::Error for AdmxError {}

impl fmt::Display for AdmxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmxError::NotDirectory => write!(f, "Policy definitions path is not a directory"),
            AdmxError::ReadDirectory => write!(f, "Could not list policy definition files"),
            AdmxError::ReadAdmx => write!(f, "Could not read ADMX file"),
            AdmxError::ParseAdmx => write!(f, "Could not parse ADMX file"),
        }
    }
}
