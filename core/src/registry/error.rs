use std::fmt;

#[derive(Debug)]
pub(crate) enum RegistryError {
    Parser,
    BadSignature,
    BadVersion,
    NotList,
    BadInteger,
    BadBinary,
    BuildFile,
    WriteFile,
    RemoveFile,
    Unavailable,
    EmptyGpo,
    BadGpoPath,
}

impl std::error::Error for RegistryError {}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Parser => write!(f, "Failed to parse Registry.pol data"),
            RegistryError::BadSignature => write!(f, "Registry.pol file has bad signature"),
            RegistryError::BadVersion => write!(f, "Registry.pol file has unsupported version"),
            RegistryError::NotList => write!(f, "REG_MULTI_SZ value must be a list of strings"),
            RegistryError::BadInteger => write!(f, "Registry value is not an integer"),
            RegistryError::BadBinary => write!(f, "REG_BINARY value must be bytes or string"),
            RegistryError::BuildFile => write!(f, "Failed to build Registry.pol data"),
            RegistryError::WriteFile => write!(f, "Failed to write Registry.pol file"),
            RegistryError::RemoveFile => write!(f, "Failed to remove Registry.pol file"),
            RegistryError::Unavailable => write!(f, "Registry.pol storage is unavailable"),
            RegistryError::EmptyGpo => write!(f, "GPO identifier is required"),
            RegistryError::BadGpoPath => write!(f, "GPO path must stay inside the sysvol root"),
        }
    }
}
