use std::fmt;

#[derive(Debug)]
pub(crate) enum ResolverError {
    EmptyGpo,
    Unavailable,
    NoRegistryKey,
    WriteFailed,
}

impl std::error::Error for ResolverError {}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::EmptyGpo => write!(f, "GPO identifier is required"),
            ResolverError::Unavailable => write!(f, "Registry.pol store is unavailable"),
            ResolverError::NoRegistryKey => write!(f, "Could not determine a registry key"),
            ResolverError::WriteFailed => write!(f, "Could not write the registry value"),
        }
    }
}
