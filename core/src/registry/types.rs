use log::warn;
use std::fmt;

/// Registry value type tags used by Registry.pol entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RegType {
    None,
    Sz,
    ExpandSz,
    Binary,
    Dword,
    DwordBigEndian,
    Link,
    MultiSz,
    ResourceList,
    FullResourceDescriptor,
    ResourceRequirementsList,
    Qword,
    /**Tag read from disk that has no known name */
    Unknown(u32),
}

impl RegType {
    /// Get the type from its on-disk tag
    pub(crate) fn from_code(code: u32) -> RegType {
        match code {
            0x0 => RegType::None,
            0x1 => RegType::Sz,
            0x2 => RegType::ExpandSz,
            0x3 => RegType::Binary,
            0x4 => RegType::Dword,
            0x5 => RegType::DwordBigEndian,
            0x6 => RegType::Link,
            0x7 => RegType::MultiSz,
            0x8 => RegType::ResourceList,
            0x9 => RegType::FullResourceDescriptor,
            0xa => RegType::ResourceRequirementsList,
            0xb => RegType::Qword,
            _ => RegType::Unknown(code),
        }
    }

    /// On-disk tag for the type
    pub(crate) fn code(&self) -> u32 {
        match self {
            RegType::None => 0x0,
            RegType::Sz => 0x1,
            RegType::ExpandSz => 0x2,
            RegType::Binary => 0x3,
            RegType::Dword => 0x4,
            RegType::DwordBigEndian => 0x5,
            RegType::Link => 0x6,
            RegType::MultiSz => 0x7,
            RegType::ResourceList => 0x8,
            RegType::FullResourceDescriptor => 0x9,
            RegType::ResourceRequirementsList => 0xa,
            RegType::Qword => 0xb,
            RegType::Unknown(code) => *code,
        }
    }

    /// Get the type from a name such as `REG_DWORD`. Unknown names become `REG_SZ`
    pub(crate) fn from_name(name: &str) -> RegType {
        let upper = name.trim().to_uppercase();
        match upper.as_str() {
            "REG_NONE" => RegType::None,
            "REG_SZ" => RegType::Sz,
            "REG_EXPAND_SZ" => RegType::ExpandSz,
            "REG_BINARY" => RegType::Binary,
            "REG_DWORD" => RegType::Dword,
            "REG_DWORD_BIG_ENDIAN" => RegType::DwordBigEndian,
            "REG_LINK" => RegType::Link,
            "REG_MULTI_SZ" => RegType::MultiSz,
            "REG_RESOURCE_LIST" => RegType::ResourceList,
            "REG_FULL_RESOURCE_DESCRIPTOR" => RegType::FullResourceDescriptor,
            "REG_RESOURCE_REQUIREMENTS_LIST" => RegType::ResourceRequirementsList,
            "REG_QWORD" => RegType::Qword,
            _ => match upper.parse::<u32>() {
                Ok(code) => RegType::from_code(code),
                Err(_) => {
                    warn!("[registry] Unknown registry type name {name}, using REG_SZ");
                    RegType::Sz
                }
            },
        }
    }

    /// Name of the type. Unknown tags are named by their number
    pub(crate) fn name(&self) -> String {
        let name = match self {
            RegType::None => "REG_NONE",
            RegType::Sz => "REG_SZ",
            RegType::ExpandSz => "REG_EXPAND_SZ",
            RegType::Binary => "REG_BINARY",
            RegType::Dword => "REG_DWORD",
            RegType::DwordBigEndian => "REG_DWORD_BIG_ENDIAN",
            RegType::Link => "REG_LINK",
            RegType::MultiSz => "REG_MULTI_SZ",
            RegType::ResourceList => "REG_RESOURCE_LIST",
            RegType::FullResourceDescriptor => "REG_FULL_RESOURCE_DESCRIPTOR",
            RegType::ResourceRequirementsList => "REG_RESOURCE_REQUIREMENTS_LIST",
            RegType::Qword => "REG_QWORD",
            RegType::Unknown(code) => return format!("{code}"),
        };
        name.to_string()
    }
}

impl fmt::Display for RegType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
