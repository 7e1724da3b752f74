use super::{error::RegistryError, types::RegType};
use crate::utils::strings::{extract_utf16_string, string_to_utf16_le};
use common::registry::RegistryValue;
use log::{error, warn};

/// Raw form of a value as held by a Registry.pol entry before the final byte layout
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EntryData {
    Text(String),
    Integer(i64),
    Bytes(Vec<u8>),
    Empty,
}

/// Convert a typed value into the raw entry form for the provided registry type
pub(crate) fn encode_value(
    value: &RegistryValue,
    reg_type: &RegType,
) -> Result<EntryData, RegistryError> {
    match reg_type {
        RegType::Sz | RegType::ExpandSz | RegType::Link => Ok(EntryData::Text(value_as_text(value))),
        RegType::Dword | RegType::DwordBigEndian => {
            let number = value_as_integer(value)?;
            if u32::try_from(number).is_err() {
                error!("[registry] Value {number} does not fit in a {reg_type}");
                return Err(RegistryError::BadInteger);
            }
            Ok(EntryData::Integer(number))
        }
        RegType::Qword => Ok(EntryData::Integer(value_as_integer(value)?)),
        RegType::MultiSz => match value {
            RegistryValue::MultiString(values) => Ok(EntryData::Bytes(encode_multi_sz(values))),
            _ => {
                error!("[registry] REG_MULTI_SZ value must be a list, got {value:?}");
                Err(RegistryError::NotList)
            }
        },
        RegType::Binary => match value {
            RegistryValue::Binary(data) => Ok(EntryData::Bytes(data.clone())),
            RegistryValue::String(text) => Ok(EntryData::Bytes(text.as_bytes().to_vec())),
            _ => {
                error!("[registry] REG_BINARY value must be bytes or string, got {value:?}");
                Err(RegistryError::BadBinary)
            }
        },
        RegType::None => Ok(EntryData::Empty),
        RegType::ResourceList
        | RegType::FullResourceDescriptor
        | RegType::ResourceRequirementsList
        | RegType::Unknown(_) => {
            warn!("[registry] Unknown registry type {reg_type}, treating as binary");
            match value {
                RegistryValue::Binary(data) => Ok(EntryData::Bytes(data.clone())),
                _ => Ok(EntryData::Bytes(value_as_text(value).into_bytes())),
            }
        }
    }
}

/// Convert raw entry data back into a typed value
pub(crate) fn decode_value(data: &EntryData, reg_type: &RegType) -> RegistryValue {
    match reg_type {
        RegType::Sz | RegType::ExpandSz | RegType::Link => match data {
            EntryData::Text(text) => RegistryValue::String(text.clone()),
            EntryData::Integer(number) => RegistryValue::String(number.to_string()),
            EntryData::Bytes(bytes) => RegistryValue::String(
                extract_utf16_string(bytes)
                    .trim_end_matches('\0')
                    .to_string(),
            ),
            EntryData::Empty => RegistryValue::String(String::new()),
        },
        RegType::Dword | RegType::DwordBigEndian | RegType::Qword => match data {
            EntryData::Integer(number) => RegistryValue::Integer(*number),
            EntryData::Text(text) => match text.trim().parse::<i64>() {
                Ok(number) => RegistryValue::Integer(number),
                Err(err) => {
                    warn!("[registry] Could not convert {text} to an integer: {err:?}");
                    RegistryValue::Integer(0)
                }
            },
            EntryData::Bytes(_) | EntryData::Empty => RegistryValue::Integer(0),
        },
        RegType::MultiSz => match data {
            EntryData::Bytes(bytes) => {
                RegistryValue::MultiString(split_multi_sz(&extract_utf16_string(bytes)))
            }
            EntryData::Text(text) => RegistryValue::MultiString(split_multi_sz(text)),
            EntryData::Integer(number) => RegistryValue::MultiString(vec![number.to_string()]),
            EntryData::Empty => RegistryValue::MultiString(Vec::new()),
        },
        RegType::Binary => match data {
            EntryData::Bytes(bytes) => RegistryValue::Binary(bytes.clone()),
            EntryData::Text(text) => RegistryValue::Binary(text.as_bytes().to_vec()),
            EntryData::Integer(number) => RegistryValue::Binary(number.to_le_bytes().to_vec()),
            EntryData::Empty => RegistryValue::Binary(Vec::new()),
        },
        RegType::None => RegistryValue::None,
        RegType::ResourceList
        | RegType::FullResourceDescriptor
        | RegType::ResourceRequirementsList
        | RegType::Unknown(_) => {
            warn!("[registry] Unknown registry type {reg_type}, returning raw data");
            match data {
                EntryData::Bytes(bytes) => RegistryValue::Binary(bytes.clone()),
                EntryData::Text(text) => RegistryValue::String(text.clone()),
                EntryData::Integer(number) => RegistryValue::Integer(*number),
                EntryData::Empty => RegistryValue::None,
            }
        }
    }
}

/// Join strings with NUL separators and a double NUL terminator as UTF16LE.
/// An empty list is a single NUL character
pub(crate) fn encode_multi_sz(values: &[String]) -> Vec<u8> {
    if values.is_empty() {
        return string_to_utf16_le("", true);
    }
    let mut joined = values.join("\0");
    joined.push_str("\0\0");
    string_to_utf16_le(&joined, false)
}

fn split_multi_sz(decoded: &str) -> Vec<String> {
    let trimmed = decoded.trim_end_matches('\0');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\0').map(str::to_string).collect()
}

fn value_as_text(value: &RegistryValue) -> String {
    match value {
        RegistryValue::String(text) => text.clone(),
        RegistryValue::Integer(number) => number.to_string(),
        RegistryValue::MultiString(values) => values.join(","),
        RegistryValue::Binary(data) => String::from_utf8_lossy(data).to_string(),
        RegistryValue::None => String::new(),
    }
}

fn value_as_integer(value: &RegistryValue) -> Result<i64, RegistryError> {
    match value {
        RegistryValue::Integer(number) => Ok(*number),
        RegistryValue::String(text) => match text.trim().parse::<i64>() {
            Ok(number) => Ok(number),
            Err(err) => {
                error!("[registry] Could not convert {text} to an integer: {err:?}");
                Err(RegistryError::BadInteger)
            }
        },
        _ => {
            error!("[registry] Could not convert {value:?} to an integer");
            Err(RegistryError::BadInteger)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_value, encode_multi_sz, encode_value, EntryData};
    use crate::registry::types::RegType;
    use common::registry::RegistryValue;

    #[test]
    fn test_string_round_trip() {
        let value = RegistryValue::String(String::from("%SystemRoot%\\notepad.exe"));
        for reg_type in [RegType::Sz, RegType::ExpandSz] {
            let raw = encode_value(&value, &reg_type).unwrap();
            assert_eq!(decode_value(&raw, &reg_type), value);
        }
    }

    #[test]
    fn test_integer_round_trip() {
        for number in [0, 1, 4294967295] {
            let value = RegistryValue::Integer(number);
            for reg_type in [RegType::Dword, RegType::DwordBigEndian, RegType::Qword] {
                let raw = encode_value(&value, &reg_type).unwrap();
                assert_eq!(decode_value(&raw, &reg_type), value);
            }
        }
        for number in [-1, i64::MAX] {
            let value = RegistryValue::Integer(number);
            let raw = encode_value(&value, &RegType::Qword).unwrap();
            assert_eq!(decode_value(&raw, &RegType::Qword), value);
        }
    }

    #[test]
    fn test_dword_out_of_range() {
        for number in [-1, -5, 4294967296, 1_099_511_627_776] {
            let value = RegistryValue::Integer(number);
            assert!(encode_value(&value, &RegType::Dword).is_err());
            assert!(encode_value(&value, &RegType::DwordBigEndian).is_err());
        }
        assert!(encode_value(&RegistryValue::Integer(0), &RegType::Dword).is_ok());
        assert!(encode_value(&RegistryValue::Integer(4294967295), &RegType::Dword).is_ok());
        assert!(encode_value(&RegistryValue::String(String::from("-1")), &RegType::Dword).is_err());
    }

    #[test]
    fn test_integer_cast_from_string() {
        let raw = encode_value(&RegistryValue::String(String::from(" 42 ")), &RegType::Dword)
            .unwrap();
        assert_eq!(raw, EntryData::Integer(42));
        assert!(encode_value(&RegistryValue::String(String::from("yes")), &RegType::Dword).is_err());
        assert_eq!(
            decode_value(&EntryData::Empty, &RegType::Qword),
            RegistryValue::Integer(0)
        );
    }

    #[test]
    fn test_multi_sz() {
        let value = RegistryValue::MultiString(vec![String::from("a"), String::from("bc")]);
        let raw = encode_value(&value, &RegType::MultiSz).unwrap();
        assert_eq!(
            raw,
            EntryData::Bytes(vec![97, 0, 0, 0, 98, 0, 99, 0, 0, 0, 0, 0])
        );
        assert_eq!(decode_value(&raw, &RegType::MultiSz), value);
    }

    #[test]
    fn test_multi_sz_empty_list() {
        assert_eq!(encode_multi_sz(&[]), vec![0, 0]);
        let value = RegistryValue::MultiString(Vec::new());
        let raw = encode_value(&value, &RegType::MultiSz).unwrap();
        assert_eq!(decode_value(&raw, &RegType::MultiSz), value);
    }

    #[test]
    fn test_multi_sz_requires_list() {
        let value = RegistryValue::String(String::from("a"));
        assert!(encode_value(&value, &RegType::MultiSz).is_err());
    }

    #[test]
    fn test_binary() {
        let value = RegistryValue::Binary(vec![0, 1, 2, 255]);
        let raw = encode_value(&value, &RegType::Binary).unwrap();
        assert_eq!(decode_value(&raw, &RegType::Binary), value);

        let raw = encode_value(&RegistryValue::String(String::from("hi")), &RegType::Binary)
            .unwrap();
        assert_eq!(raw, EntryData::Bytes(b"hi".to_vec()));
        assert_eq!(
            decode_value(&EntryData::Empty, &RegType::Binary),
            RegistryValue::Binary(Vec::new())
        );
        assert!(encode_value(&RegistryValue::Integer(1), &RegType::Binary).is_err());
    }

    #[test]
    fn test_none() {
        let raw = encode_value(&RegistryValue::Integer(5), &RegType::None).unwrap();
        assert_eq!(raw, EntryData::Empty);
        assert_eq!(decode_value(&raw, &RegType::None), RegistryValue::None);
    }

    #[test]
    fn test_unknown_type_passthrough() {
        let raw = encode_value(&RegistryValue::String(String::from("x")), &RegType::Unknown(42))
            .unwrap();
        assert_eq!(raw, EntryData::Bytes(b"x".to_vec()));
        assert_eq!(
            decode_value(&raw, &RegType::ResourceList),
            RegistryValue::Binary(b"x".to_vec())
        );
    }
}
