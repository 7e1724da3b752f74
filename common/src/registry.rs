use base64::{Engine, engine::general_purpose};
use serde::{Serialize, Serializer};
use std::fmt;

/// Decoded value of a registry entry
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryValue {
    String(String),
    Integer(i64),
    MultiString(Vec<String>),
    Binary(Vec<u8>),
    None,
}

impl Serialize for RegistryValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RegistryValue::String(value) => serializer.serialize_str(value),
            RegistryValue::Integer(value) => serializer.serialize_i64(*value),
            RegistryValue::MultiString(values) => values.serialize(serializer),
            // Binary data is base64 encoded
            RegistryValue::Binary(data) => {
                serializer.serialize_str(&general_purpose::STANDARD.encode(data))
            }
            RegistryValue::None => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for RegistryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryValue::String(value) => write!(f, "{value}"),
            RegistryValue::Integer(value) => write!(f, "{value}"),
            RegistryValue::MultiString(values) => write!(f, "{values:?}"),
            RegistryValue::Binary(data) => write!(f, "{}", general_purpose::STANDARD.encode(data)),
            RegistryValue::None => write!(f, "(NULL)"),
        }
    }
}

/// One value stored in a Registry.pol file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub key_path: String,   // Software\Policies\Update
    pub value_name: String, // Enabled
    pub value_type: String, // REG_DWORD
    pub data: RegistryValue,
}

#[cfg(test)]
mod tests {
    use super::{RegistryEntry, RegistryValue};

    #[test]
    fn test_registry_value_json() {
        let entry = RegistryEntry {
            key_path: String::from("Software\\Policies\\Update"),
            value_name: String::from("Blob"),
            value_type: String::from("REG_BINARY"),
            data: RegistryValue::Binary(b"Hello word!".to_vec()),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["data"], "SGVsbG8gd29yZCE=");
        assert_eq!(value["value_type"], "REG_BINARY");

        let list = serde_json::to_value(RegistryValue::MultiString(vec![
            String::from("a"),
            String::from("b"),
        ]))
        .unwrap();
        assert_eq!(list, serde_json::json!(["a", "b"]));
        assert!(serde_json::to_value(RegistryValue::None).unwrap().is_null());
    }

    #[test]
    fn test_registry_value_display() {
        assert_eq!(RegistryValue::Integer(-4).to_string(), "-4");
        assert_eq!(RegistryValue::None.to_string(), "(NULL)");
    }
}
