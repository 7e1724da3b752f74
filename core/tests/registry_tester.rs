use common::registry::RegistryValue;
use gptcore::core::read_registry_pol;
use std::path::PathBuf;

#[test]
fn test_read_registry_pol() {
    let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    test_location.push("tests/test_data/registry/Registry.pol");

    let entries = read_registry_pol(&test_location.display().to_string()).unwrap();
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[1].key_path, "Software\\Policies\\Update");
    assert_eq!(entries[1].value_name, "Server");
    assert_eq!(entries[1].value_type, "REG_SZ");
    assert_eq!(
        entries[1].data,
        RegistryValue::String(String::from("update.example.com"))
    );

    assert_eq!(entries[2].value_type, "REG_MULTI_SZ");
    assert_eq!(
        entries[2].data,
        RegistryValue::MultiString(vec![String::from("alpha"), String::from("beta")])
    );
}

#[test]
#[should_panic(expected = "BadRegistryFile")]
fn test_read_bad_registry_pol() {
    let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    test_location.push("tests/test_data/config/gptedit.toml");

    read_registry_pol(&test_location.display().to_string()).unwrap();
}
