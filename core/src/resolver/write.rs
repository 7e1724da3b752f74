use super::{
    error::ResolverError,
    keys::{resolve_key_and_value_name, split_key_path},
    literal::parse_python_literal,
    path::get_path,
};
use crate::registry::{store::PolicyFileStore, types::RegType};
use common::{
    policy::{MetadataScalar, PolicyClass, PolicyHeader, PolicyMetadata, PolicyTree},
    registry::RegistryValue,
};
use log::{debug, error, info, warn};
use serde_json::{Map, Value};

/// A request to store one registry value for a GPO
#[derive(Debug, Clone, Default)]
pub(crate) struct SetRequest<'a> {
    pub(crate) path: &'a str,
    pub(crate) value: &'a str,
    pub(crate) gpo: &'a str,
    pub(crate) target: Option<&'a str>,
    pub(crate) metadata_path: Option<&'a str>,
}

/// One heavy key of a policy that a write could be aimed at
#[derive(Debug, Clone)]
struct Candidate {
    heavy_key: Option<String>,
    metadata: PolicyMetadata,
}

/// Metadata found for a write: the policy header (if known) and its candidates
#[derive(Debug, Clone, Default)]
struct WriteMetadata {
    header: Option<PolicyHeader>,
    candidates: Vec<Candidate>,
}

/// Resolve a logical write against the tree and upsert the value into Registry.pol
pub(crate) fn set_value(
    tree: &PolicyTree,
    store: &PolicyFileStore,
    request: &SetRequest<'_>,
) -> Result<(), ResolverError> {
    if request.gpo.trim().is_empty() {
        error!("[resolver] GPO identifier is required to set {}", request.path);
        return Err(ResolverError::EmptyGpo);
    }
    if !store.is_available() {
        error!(
            "[resolver] Cannot set {}: Registry.pol store is unavailable",
            request.path
        );
        return Err(ResolverError::Unavailable);
    }

    let parsed = parse_raw_value(request.value);
    let fields = parsed.as_object();

    let metadata_path = request
        .metadata_path
        .filter(|path| !path.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            fields
                .and_then(|map| map.get("metadata_path"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
    let metadata_node = match &metadata_path {
        Some(path) => {
            let node = get_path(tree, path);
            if node.is_none() {
                warn!("[resolver] Metadata path {path} not found, writing without metadata");
            }
            node
        }
        None => fields.and_then(|map| map.get("metadata")).cloned(),
    };
    let metadata = match &metadata_node {
        Some(node) => collect_candidates(node),
        None => WriteMetadata::default(),
    };

    let payload = match fields {
        Some(map) => ["value_data", "data", "value"]
            .iter()
            .find_map(|name| map.get(*name))
            .cloned()
            .unwrap_or_else(|| parsed.clone()),
        None => parsed.clone(),
    };
    let override_name = fields
        .and_then(|map| map.get("value_name"))
        .and_then(Value::as_str);

    let candidate = select_candidate(&metadata.candidates, request.path, override_name);
    let (mut key_path, mut value_name, mut reg_type, data) = match candidate {
        Some(candidate) => {
            let (key_path, value_name) = resolve_key_and_value_name(
                request.path,
                metadata.header.as_ref(),
                Some(&candidate.metadata),
            );
            let reg_type = metadata_reg_type(&candidate.metadata);
            let data = json_to_registry(&payload, Some(&candidate.metadata));
            (key_path, value_name, reg_type, data)
        }
        None => {
            let (key_path, value_name) = if metadata.header.is_some() {
                resolve_key_and_value_name(request.path, metadata.header.as_ref(), None)
            } else {
                split_key_path(request.path)
            };
            let reg_type = infer_reg_type(&payload);
            (key_path, value_name, reg_type, json_to_registry(&payload, None))
        }
    };

    if let Some(name) = override_name {
        value_name = name.to_string();
    }
    if let Some(type_name) = fields
        .and_then(|map| map.get("value_type"))
        .and_then(Value::as_str)
    {
        reg_type = RegType::from_name(type_name);
    }
    key_path = key_path.trim_matches('\\').to_string();
    if key_path.is_empty() {
        error!("[resolver] Could not determine a registry key for {}", request.path);
        return Err(ResolverError::NoRegistryKey);
    }

    let class = resolve_class(request.target, metadata_path.as_deref());
    debug!(
        "[resolver] Setting {class}\\{key_path}\\{value_name} ({reg_type}) in {}",
        request.gpo
    );
    if !store.upsert(request.gpo, class, &key_path, &value_name, data, reg_type) {
        return Err(ResolverError::WriteFailed);
    }
    info!(
        "[resolver] Set {key_path}\\{value_name} for {class} in {}",
        request.gpo
    );
    Ok(())
}

/// JSON first, then a Python style dict, else the raw string
pub(crate) fn parse_raw_value(value: &str) -> Value {
    if let Ok(result) = serde_json::from_str::<Value>(value) {
        return result;
    }
    if value.trim_start().starts_with('{') {
        if let Some(result) = parse_python_literal(value) {
            return result;
        }
    }
    Value::String(value.to_string())
}

/// Pick the class from the explicit target, else from the first metadata path segment, else Machine
pub(crate) fn resolve_class(target: Option<&str>, metadata_path: Option<&str>) -> PolicyClass {
    if let Some(target) = target.map(str::trim).filter(|target| !target.is_empty()) {
        return match PolicyClass::from_target(target) {
            Some(class) => class,
            None => {
                warn!("[resolver] Unknown policy type {target}, using Machine");
                PolicyClass::Machine
            }
        };
    }

    metadata_path
        .and_then(|path| path.split('/').find(|segment| !segment.is_empty()))
        .and_then(PolicyClass::from_target)
        .unwrap_or(PolicyClass::Machine)
}

fn collect_candidates(node: &Value) -> WriteMetadata {
    let map = match node.as_object() {
        Some(result) => result,
        None => {
            warn!("[resolver] Metadata node is not an object");
            return WriteMetadata::default();
        }
    };

    if let Some(header) = map.get("header") {
        return policy_candidates(map, header);
    }
    if let Some(metadata) = map.get("metadata") {
        let heavy_key = map
            .get("data")
            .and_then(Value::as_str)
            .and_then(heavy_key_from_data);
        return WriteMetadata {
            header: None,
            candidates: parse_metadata(metadata)
                .map(|metadata| Candidate {
                    heavy_key,
                    metadata,
                })
                .into_iter()
                .collect(),
        };
    }
    if map.contains_key("type") {
        return WriteMetadata {
            header: None,
            candidates: parse_metadata(node)
                .map(|metadata| Candidate {
                    heavy_key: None,
                    metadata,
                })
                .into_iter()
                .collect(),
        };
    }

    warn!("[resolver] Metadata node has no usable metadata");
    WriteMetadata::default()
}

fn policy_candidates(map: &Map<String, Value>, header: &Value) -> WriteMetadata {
    let header = match serde_json::from_value::<PolicyHeader>(header.clone()) {
        Ok(result) => Some(result),
        Err(err) => {
            warn!("[resolver] Could not read policy header: {err:?}");
            None
        }
    };

    let mut candidates = Vec::new();
    for (key, entry) in map {
        if key == "header" || key == "displayName" {
            continue;
        }
        let metadata = match entry.get("metadata").and_then(parse_metadata) {
            Some(result) => result,
            None => continue,
        };
        candidates.push(Candidate {
            heavy_key: Some(key.clone()),
            metadata,
        });
    }
    WriteMetadata { header, candidates }
}

fn parse_metadata(value: &Value) -> Option<PolicyMetadata> {
    match serde_json::from_value(value.clone()) {
        Ok(result) => Some(result),
        Err(err) => {
            warn!("[resolver] Could not read element metadata: {err:?}");
            None
        }
    }
}

/// Get the heavy key out of `Read_Path_GPT('<heavykey>')`
fn heavy_key_from_data(data: &str) -> Option<String> {
    let key = data.strip_prefix("Read_Path_GPT('")?.strip_suffix("')")?;
    Some(key.to_string())
}

/// Value name match first, then key match, then the first candidate
fn select_candidate<'a>(
    candidates: &'a [Candidate],
    raw_key_path: &str,
    override_name: Option<&str>,
) -> Option<&'a Candidate> {
    let full = raw_key_path.replace('/', "\\").trim_matches('\\').to_string();
    let (parent, last) = split_key_path(raw_key_path);
    let wanted_name = override_name.unwrap_or(&last);

    if let Some(found) = candidates
        .iter()
        .find(|candidate| candidate.metadata.value_name() == Some(wanted_name))
    {
        return Some(found);
    }

    let key_matches = |key: &str| key == full || key == parent;
    if let Some(found) = candidates.iter().find(|candidate| {
        candidate.heavy_key.as_deref().is_some_and(key_matches)
            || candidate.metadata.key().is_some_and(key_matches)
    }) {
        return Some(found);
    }

    let first = candidates.first();
    if candidates.len() > 1 {
        debug!("[resolver] No candidate matched {raw_key_path}, using the first one");
    }
    first
}

fn metadata_reg_type(metadata: &PolicyMetadata) -> RegType {
    match metadata {
        PolicyMetadata::Text(_) | PolicyMetadata::Enum(_) => RegType::Sz,
        PolicyMetadata::Decimal(_)
        | PolicyMetadata::Boolean(_)
        | PolicyMetadata::PolicyValue(_) => RegType::Dword,
        PolicyMetadata::List(_) => RegType::MultiSz,
    }
}

fn infer_reg_type(value: &Value) -> RegType {
    match value {
        Value::Bool(_) => RegType::Dword,
        Value::Number(number) if number.is_i64() || number.is_u64() => RegType::Dword,
        Value::Array(_) => RegType::MultiSz,
        _ => RegType::Sz,
    }
}

/// Convert the JSON payload into a registry value. Booleans use the declared on/off values
fn json_to_registry(value: &Value, metadata: Option<&PolicyMetadata>) -> RegistryValue {
    match value {
        Value::Bool(flag) => {
            let declared = match metadata {
                Some(PolicyMetadata::Boolean(boolean)) => {
                    if *flag {
                        boolean.true_value.as_ref()
                    } else {
                        boolean.false_value.as_ref()
                    }
                }
                Some(PolicyMetadata::PolicyValue(toggle)) => {
                    if *flag {
                        toggle.enabled_value.as_ref()
                    } else {
                        toggle.disabled_value.as_ref()
                    }
                }
                _ => None,
            };
            match declared {
                Some(MetadataScalar::Integer(number)) => RegistryValue::Integer(*number),
                Some(MetadataScalar::Text(text)) => RegistryValue::String(text.clone()),
                None => RegistryValue::Integer(i64::from(*flag)),
            }
        }
        Value::Number(number) => match number.as_i64() {
            Some(result) => RegistryValue::Integer(result),
            None => match number.as_u64() {
                Some(result) => RegistryValue::Integer(result as i64),
                None => RegistryValue::String(number.to_string()),
            },
        },
        Value::String(text) => RegistryValue::String(text.clone()),
        Value::Array(items) => RegistryValue::MultiString(
            items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::Null => RegistryValue::None,
        Value::Object(_) => RegistryValue::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_raw_value, resolve_class, set_value, SetRequest};
    use crate::{
        policies::{aggregate::build_policy_tree, cache::DefinitionCache},
        registry::{store::PolicyFileStore, types::RegType},
    };
    use common::{
        policy::{PolicyClass, PolicyTree},
        registry::RegistryValue,
    };
    use serde_json::json;
    use std::path::PathBuf;

    const GPO: &str = "domain.test/Policies/{31B2F340-016D-11D2-945F-00C04FB984F9}";

    fn basic_tree() -> PolicyTree {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("tests/test_data/policies/basic");
        let mut cache = DefinitionCache::new();
        build_policy_tree(&test_location.display().to_string(), "en-US", &mut cache).unwrap()
    }

    fn request<'a>(path: &'a str, value: &'a str) -> SetRequest<'a> {
        SetRequest {
            path,
            value,
            gpo: GPO,
            target: None,
            metadata_path: None,
        }
    }

    #[test]
    fn test_parse_raw_value() {
        assert_eq!(parse_raw_value("true"), json!(true));
        assert_eq!(parse_raw_value("{'value': False}"), json!({"value": false}));
        assert_eq!(parse_raw_value("plain text"), json!("plain text"));
        assert_eq!(parse_raw_value("{broken"), json!("{broken"));
    }

    #[test]
    fn test_resolve_class() {
        assert_eq!(resolve_class(Some("user"), None), PolicyClass::User);
        assert_eq!(resolve_class(Some("Both"), Some("/User/x")), PolicyClass::Machine);
        assert_eq!(resolve_class(Some(""), Some("/User/x")), PolicyClass::User);
        assert_eq!(resolve_class(None, Some("Machine/x")), PolicyClass::Machine);
        assert_eq!(resolve_class(None, None), PolicyClass::Machine);
    }

    #[test]
    fn test_set_boolean_with_metadata() {
        let tree = basic_tree();
        let temp = tempfile::tempdir().unwrap();
        let store = PolicyFileStore::new(&temp.path().display().to_string());

        let mut set = request("Software\\Policies\\Update\\Enabled", "true");
        set.metadata_path = Some("/Machine/Software%20Updates/policies/Updates:Configure automatic updates");
        set_value(&tree, &store, &set).unwrap();

        let value = store
            .get(GPO, PolicyClass::Machine, "Software\\Policies\\Update", "Enabled")
            .unwrap();
        assert_eq!(value, (RegistryValue::Integer(1), RegType::Dword));

        set.value = "false";
        set_value(&tree, &store, &set).unwrap();
        let value = store
            .get(GPO, PolicyClass::Machine, "Software\\Policies\\Update", "Enabled")
            .unwrap();
        assert_eq!(value.0, RegistryValue::Integer(0));
    }

    #[test]
    fn test_set_policy_value_toggle_for_user() {
        let tree = basic_tree();
        let temp = tempfile::tempdir().unwrap();
        let store = PolicyFileStore::new(&temp.path().display().to_string());

        let mut set = request("Software/Policies/Update/NoAutoReboot", "{'value': True}");
        set.metadata_path =
            Some("/User/Software Updates/policies/Updates:Do not reboot automatically");
        set_value(&tree, &store, &set).unwrap();

        let value = store
            .get(GPO, PolicyClass::User, "Software\\Policies\\Update", "NoAutoReboot")
            .unwrap();
        assert_eq!(value, (RegistryValue::Integer(1), RegType::Dword));
        assert!(store
            .get(GPO, PolicyClass::Machine, "Software\\Policies\\Update", "NoAutoReboot")
            .is_none());
    }

    #[test]
    fn test_set_selects_candidate_by_value_name() {
        let tree = basic_tree();
        let temp = tempfile::tempdir().unwrap();
        let store = PolicyFileStore::new(&temp.path().display().to_string());
        let metadata =
            "/Machine/Software Updates/Advanced/policies/UpdateAdvanced:Specify update server";

        let mut set = request("Software\\Policies\\Update\\Server", "\"mirror.example.com\"");
        set.metadata_path = Some(metadata);
        set_value(&tree, &store, &set).unwrap();

        let mut set = request("Software\\Policies\\Update\\IntervalHours", "12");
        set.metadata_path = Some(metadata);
        set_value(&tree, &store, &set).unwrap();

        let mut set = request("Software\\Policies\\Update\\Mirrors", "[\"a\", \"b\"]");
        set.metadata_path = Some(metadata);
        set_value(&tree, &store, &set).unwrap();

        let server = store
            .get(GPO, PolicyClass::Machine, "Software\\Policies\\Update", "Server")
            .unwrap();
        assert_eq!(
            server,
            (RegistryValue::String(String::from("mirror.example.com")), RegType::Sz)
        );
        let interval = store
            .get(GPO, PolicyClass::Machine, "Software\\Policies\\Update", "IntervalHours")
            .unwrap();
        assert_eq!(interval, (RegistryValue::Integer(12), RegType::Dword));
        let mirrors = store
            .get(GPO, PolicyClass::Machine, "Software\\Policies\\Update", "Mirrors")
            .unwrap();
        assert_eq!(mirrors.1, RegType::MultiSz);
    }

    #[test]
    fn test_set_without_metadata() {
        let tree = basic_tree();
        let temp = tempfile::tempdir().unwrap();
        let store = PolicyFileStore::new(&temp.path().display().to_string());

        let mut set = request("Software/Vendor/Count", "5");
        set.target = Some("User");
        set_value(&tree, &store, &set).unwrap();
        let value = store
            .get(GPO, PolicyClass::User, "Software\\Vendor", "Count")
            .unwrap();
        assert_eq!(value, (RegistryValue::Integer(5), RegType::Dword));

        let set = request(
            "Software/Vendor/Path",
            "{\"value_data\": \"%SystemRoot%\", \"value_type\": \"REG_EXPAND_SZ\", \"value_name\": \"Root\"}",
        );
        set_value(&tree, &store, &set).unwrap();
        let value = store
            .get(GPO, PolicyClass::Machine, "Software\\Vendor", "Root")
            .unwrap();
        assert_eq!(
            value,
            (RegistryValue::String(String::from("%SystemRoot%")), RegType::ExpandSz)
        );

        let set = request("Software/Vendor/Name", "plain text");
        set_value(&tree, &store, &set).unwrap();
        let value = store
            .get(GPO, PolicyClass::Machine, "Software\\Vendor", "Name")
            .unwrap();
        assert_eq!(value.1, RegType::Sz);
    }

    #[test]
    fn test_set_inline_metadata() {
        let tree = basic_tree();
        let temp = tempfile::tempdir().unwrap();
        let store = PolicyFileStore::new(&temp.path().display().to_string());

        let value = json!({
            "metadata": {"type": "boolean", "id": "On", "key": "Software\\Vendor", "valueName": "On",
                "trueValue": 7, "falseValue": 3},
            "value": true
        })
        .to_string();
        let set = request("Software\\Vendor\\On", &value);
        set_value(&tree, &store, &set).unwrap();
        let value = store
            .get(GPO, PolicyClass::Machine, "Software\\Vendor", "On")
            .unwrap();
        assert_eq!(value, (RegistryValue::Integer(7), RegType::Dword));
    }

    #[test]
    fn test_set_rejected() {
        let tree = basic_tree();
        let temp = tempfile::tempdir().unwrap();
        let store = PolicyFileStore::new(&temp.path().display().to_string());

        let mut set = request("Software\\Vendor\\On", "1");
        set.gpo = " ";
        assert!(set_value(&tree, &store, &set).is_err());

        let missing = PolicyFileStore::new("/this/sysvol/does/not/exist");
        let set = request("Software\\Vendor\\On", "1");
        assert!(set_value(&tree, &missing, &set).is_err());

        let set = request("OnlyName", "1");
        assert!(set_value(&tree, &store, &set).is_err());
    }
}
