use super::{supported::localize_supported_on, tables::LocaleTables};
use crate::utils::xml::XmlNode;
use common::policy::{
    BooleanElement, DecimalElement, EnumElement, ListElement, MetadataScalar, PolicyHeader,
    PolicyMetadata, PolicyRecord, PolicyValueEntry, PolicyValueToggle, PresentationDefaults,
    TextElement,
};
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Deferred reference to the value stored in the GPT for a heavy key
pub(crate) fn data_ref(heavy_key: &str) -> String {
    format!("Read_Path_GPT('{heavy_key}')")
}

/// Join a registry key and value name into a heavy key
pub(crate) fn heavy_key(key: &str, value_name: &str) -> String {
    format!("{key}\\{value_name}")
        .trim_end_matches('\\')
        .to_string()
}

fn registry_key(value: Option<&str>) -> String {
    value.unwrap_or_default().replace('/', "\\")
}

fn flag(node: &XmlNode, name: &str) -> bool {
    node.attribute(name)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

/// Build the record for one ADMX `<policy>` element
pub(crate) fn parse_policy_record(policy: &XmlNode, tables: &LocaleTables) -> PolicyRecord {
    let display_name = tables.resolve_string(policy.attribute("displayName"));
    let mut header = PolicyHeader {
        class: owned(policy.attribute("class")),
        name: owned(policy.attribute("name")),
        display_name: display_name.clone(),
        explain_text: tables.resolve_string(policy.attribute("explainText")),
        key: Some(registry_key(policy.attribute("key"))),
        value_name: owned(
            policy
                .attribute("valueName")
                .or_else(|| policy.attribute("valuename")),
        ),
        presentation: owned(policy.attribute("presentation")),
        parent_category: None,
        supported_on: None,
    };

    for child in &policy.children {
        match child.name.as_str() {
            "parentCategory" => header.parent_category = owned(child.attribute("ref")),
            "supportedOn" => {
                header.supported_on = localize_supported_on(tables, child.attribute("ref"));
            }
            _ => {}
        }
    }

    let base_key = header.key.clone().unwrap_or_default();
    let empty = HashMap::new();
    let controls = tables
        .presentation(header.presentation.as_deref())
        .unwrap_or(&empty);

    let mut values = BTreeMap::new();
    if let Some(toggle) = parse_policy_value(policy) {
        let value_name = header.value_name.clone().unwrap_or_default();
        let key = heavy_key(&base_key, &value_name);
        insert_value(&mut values, key, PolicyMetadata::PolicyValue(toggle));
        return PolicyRecord {
            display_name,
            header,
            values,
        };
    }

    let elements = match policy.child("elements") {
        Some(result) => result,
        None => {
            return PolicyRecord {
                display_name,
                header,
                values,
            }
        }
    };

    for element in &elements.children {
        let presentation = element
            .attribute("id")
            .filter(|id| !id.is_empty())
            .and_then(|id| controls.get(id))
            .cloned()
            .unwrap_or_default();

        let own_key = element
            .attribute("key")
            .map(|key| registry_key(Some(key)))
            .filter(|key| !key.is_empty());
        let element_key = own_key.clone().unwrap_or_else(|| base_key.clone());
        let value_name = element.attribute("valueName").unwrap_or_default().trim();

        let (key, metadata) = match element.name.as_str() {
            "enum" => (
                heavy_key(&element_key, value_name),
                parse_enum(element, own_key, tables, presentation),
            ),
            // Boolean and list elements without their own key use the policy key too,
            // never an empty key path
            "boolean" => (
                heavy_key(&element_key, value_name),
                parse_boolean(element, own_key, presentation),
            ),
            "text" => (
                heavy_key(&element_key, value_name),
                parse_text(element, own_key, presentation),
            ),
            "decimal" => (
                heavy_key(&element_key, value_name),
                parse_decimal(element, own_key, presentation),
            ),
            "list" => (element_key, parse_list(element, own_key, presentation)),
            other => {
                debug!("[admx] Skipping unsupported policy element {other}");
                continue;
            }
        };
        insert_value(&mut values, key, metadata);
    }

    PolicyRecord {
        display_name,
        header,
        values,
    }
}

fn insert_value(values: &mut BTreeMap<String, PolicyValueEntry>, key: String, metadata: PolicyMetadata) {
    let entry = PolicyValueEntry {
        metadata,
        data: data_ref(&key),
    };
    values.insert(key, entry);
}

/// Value of a `<value>`, `<enabledValue>` or `<disabledValue>` container
fn container_value(container: &XmlNode) -> Option<String> {
    for child in &container.children {
        match child.name.as_str() {
            "string" => return Some(child.text.trim().to_string()),
            "decimal" => return child.attribute("value").map(|value| value.trim().to_string()),
            _ => continue,
        }
    }
    None
}

/// `<enabledValue>`/`<disabledValue>` of a policy, if it declares either
fn parse_policy_value(policy: &XmlNode) -> Option<PolicyValueToggle> {
    let mut enabled = None;
    let mut disabled = None;
    for child in &policy.children {
        match child.name.as_str() {
            "enabledValue" => enabled = container_value(child),
            "disabledValue" => disabled = container_value(child),
            _ => {}
        }
    }
    if enabled.is_none() && disabled.is_none() {
        return None;
    }

    Some(PolicyValueToggle {
        enabled_value: enabled.as_deref().map(MetadataScalar::parse),
        disabled_value: disabled.as_deref().map(MetadataScalar::parse),
    })
}

fn parse_enum(
    element: &XmlNode,
    key: Option<String>,
    tables: &LocaleTables,
    presentation: PresentationDefaults,
) -> PolicyMetadata {
    let mut items = BTreeMap::new();
    for item in element.children_named("item") {
        let value = match item.child("value").and_then(container_value) {
            Some(result) => result,
            None => continue,
        };
        items.insert(value, tables.resolve_string(item.attribute("displayName")));
    }

    PolicyMetadata::Enum(EnumElement {
        id: owned(element.attribute("id")),
        key,
        value_name: owned(element.attribute("valueName")),
        required: flag(element, "required"),
        items,
        presentation,
    })
}

fn parse_boolean(
    element: &XmlNode,
    key: Option<String>,
    presentation: PresentationDefaults,
) -> PolicyMetadata {
    let decimal_of = |name: &str| {
        element
            .child(name)
            .and_then(|container| container.children_named("decimal").last())
            .and_then(|decimal| decimal.attribute("value"))
            .map(MetadataScalar::parse)
    };

    PolicyMetadata::Boolean(BooleanElement {
        id: owned(element.attribute("id")),
        key,
        value_name: owned(element.attribute("valueName")),
        true_value: decimal_of("trueValue"),
        false_value: decimal_of("falseValue"),
        presentation,
    })
}

fn parse_text(
    element: &XmlNode,
    key: Option<String>,
    presentation: PresentationDefaults,
) -> PolicyMetadata {
    PolicyMetadata::Text(TextElement {
        id: owned(element.attribute("id")),
        key,
        value_name: owned(element.attribute("valueName")),
        required: flag(element, "required"),
        presentation,
    })
}

fn parse_decimal(
    element: &XmlNode,
    key: Option<String>,
    presentation: PresentationDefaults,
) -> PolicyMetadata {
    let bound = |name: &str| {
        element
            .attribute(name)
            .and_then(|value| value.trim().parse::<i64>().ok())
    };

    PolicyMetadata::Decimal(DecimalElement {
        id: owned(element.attribute("id")),
        key,
        value_name: owned(element.attribute("valueName")),
        required: flag(element, "required"),
        min_value: bound("minValue"),
        max_value: bound("maxValue"),
        presentation,
    })
}

fn parse_list(
    element: &XmlNode,
    key: Option<String>,
    presentation: PresentationDefaults,
) -> PolicyMetadata {
    PolicyMetadata::List(ListElement {
        id: owned(element.attribute("id")),
        key,
        additive: flag(element, "additive"),
        presentation,
    })
}

#[cfg(test)]
mod tests {
    use super::{data_ref, heavy_key, parse_policy_record};
    use crate::{policies::tables::LocaleTables, utils::xml::parse_xml_tree};
    use common::policy::{MetadataScalar, PolicyMetadata, PresentationDefaults};
    use std::collections::HashMap;

    fn tables() -> LocaleTables {
        let mut tables = LocaleTables::default();
        tables
            .strings
            .insert(String::from("Proxy"), String::from("Configure proxy"));
        tables
            .strings
            .insert(String::from("Mode_Auto"), String::from("Automatic"));
        tables
            .strings
            .insert(String::from("SUPPORTED_Win7"), String::from("At least Windows 7"));
        let mut controls = HashMap::new();
        controls.insert(
            String::from("ProxyHost"),
            PresentationDefaults {
                label: Some(String::from("Host:")),
                default_item: None,
                default_value: Some(String::from("proxy.local")),
            },
        );
        tables.presentations.insert(String::from("Proxy"), controls);
        tables
    }

    #[test]
    fn test_heavy_key() {
        assert_eq!(heavy_key("Software\\A", "Value"), "Software\\A\\Value");
        assert_eq!(heavy_key("Software\\A", ""), "Software\\A");
        assert_eq!(
            data_ref("Software\\A"),
            "Read_Path_GPT('Software\\A')"
        );
    }

    #[test]
    fn test_parse_elements() {
        let xml = r#"<policy name="Proxy" class="Machine" displayName="$(string.Proxy)"
            key="Software/Policies/Net" presentation="$(presentation.Proxy)">
          <parentCategory ref="net:Network"/>
          <supportedOn ref="windows:SUPPORTED_Win7"/>
          <elements>
            <text id="ProxyHost" valueName="Host" required="true"/>
            <enum id="Mode" valueName="Mode">
              <item displayName="$(string.Mode_Auto)"><value><decimal value="1"/></value></item>
              <item displayName="Manual"><value><string>manual</string></value></item>
              <item displayName="Broken"/>
            </enum>
            <decimal id="Port" key="Software\Policies\Net\Port" valueName="Number" minValue="1" maxValue="x"/>
            <boolean id="Bypass" valueName="Bypass">
              <trueValue><decimal value="1"/></trueValue>
              <falseValue><decimal value="0"/></falseValue>
            </boolean>
            <list id="Exceptions" key="Software\Policies\Net\Exceptions" additive="true"/>
            <multiText id="Ignored" valueName="Ignored"/>
          </elements>
        </policy>"#;
        let node = parse_xml_tree(xml).unwrap();
        let record = parse_policy_record(&node, &tables());

        assert_eq!(record.display_name.as_deref(), Some("Configure proxy"));
        assert_eq!(record.header.key.as_deref(), Some("Software\\Policies\\Net"));
        assert_eq!(record.header.parent_category.as_deref(), Some("net:Network"));
        assert_eq!(record.header.supported_on.as_deref(), Some("At least Windows 7"));
        assert_eq!(record.values.len(), 5);

        let host = &record.values["Software\\Policies\\Net\\Host"];
        assert_eq!(host.data, "Read_Path_GPT('Software\\Policies\\Net\\Host')");
        match &host.metadata {
            PolicyMetadata::Text(text) => {
                assert!(text.required);
                assert_eq!(text.presentation.label.as_deref(), Some("Host:"));
                assert_eq!(text.presentation.default_value.as_deref(), Some("proxy.local"));
            }
            other => panic!("unexpected metadata {other:?}"),
        }

        match &record.values["Software\\Policies\\Net\\Mode"].metadata {
            PolicyMetadata::Enum(item) => {
                assert_eq!(item.items.len(), 2);
                assert_eq!(item.items["1"].as_deref(), Some("Automatic"));
                assert_eq!(item.items["manual"].as_deref(), Some("Manual"));
            }
            other => panic!("unexpected metadata {other:?}"),
        }

        match &record.values["Software\\Policies\\Net\\Port\\Number"].metadata {
            PolicyMetadata::Decimal(decimal) => {
                assert_eq!(decimal.min_value, Some(1));
                assert_eq!(decimal.max_value, None);
                assert_eq!(decimal.key.as_deref(), Some("Software\\Policies\\Net\\Port"));
            }
            other => panic!("unexpected metadata {other:?}"),
        }

        match &record.values["Software\\Policies\\Net\\Bypass"].metadata {
            PolicyMetadata::Boolean(boolean) => {
                assert_eq!(boolean.true_value, Some(MetadataScalar::Integer(1)));
                assert_eq!(boolean.false_value, Some(MetadataScalar::Integer(0)));
                assert_eq!(boolean.key, None);
            }
            other => panic!("unexpected metadata {other:?}"),
        }

        match &record.values["Software\\Policies\\Net\\Exceptions"].metadata {
            PolicyMetadata::List(list) => assert!(list.additive),
            other => panic!("unexpected metadata {other:?}"),
        }
    }

    #[test]
    fn test_policy_value_wins_over_elements() {
        let xml = r#"<policy name="Toggle" class="User" key="Software\Policies\T" valuename="On">
          <enabledValue><string>yes</string></enabledValue>
          <disabledValue><decimal value="0"/></disabledValue>
          <elements><text id="Ignored" valueName="Ignored"/></elements>
        </policy>"#;
        let node = parse_xml_tree(xml).unwrap();
        let record = parse_policy_record(&node, &LocaleTables::default());
        assert_eq!(record.header.value_name.as_deref(), Some("On"));
        assert_eq!(record.values.len(), 1);

        match &record.values["Software\\Policies\\T\\On"].metadata {
            PolicyMetadata::PolicyValue(toggle) => {
                assert_eq!(
                    toggle.enabled_value,
                    Some(MetadataScalar::Text(String::from("yes")))
                );
                assert_eq!(toggle.disabled_value, Some(MetadataScalar::Integer(0)));
            }
            other => panic!("unexpected metadata {other:?}"),
        }
    }

    #[test]
    fn test_boolean_and_list_use_policy_key() {
        let xml = r#"<policy name="Sync" class="Machine" key="Software\Policies\Sync">
          <elements>
            <boolean id="Enabled" valueName="Enabled"/>
            <list id="Folders"/>
          </elements>
        </policy>"#;
        let node = parse_xml_tree(xml).unwrap();
        let record = parse_policy_record(&node, &LocaleTables::default());
        assert_eq!(record.values.len(), 2);
        assert!(record.values.contains_key("Software\\Policies\\Sync\\Enabled"));
        assert!(record.values.contains_key("Software\\Policies\\Sync"));
        assert!(!record.values.contains_key("\\Enabled"));
        assert!(!record.values.contains_key(""));
    }

    #[test]
    fn test_policy_without_values() {
        let xml = r#"<policy name="Empty" class="Both" displayName="Unresolved"/>"#;
        let node = parse_xml_tree(xml).unwrap();
        let record = parse_policy_record(&node, &LocaleTables::default());
        assert!(record.values.is_empty());
        assert_eq!(record.header.key.as_deref(), Some(""));
        assert_eq!(record.display_name.as_deref(), Some("Unresolved"));
    }
}
