use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Bucket name used for policies without a resolvable category
pub const UNCATEGORIZED: &str = "__UNCATEGORIZED__";

/// Category declared by an ADMX `<category>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub parent: Option<String>,
    pub inherited_ids: Vec<String>, // Sorted child category ids
}

/// Registry hive a policy applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PolicyClass {
    Machine,
    User,
}

impl PolicyClass {
    /// Match a policy target (`Machine` or `User`) case-insensitively
    pub fn from_target(target: &str) -> Option<PolicyClass> {
        let trimmed = target.trim();
        if trimmed.eq_ignore_ascii_case("machine") {
            return Some(PolicyClass::Machine);
        }
        if trimmed.eq_ignore_ascii_case("user") {
            return Some(PolicyClass::User);
        }
        None
    }

    /// Directory name used under a GPT for this class
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyClass::Machine => "Machine",
            PolicyClass::User => "User",
        }
    }
}

impl fmt::Display for PolicyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attribute value that is kept as a number when it looks like one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataScalar {
    Integer(i64),
    Text(String),
}

impl MetadataScalar {
    /// Convert an ADMX attribute value. Optionally signed digit strings become integers
    pub fn parse(value: &str) -> MetadataScalar {
        let value = value.trim();
        let digits = value.strip_prefix('-').unwrap_or(value);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(number) = value.parse::<i64>() {
                return MetadataScalar::Integer(number);
            }
        }
        MetadataScalar::Text(value.to_string())
    }
}

/// Defaults pulled from the ADML presentation control matching an element id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl PresentationDefaults {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.default_item.is_none() && self.default_value.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub presentation: PresentationDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanElement {
    pub id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub value_name: Option<String>,
    #[serde(default)]
    pub true_value: Option<MetadataScalar>,
    #[serde(default)]
    pub false_value: Option<MetadataScalar>,
    #[serde(flatten)]
    pub presentation: PresentationDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumElement {
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub items: BTreeMap<String, Option<String>>, // Raw registry value -> display label
    #[serde(flatten)]
    pub presentation: PresentationDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecimalElement {
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub max_value: Option<i64>,
    #[serde(flatten)]
    pub presentation: PresentationDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListElement {
    pub id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub additive: bool,
    #[serde(flatten)]
    pub presentation: PresentationDefaults,
}

/// Policy level enabled/disabled toggle. Has no element of its own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyValueToggle {
    #[serde(default)]
    pub enabled_value: Option<MetadataScalar>,
    #[serde(default)]
    pub disabled_value: Option<MetadataScalar>,
}

/// Metadata describing one settable registry value of a policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PolicyMetadata {
    Text(TextElement),
    Boolean(BooleanElement),
    Enum(EnumElement),
    Decimal(DecimalElement),
    List(ListElement),
    PolicyValue(PolicyValueToggle),
}

impl PolicyMetadata {
    /// Name used in the `type` tag
    pub fn type_name(&self) -> &'static str {
        match self {
            PolicyMetadata::Text(_) => "text",
            PolicyMetadata::Boolean(_) => "boolean",
            PolicyMetadata::Enum(_) => "enum",
            PolicyMetadata::Decimal(_) => "decimal",
            PolicyMetadata::List(_) => "list",
            PolicyMetadata::PolicyValue(_) => "policyValue",
        }
    }

    /// Registry key declared by the element itself, if any
    pub fn key(&self) -> Option<&str> {
        let key = match self {
            PolicyMetadata::Text(text) => text.key.as_deref(),
            PolicyMetadata::Boolean(boolean) => boolean.key.as_deref(),
            PolicyMetadata::Enum(item) => item.key.as_deref(),
            PolicyMetadata::Decimal(decimal) => decimal.key.as_deref(),
            PolicyMetadata::List(list) => list.key.as_deref(),
            PolicyMetadata::PolicyValue(_) => None,
        };
        key.filter(|value| !value.is_empty())
    }

    /// Registry value name declared by the element itself, if any
    pub fn value_name(&self) -> Option<&str> {
        let name = match self {
            PolicyMetadata::Text(text) => text.value_name.as_deref(),
            PolicyMetadata::Boolean(boolean) => boolean.value_name.as_deref(),
            PolicyMetadata::Enum(item) => item.value_name.as_deref(),
            PolicyMetadata::Decimal(decimal) => decimal.value_name.as_deref(),
            PolicyMetadata::List(_) | PolicyMetadata::PolicyValue(_) => None,
        };
        name.filter(|value| !value.is_empty())
    }
}

/// Attributes of the ADMX `<policy>` element shared by all of its values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyHeader {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub explain_text: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value_name: Option<String>,
    #[serde(default)]
    pub presentation: Option<String>,
    #[serde(default)]
    pub parent_category: Option<String>,
    #[serde(default)]
    pub supported_on: Option<String>,
}

/// Metadata plus the deferred data reference for one heavy key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyValueEntry {
    pub metadata: PolicyMetadata,
    pub data: String, // Read_Path_GPT('<heavykey>')
}

/// A policy with its header and every heavy key it can write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub header: PolicyHeader,
    #[serde(flatten)]
    pub values: BTreeMap<String, PolicyValueEntry>, // Heavy key -> value entry
}

/// Policy extracted from one ADMX file before aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct RawPolicy {
    pub class: String,
    pub category_ref: Option<String>,
    pub policy: PolicyRecord,
}

/// Policies of one category in display name order. Serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyBucket {
    entries: Vec<(String, PolicyRecord)>,
    positions: HashMap<String, usize>, // Key to index in entries
}

impl PolicyBucket {
    pub fn new() -> PolicyBucket {
        PolicyBucket {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&PolicyRecord> {
        let index = self.positions.get(key)?;
        self.entries.get(*index).map(|(_, policy)| policy)
    }

    /// Insert or replace a policy
    pub fn insert(&mut self, key: String, policy: PolicyRecord) {
        if let Some(index) = self.positions.get(&key) {
            if let Some(slot) = self.entries.get_mut(*index) {
                slot.1 = policy;
                return;
            }
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, policy));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PolicyRecord)> {
        self.entries
            .iter()
            .map(|(name, policy)| (name.as_str(), policy))
    }

    /// Stable sort by policy display name. Missing names sort first
    pub fn sort_by_display_name(&mut self) {
        self.entries.sort_by(|(_, a), (_, b)| {
            a.display_name
                .as_deref()
                .unwrap_or_default()
                .cmp(b.display_name.as_deref().unwrap_or_default())
        });
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, (name, _))| (name.clone(), index))
            .collect();
    }
}

impl Serialize for PolicyBucket {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, policy) in &self.entries {
            map.serialize_entry(key, policy)?;
        }
        map.end()
    }
}

/// Category with its policies and nested child categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub category: String, // Display name, or the id when unnamed
    pub policies: PolicyBucket,
    pub inherited: Vec<CategoryNode>,
}

/// Category forest and uncategorized policies for one policy class
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassTree {
    pub categories: Vec<CategoryNode>,
    #[serde(rename = "uncategorizedPolicies")]
    pub uncategorized_policies: PolicyBucket,
}

/// Locale actually used. Several when ADMX files fell back differently
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocaleUsed {
    Single(String),
    Mixed(Vec<String>),
}

impl Default for LocaleUsed {
    fn default() -> Self {
        LocaleUsed::Single(String::from("en-US"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeMeta {
    #[serde(rename = "baseDir")]
    pub base_dir: String,
    #[serde(rename = "localeRequested")]
    pub locale_requested: String,
    #[serde(rename = "localeUsed")]
    pub locale_used: LocaleUsed,
    #[serde(rename = "Total categories")]
    pub total_categories: usize,
    #[serde(rename = "Total policies")]
    pub total_policies: usize,
    #[serde(rename = "Duplicates removed")]
    pub duplicates_removed: usize,
}

/// Aggregated definitions for a whole PolicyDefinitions directory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolicyTree {
    pub meta: TreeMeta,
    #[serde(rename = "Machine")]
    pub machine: ClassTree,
    #[serde(rename = "User")]
    pub user: ClassTree,
}

impl PolicyTree {
    pub fn class_tree(&self, class: PolicyClass) -> &ClassTree {
        match class {
            PolicyClass::Machine => &self.machine,
            PolicyClass::User => &self.user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BooleanElement, MetadataScalar, PolicyBucket, PolicyClass, PolicyHeader, PolicyMetadata,
        PolicyRecord, PresentationDefaults,
    };
    use std::collections::BTreeMap;

    fn record(name: &str) -> PolicyRecord {
        PolicyRecord {
            display_name: Some(name.to_string()),
            header: PolicyHeader::default(),
            values: BTreeMap::new(),
        }
    }

    #[test]
    fn test_metadata_scalar_parse() {
        assert_eq!(MetadataScalar::parse("1"), MetadataScalar::Integer(1));
        assert_eq!(MetadataScalar::parse(" -7 "), MetadataScalar::Integer(-7));
        assert_eq!(
            MetadataScalar::parse("on"),
            MetadataScalar::Text(String::from("on"))
        );
        assert_eq!(
            MetadataScalar::parse("-"),
            MetadataScalar::Text(String::from("-"))
        );
    }

    #[test]
    fn test_policy_class_from_target() {
        assert_eq!(PolicyClass::from_target("machine"), Some(PolicyClass::Machine));
        assert_eq!(PolicyClass::from_target("User"), Some(PolicyClass::User));
        assert_eq!(PolicyClass::from_target("Both"), None);
    }

    #[test]
    fn test_bucket_keeps_sorted_order_when_serialized() {
        let mut bucket = PolicyBucket::new();
        bucket.insert(String::from("cat:Zeta"), record("Zeta"));
        bucket.insert(String::from("cat:Alpha"), record("Alpha"));
        bucket.sort_by_display_name();

        let keys: Vec<&str> = bucket.keys().collect();
        assert_eq!(keys, vec!["cat:Alpha", "cat:Zeta"]);

        let json = serde_json::to_string(&bucket).unwrap();
        assert!(json.find("cat:Alpha").unwrap() < json.find("cat:Zeta").unwrap());
    }

    #[test]
    fn test_bucket_lookup_after_sort_and_replace() {
        let mut bucket = PolicyBucket::new();
        for index in 0..500 {
            let name = format!("Policy {:03}", 499 - index);
            bucket.insert(format!("cat:{name}"), record(&name));
        }
        bucket.insert(String::from("cat:Policy 250"), record("Replaced"));
        assert_eq!(bucket.len(), 500);
        assert!(bucket.contains_key("cat:Policy 000"));
        assert!(!bucket.contains_key("cat:Policy 500"));

        bucket.sort_by_display_name();
        assert_eq!(bucket.keys().next(), Some("cat:Policy 000"));
        assert_eq!(
            bucket.get("cat:Policy 250").unwrap().display_name.as_deref(),
            Some("Replaced")
        );
        assert_eq!(
            bucket.get("cat:Policy 499").unwrap().display_name.as_deref(),
            Some("Policy 499")
        );

        bucket.insert(String::from("cat:Policy 000"), record("First again"));
        assert_eq!(bucket.len(), 500);
        assert_eq!(
            bucket.get("cat:Policy 000").unwrap().display_name.as_deref(),
            Some("First again")
        );
        assert_eq!(bucket.keys().next(), Some("cat:Policy 000"));
    }

    #[test]
    fn test_metadata_tagged_serialization() {
        let meta = PolicyMetadata::Boolean(BooleanElement {
            id: Some(String::from("Enabled")),
            key: Some(String::from("Software\\Policies\\Update")),
            value_name: Some(String::from("Enabled")),
            true_value: Some(MetadataScalar::Integer(1)),
            false_value: Some(MetadataScalar::Integer(0)),
            presentation: PresentationDefaults {
                label: Some(String::from("Turn on")),
                default_item: None,
                default_value: None,
            },
        });
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["type"], "boolean");
        assert_eq!(value["trueValue"], 1);
        assert_eq!(value["label"], "Turn on");
        assert!(value.get("defaultItem").is_none());

        let back: PolicyMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_policy_record_flattens_heavy_keys() {
        let json = serde_json::json!({
            "displayName": "Auto Update",
            "header": {"name": "AutoUpdate", "key": "Software\\Policies\\Update"},
            "Software\\Policies\\Update\\Enabled": {
                "metadata": {"type": "policyValue", "enabledValue": 1, "disabledValue": 0},
                "data": "Read_Path_GPT('Software\\Policies\\Update\\Enabled')"
            }
        });
        let record: PolicyRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.header.name.as_deref(), Some("AutoUpdate"));
        assert_eq!(record.values.len(), 1);
        let entry = &record.values["Software\\Policies\\Update\\Enabled"];
        assert_eq!(entry.metadata.type_name(), "policyValue");
    }
}
