use super::{
    cache::DefinitionCache, elements::parse_policy_record, error::AdmxError, tables::LocaleTables,
};
use crate::utils::{
    encoding::read_xml,
    xml::{parse_xml_tree, XmlNode},
};
use common::policy::{Category, RawPolicy};
use log::{error, warn};
use std::path::Path;

/// Categories and policies declared by one ADMX file
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedAdmx {
    pub(crate) locale: String,
    pub(crate) categories: Vec<Category>,
    pub(crate) policies: Vec<RawPolicy>,
}

/// Normalize a category reference: drop any `prefix:` namespace and surrounding whitespace
pub(crate) fn norm_ref(reference: Option<&str>) -> Option<String> {
    let mut value = reference?.trim();
    if let Some((_, tail)) = value.split_once(':') {
        value = tail.trim();
    }
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// Parse an ADMX file using the ADML tables found next to it
pub(crate) fn parse_admx_file(
    path: &str,
    requested_locale: &str,
    cache: &mut DefinitionCache,
) -> Result<ParsedAdmx, AdmxError> {
    let base_dir = match Path::new(path).parent() {
        Some(result) => result.display().to_string(),
        None => String::from("."),
    };
    let tables = cache.tables(&base_dir, requested_locale);

    let xml = match read_xml(path) {
        Ok(result) => result,
        Err(err) => {
            error!("[admx] Could not read ADMX file {path}: {err:?}");
            return Err(AdmxError::ReadAdmx);
        }
    };
    let root = match parse_xml_tree(&xml) {
        Ok(result) => result,
        Err(err) => {
            warn!("[admx] ADMX parse error: {path}: {err:?}");
            return Err(AdmxError::ParseAdmx);
        }
    };

    Ok(parse_admx_document(&root, &tables))
}

/// Extract categories and policies from a parsed ADMX document
pub(crate) fn parse_admx_document(root: &XmlNode, tables: &LocaleTables) -> ParsedAdmx {
    ParsedAdmx {
        locale: tables.locale.clone(),
        categories: parse_categories(root, tables),
        policies: parse_policies(root, tables),
    }
}

fn parse_categories(root: &XmlNode, tables: &LocaleTables) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for block in root.descendants("categories") {
        for category in block.children_named("category") {
            let id = match category.attribute("name") {
                Some(result) if !result.is_empty() => result,
                _ => continue,
            };
            let parent = category
                .children_named("parentCategory")
                .last()
                .and_then(|parent| norm_ref(parent.attribute("ref")));

            let entry = Category {
                id: id.to_string(),
                display_name: tables.resolve_string(category.attribute("displayName")),
                parent,
                inherited_ids: Vec::new(),
            };
            // A later declaration in the same file replaces an earlier one
            match categories.iter_mut().find(|existing| existing.id == entry.id) {
                Some(existing) => *existing = entry,
                None => categories.push(entry),
            }
        }
    }
    categories
}

fn parse_policies(root: &XmlNode, tables: &LocaleTables) -> Vec<RawPolicy> {
    let mut policies = Vec::new();
    for block in root.descendants("policies") {
        for policy in block.children_named("policy") {
            let category_ref = policy
                .children
                .iter()
                .filter(|child| child.name == "category" || child.name == "parentCategory")
                .find_map(|child| norm_ref(child.attribute("ref")));

            policies.push(RawPolicy {
                class: policy.attribute("class").unwrap_or_default().trim().to_string(),
                category_ref,
                policy: parse_policy_record(policy, tables),
            });
        }
    }
    policies
}

#[cfg(test)]
mod tests {
    use super::{norm_ref, parse_admx_file};
    use crate::policies::cache::DefinitionCache;
    use std::path::PathBuf;

    #[test]
    fn test_norm_ref() {
        assert_eq!(norm_ref(Some("BaseALT:ALT_System")).unwrap(), "ALT_System");
        assert_eq!(norm_ref(Some(" ALT_System ")).unwrap(), "ALT_System");
        assert_eq!(norm_ref(Some("vendor: ")), None);
        assert_eq!(norm_ref(Some("")), None);
        assert_eq!(norm_ref(None), None);
    }

    #[test]
    fn test_parse_admx_file() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("tests/test_data/policies/basic/updates.admx");
        let mut cache = DefinitionCache::new();

        let result =
            parse_admx_file(&test_location.display().to_string(), "en-US", &mut cache).unwrap();
        assert_eq!(result.locale, "en-US");
        assert_eq!(result.categories.len(), 2);
        assert_eq!(result.categories[0].id, "Updates");
        assert_eq!(
            result.categories[0].display_name.as_deref(),
            Some("Software Updates")
        );
        assert_eq!(result.categories[1].parent.as_deref(), Some("Updates"));

        assert_eq!(result.policies.len(), 4);
        let auto = &result.policies[0];
        assert_eq!(auto.class, "Machine");
        assert_eq!(auto.category_ref.as_deref(), Some("Updates"));
        assert_eq!(
            auto.policy.display_name.as_deref(),
            Some("Configure automatic updates")
        );
        assert!(auto
            .policy
            .values
            .contains_key("Software\\Policies\\Update\\Enabled"));

        let server = &result.policies[1];
        assert_eq!(server.class, "Both");
        assert_eq!(server.category_ref.as_deref(), Some("UpdateAdvanced"));
        assert_eq!(server.policy.values.len(), 4);
        assert_eq!(
            server.policy.header.supported_on.as_deref(),
            Some("Product version 2 or later")
        );
    }

    #[test]
    fn test_parse_bad_admx_file() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("tests/test_data/policies/merge/broken.admx");
        let mut cache = DefinitionCache::new();

        let result = parse_admx_file(&test_location.display().to_string(), "en-US", &mut cache);
        assert!(result.is_err());
    }
}
