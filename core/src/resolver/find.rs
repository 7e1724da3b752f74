use super::path::encode_segment;
use common::policy::{CategoryNode, PolicyBucket, PolicyClass, PolicyRecord, PolicyTree};
use log::warn;

/// What a search pattern is matched against
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SearchType {
    Name,
    Category,
    Key,
    All,
}

impl SearchType {
    pub(crate) fn from_name(name: &str) -> Option<SearchType> {
        match name.trim().to_lowercase().as_str() {
            "name" => Some(SearchType::Name),
            "category" => Some(SearchType::Category),
            "key" => Some(SearchType::Key),
            "all" | "" => Some(SearchType::All),
            _ => None,
        }
    }

    fn names(&self) -> bool {
        matches!(self, SearchType::Name | SearchType::All)
    }

    fn categories(&self) -> bool {
        matches!(self, SearchType::Category | SearchType::All)
    }

    fn keys(&self) -> bool {
        matches!(self, SearchType::Key | SearchType::All)
    }
}

/// Case-insensitive substring search. Returns logical paths accepted by `get`
pub(crate) fn find_paths(tree: &PolicyTree, pattern: &str, search_type: &str) -> Vec<String> {
    let search = match SearchType::from_name(search_type) {
        Some(result) => result,
        None => {
            warn!("[resolver] Unknown search type {search_type}");
            return Vec::new();
        }
    };
    let needle = pattern.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for class in [PolicyClass::Machine, PolicyClass::User] {
        let class_tree = tree.class_tree(class);
        let prefix = format!("/{}", class.as_str());
        for node in &class_tree.categories {
            search_category(node, &prefix, &needle, search, &mut found);
        }
        search_bucket(
            &class_tree.uncategorized_policies,
            &format!("{prefix}/uncategorizedPolicies"),
            &needle,
            search,
            &mut found,
        );
    }
    found
}

fn search_category(
    node: &CategoryNode,
    parent: &str,
    needle: &str,
    search: SearchType,
    found: &mut Vec<String>,
) {
    let path = format!("{parent}/{}", encode_segment(&node.category));
    if search.categories() && node.category.to_lowercase().contains(needle) {
        found.push(path.clone());
    }
    search_bucket(
        &node.policies,
        &format!("{path}/policies"),
        needle,
        search,
        found,
    );
    for child in &node.inherited {
        search_category(child, &path, needle, search, found);
    }
}

fn search_bucket(
    bucket: &PolicyBucket,
    parent: &str,
    needle: &str,
    search: SearchType,
    found: &mut Vec<String>,
) {
    for (key, record) in bucket.iter() {
        if (search.names() && name_matches(record, needle))
            || (search.keys() && key_matches(record, needle))
        {
            found.push(format!("{parent}/{}", encode_segment(key)));
        }
    }
}

fn name_matches(record: &PolicyRecord, needle: &str) -> bool {
    [
        record.display_name.as_deref(),
        record.header.name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|name| name.to_lowercase().contains(needle))
}

fn key_matches(record: &PolicyRecord, needle: &str) -> bool {
    record
        .values
        .keys()
        .map(String::as_str)
        .chain(record.header.key.as_deref())
        .any(|key| key.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::{find_paths, SearchType};
    use crate::resolver::path::{get_path, tests::sample_tree};

    #[test]
    fn test_search_type() {
        assert_eq!(SearchType::from_name("NAME"), Some(SearchType::Name));
        assert_eq!(SearchType::from_name(""), Some(SearchType::All));
        assert_eq!(SearchType::from_name("value"), None);
    }

    #[test]
    fn test_find_by_name() {
        let tree = sample_tree();
        let found = find_paths(&tree, "value POLICY", "name");
        assert_eq!(found, vec!["/Machine/SomeCategory/SubCat/policies/My\\Value"]);
        assert!(get_path(&tree, &found[0]).is_some());

        let found = find_paths(&tree, "slash", "name");
        assert_eq!(found, vec!["/Machine/SomeCategory/SubCat/policies/Sub:a%2Fb"]);
        assert!(get_path(&tree, &found[0]).is_some());
    }

    #[test]
    fn test_find_by_category() {
        let tree = sample_tree();
        let found = find_paths(&tree, "sub", "category");
        assert_eq!(found, vec!["/Machine/SomeCategory/SubCat"]);
    }

    #[test]
    fn test_find_uncategorized_and_unknown_type() {
        let tree = sample_tree();
        let found = find_paths(&tree, "free", "all");
        assert_eq!(found, vec!["/Machine/uncategorizedPolicies/__UNCATEGORIZED__:Free"]);
        assert!(get_path(&tree, &found[0]).is_some());

        assert!(find_paths(&tree, "free", "value").is_empty());
        assert!(find_paths(&tree, " ", "all").is_empty());
    }
}
