use super::index::ClassIndex;
use common::policy::{Category, CategoryNode, ClassTree, UNCATEGORIZED};
use std::collections::BTreeMap;

/// Build the category forest of one class. Every category is present even without policies
pub(crate) fn build_class_tree(
    categories: &BTreeMap<String, Category>,
    mut index: ClassIndex,
) -> ClassTree {
    // BTreeMap keys are already in id order
    let roots = categories.values().filter(|category| match &category.parent {
        Some(parent) => !categories.contains_key(parent),
        None => true,
    });

    let mut nodes: Vec<CategoryNode> = roots
        .map(|category| make_node(category, categories, &mut index))
        .collect();
    nodes.sort_by(|a, b| a.category.cmp(&b.category));

    ClassTree {
        categories: nodes,
        uncategorized_policies: index.remove(UNCATEGORIZED).unwrap_or_default(),
    }
}

fn make_node(
    category: &Category,
    categories: &BTreeMap<String, Category>,
    index: &mut ClassIndex,
) -> CategoryNode {
    let mut inherited: Vec<CategoryNode> = category
        .inherited_ids
        .iter()
        .filter_map(|child| categories.get(child))
        .map(|child| make_node(child, categories, index))
        .collect();
    inherited.sort_by(|a, b| a.category.cmp(&b.category));

    let name = match &category.display_name {
        Some(display) if !display.is_empty() => display.clone(),
        _ => category.id.clone(),
    };

    CategoryNode {
        category: name,
        policies: index.remove(&category.id).unwrap_or_default(),
        inherited,
    }
}

#[cfg(test)]
mod tests {
    use super::build_class_tree;
    use crate::policies::{cycles::link_category_inherited, index::ClassIndex};
    use common::policy::{Category, PolicyBucket, PolicyHeader, PolicyRecord, UNCATEGORIZED};
    use std::collections::BTreeMap;

    fn category(id: &str, display: Option<&str>, parent: Option<&str>) -> (String, Category) {
        (
            id.to_string(),
            Category {
                id: id.to_string(),
                display_name: display.map(str::to_string),
                parent: parent.map(str::to_string),
                inherited_ids: Vec::new(),
            },
        )
    }

    fn bucket(key: &str) -> PolicyBucket {
        let mut bucket = PolicyBucket::new();
        bucket.insert(
            key.to_string(),
            PolicyRecord {
                display_name: Some(key.to_string()),
                header: PolicyHeader::default(),
                values: BTreeMap::new(),
            },
        );
        bucket
    }

    #[test]
    fn test_build_class_tree() {
        let mut categories: BTreeMap<String, Category> = [
            category("B", Some("Alpha"), None),
            category("A", Some("Zulu"), None),
            category("Child2", Some("Second"), Some("B")),
            category("Child1", None, Some("B")),
            category("Orphan", Some("Mid"), Some("Missing")),
        ]
        .into_iter()
        .collect();
        link_category_inherited(&mut categories);

        let mut index = ClassIndex::new();
        index.insert(String::from("Child2"), bucket("Child2:Policy"));
        index.insert(String::from(UNCATEGORIZED), bucket("__UNCATEGORIZED__:Free"));

        let tree = build_class_tree(&categories, index);
        let names: Vec<&str> = tree
            .categories
            .iter()
            .map(|node| node.category.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zulu"]);

        let children: Vec<&str> = tree.categories[0]
            .inherited
            .iter()
            .map(|node| node.category.as_str())
            .collect();
        assert_eq!(children, vec!["Child1", "Second"]);
        assert_eq!(tree.categories[0].inherited[1].policies.len(), 1);
        assert!(tree.categories[2].policies.is_empty());
        assert!(tree.uncategorized_policies.contains_key("__UNCATEGORIZED__:Free"));
    }
}
