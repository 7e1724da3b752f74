use common::policy::Category;
use log::warn;
use std::collections::BTreeMap;

/// Remove parent links that form cycles. Each cycle is cut at the category whose parent closes it
pub(crate) fn break_cycles(categories: &mut BTreeMap<String, Category>) {
    let ids: Vec<String> = categories.keys().cloned().collect();
    for id in ids {
        let mut path: Vec<String> = Vec::new();
        let mut current = id;
        loop {
            if let Some(start) = path.iter().position(|seen| *seen == current) {
                let mut cycle = path[start..].to_vec();
                cycle.push(current.clone());
                warn!(
                    "[policies] Circular parent reference detected: {}",
                    cycle.join(" -> ")
                );

                let broken = &cycle[cycle.len() - 2];
                if let Some(category) = categories.get_mut(broken) {
                    category.parent = None;
                    warn!("[policies] Removed parent from category '{broken}' to break cycle");
                }
                break;
            }

            let parent = categories
                .get(&current)
                .and_then(|category| category.parent.clone());
            path.push(current);
            match parent {
                Some(parent) if categories.contains_key(&parent) => current = parent,
                _ => break,
            }
        }
    }
}

/// Break cycles then fill every category's sorted `inherited_ids` from the parent links
pub(crate) fn link_category_inherited(categories: &mut BTreeMap<String, Category>) {
    break_cycles(categories);

    let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for category in categories.values() {
        if let Some(parent) = &category.parent {
            if categories.contains_key(parent) {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(category.id.clone());
            }
        }
    }

    for category in categories.values_mut() {
        let mut inherited = children.remove(&category.id).unwrap_or_default();
        inherited.sort();
        category.inherited_ids = inherited;
    }
}

#[cfg(test)]
mod tests {
    use super::{break_cycles, link_category_inherited};
    use common::policy::Category;
    use std::collections::BTreeMap;

    fn categories(links: &[(&str, Option<&str>)]) -> BTreeMap<String, Category> {
        let mut categories = BTreeMap::new();
        for (id, parent) in links {
            categories.insert(
                id.to_string(),
                Category {
                    id: id.to_string(),
                    display_name: None,
                    parent: parent.map(str::to_string),
                    inherited_ids: vec![String::from("stale")],
                },
            );
        }
        categories
    }

    #[test]
    fn test_break_two_node_cycle() {
        let mut cats = categories(&[("A", Some("B")), ("B", Some("A")), ("C", Some("A"))]);
        break_cycles(&mut cats);
        assert_eq!(cats["A"].parent.as_deref(), Some("B"));
        assert_eq!(cats["B"].parent, None);
        assert_eq!(cats["C"].parent.as_deref(), Some("A"));
    }

    #[test]
    fn test_break_self_cycle() {
        let mut cats = categories(&[("A", Some("A"))]);
        break_cycles(&mut cats);
        assert_eq!(cats["A"].parent, None);
    }

    #[test]
    fn test_link_inherited() {
        let mut cats = categories(&[
            ("Root", None),
            ("Zulu", Some("Root")),
            ("Alpha", Some("Root")),
            ("Lost", Some("Missing")),
        ]);
        link_category_inherited(&mut cats);
        assert_eq!(cats["Root"].inherited_ids, vec!["Alpha", "Zulu"]);
        assert!(cats["Alpha"].inherited_ids.is_empty());
        assert!(cats["Lost"].inherited_ids.is_empty());
        assert_eq!(cats["Lost"].parent.as_deref(), Some("Missing"));
    }
}
