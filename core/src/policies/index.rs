use common::policy::{Category, PolicyBucket, PolicyClass, RawPolicy, UNCATEGORIZED};
use log::warn;
use std::collections::BTreeMap;

/// Category id -> policies, for one class
pub(crate) type ClassIndex = BTreeMap<String, PolicyBucket>;

#[derive(Debug, Default)]
pub(crate) struct PolicyIndex {
    pub(crate) machine: ClassIndex,
    pub(crate) user: ClassIndex,
}

impl PolicyIndex {
    fn class_mut(&mut self, class: PolicyClass) -> &mut ClassIndex {
        match class {
            PolicyClass::Machine => &mut self.machine,
            PolicyClass::User => &mut self.user,
        }
    }

    /// Add a policy under `category:display`, adding `_2`, `_3`, ... on collisions
    fn add(&mut self, class: PolicyClass, category: &str, policy: &RawPolicy) {
        let record = &policy.policy;
        let display = [
            record.display_name.as_deref(),
            record.header.display_name.as_deref(),
            record.header.name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty())
        .unwrap_or("unknown");

        let bucket = self.class_mut(class).entry(category.to_string()).or_default();
        let mut key = format!("{category}:{display}");
        if bucket.contains_key(&key) {
            let mut suffix = 2;
            while bucket.contains_key(&format!("{key}_{suffix}")) {
                suffix += 1;
            }
            key = format!("{key}_{suffix}");
        }
        bucket.insert(key, record.clone());
    }
}

/// Group policies by class and category. Unknown categories go to the uncategorized bucket
pub(crate) fn build_policy_index(
    policies: &[RawPolicy],
    categories: &BTreeMap<String, Category>,
) -> PolicyIndex {
    let mut index = PolicyIndex::default();
    for policy in policies {
        let mut category = policy
            .category_ref
            .as_deref()
            .unwrap_or(UNCATEGORIZED);
        if category != UNCATEGORIZED && !categories.contains_key(category) {
            warn!(
                "[policies] Policy '{}' references unknown category '{category}', moving to uncategorized",
                policy.policy.display_name.as_deref().unwrap_or("unknown")
            );
            category = UNCATEGORIZED;
        }

        match PolicyClass::from_target(&policy.class) {
            Some(class) if policy.class == class.as_str() => index.add(class, category, policy),
            // Both, empty, or anything unexpected applies to both hives
            _ => {
                index.add(PolicyClass::Machine, category, policy);
                index.add(PolicyClass::User, category, policy);
            }
        }
    }

    for bucket in index.machine.values_mut().chain(index.user.values_mut()) {
        bucket.sort_by_display_name();
    }
    index
}
