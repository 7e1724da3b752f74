use super::{
    cache::DefinitionCache,
    cycles::link_category_inherited,
    error::AdmxError,
    index::build_policy_index,
    parser::parse_admx_file,
    tree::build_class_tree,
};
use crate::filesystem::directory::{find_files, is_directory};
use common::policy::{Category, LocaleUsed, PolicyTree, RawPolicy, TreeMeta};
use log::{error, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// Parse every ADMX file under `path` (recursively) and build the Machine and User trees
pub(crate) fn build_policy_tree(
    path: &str,
    locale: &str,
    cache: &mut DefinitionCache,
) -> Result<PolicyTree, AdmxError> {
    if !is_directory(path) {
        error!("[policies] Policy definitions path does not exist: {path}");
        return Err(AdmxError::NotDirectory);
    }
    let base_dir = match Path::new(path).canonicalize() {
        Ok(result) => result.display().to_string(),
        Err(err) => {
            error!("[policies] Could not resolve policy definitions path {path}: {err:?}");
            return Err(AdmxError::NotDirectory);
        }
    };

    let files = match find_files(&base_dir, "admx") {
        Ok(result) => result,
        Err(err) => {
            error!("[policies] Could not list ADMX files in {base_dir}: {err:?}");
            return Err(AdmxError::ReadDirectory);
        }
    };

    let mut categories: BTreeMap<String, Category> = BTreeMap::new();
    let mut policies: Vec<RawPolicy> = Vec::new();
    let mut seen: HashSet<(String, Option<String>, String)> = HashSet::new();
    let mut duplicates_removed = 0;
    let mut used_locales = BTreeSet::new();

    for file in files {
        let parsed = match parse_admx_file(&file, locale, cache) {
            Ok(result) => result,
            Err(err) => {
                warn!("[policies] Skipping ADMX file {file}: {err:?}");
                continue;
            }
        };
        used_locales.insert(parsed.locale);

        for category in parsed.categories {
            match categories.get_mut(&category.id) {
                Some(existing) => merge_category(existing, category),
                None => {
                    categories.insert(category.id.clone(), category);
                }
            }
        }

        for policy in parsed.policies {
            if let Some(name) = &policy.policy.header.name {
                let key = (
                    policy.class.clone(),
                    policy.category_ref.clone(),
                    name.clone(),
                );
                if !seen.insert(key) {
                    duplicates_removed += 1;
                    continue;
                }
            }
            policies.push(policy);
        }
    }

    link_category_inherited(&mut categories);
    let index = build_policy_index(&policies, &categories);

    let locale_used = if used_locales.len() > 1 {
        LocaleUsed::Mixed(used_locales.into_iter().collect())
    } else {
        match used_locales.into_iter().next() {
            Some(single) => LocaleUsed::Single(single),
            None => LocaleUsed::Single(locale.to_string()),
        }
    };

    info!(
        "[policies] Loaded {} categories and {} policies from {base_dir} ({duplicates_removed} duplicates removed)",
        categories.len(),
        policies.len()
    );

    Ok(PolicyTree {
        meta: TreeMeta {
            base_dir,
            locale_requested: locale.to_string(),
            locale_used,
            total_categories: categories.len(),
            total_policies: policies.len(),
            duplicates_removed,
        },
        machine: build_class_tree(&categories, index.machine),
        user: build_class_tree(&categories, index.user),
    })
}

/// Merge a later declaration of a category into the first one.
/// The first parent and display name win, missing ones are filled in
pub(crate) fn merge_category(existing: &mut Category, incoming: Category) {
    if let (Some(current), Some(wanted)) = (&existing.parent, &incoming.parent) {
        if current != wanted {
            warn!(
                "[policies] Category parent conflict: '{}' has parent '{current}', new definition wants parent '{wanted}' (keeping existing)",
                existing.id
            );
        }
    }
    if let (Some(current), Some(wanted)) = (&existing.display_name, &incoming.display_name) {
        if !current.is_empty() && !wanted.is_empty() && current != wanted {
            warn!(
                "[policies] Category displayName conflict: '{}' has displayName '{current}', new definition wants '{wanted}' (keeping existing)",
                existing.id
            );
        }
    }

    if existing.parent.is_none() {
        existing.parent = incoming.parent;
    }
    if existing.display_name.as_deref().unwrap_or_default().is_empty()
        && incoming
            .display_name
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    {
        existing.display_name = incoming.display_name;
    }
}
