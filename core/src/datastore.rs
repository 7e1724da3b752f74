use crate::{
    policies::{aggregate::build_policy_tree, cache::DefinitionCache},
    registry::store::PolicyFileStore,
    resolver::{
        find::find_paths,
        keys::split_key_path,
        path::{get_path, list_path_children},
        write::{resolve_class, set_value, SetRequest},
    },
};
use common::{policy::PolicyTree, registry::RegistryEntry};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

struct TreeState {
    definitions_path: Option<String>,
    tree: Arc<PolicyTree>,
    cache: DefinitionCache,
}

/// Aggregated policy definitions plus the Registry.pol store of a sysvol tree.
/// The tree is replaced as a whole under one lock, readers keep the tree they started with
pub struct PolicyDataStore {
    state: Mutex<TreeState>,
    store: PolicyFileStore,
    locale: String,
}

impl PolicyDataStore {
    /// Create an empty store. Nothing is loaded until `load_from_directory`
    pub fn new(sysvol_path: &str, locale: &str) -> PolicyDataStore {
        PolicyDataStore {
            state: Mutex::new(TreeState {
                definitions_path: None,
                tree: Arc::new(PolicyTree::default()),
                cache: DefinitionCache::new(),
            }),
            store: PolicyFileStore::new(sysvol_path),
            locale: locale.to_string(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TreeState> {
        // A panic while building leaves the previous tree in place
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Build the tree from a PolicyDefinitions directory and swap it in
    pub fn load_from_directory(&self, path: &str) -> bool {
        let mut state = self.lock_state();
        state.definitions_path = Some(path.to_string());
        match build_policy_tree(path, &self.locale, &mut state.cache) {
            Ok(tree) => {
                info!(
                    "[datastore] Loaded {} policies from {path}",
                    tree.meta.total_policies
                );
                state.tree = Arc::new(tree);
                true
            }
            Err(err) => {
                error!("[datastore] Failed to load policy definitions from {path}: {err}");
                false
            }
        }
    }

    /// Rebuild from the last loaded directory with fresh ADML tables
    pub fn reload(&self) -> bool {
        let path = {
            let mut state = self.lock_state();
            debug!(
                "[datastore] Dropping {} cached locale tables",
                state.cache.len()
            );
            state.cache.clear();
            state.definitions_path.clone()
        };
        match path {
            Some(result) => self.load_from_directory(&result),
            None => {
                warn!("[datastore] Reload requested before any definitions were loaded");
                false
            }
        }
    }

    /// Current tree
    pub fn tree(&self) -> Arc<PolicyTree> {
        self.lock_state().tree.clone()
    }

    /// Whether Registry.pol files can be changed
    pub fn is_writable(&self) -> bool {
        self.store.is_available()
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        get_path(&self.tree(), path)
    }

    pub fn list_children(&self, path: &str) -> Vec<String> {
        list_path_children(&self.tree(), path)
    }

    /// Write one registry value for a GPO. See `set_value` for how the value and metadata are read
    pub fn set(
        &self,
        path: &str,
        value: &str,
        gpo: &str,
        target: Option<&str>,
        metadata_path: Option<&str>,
    ) -> bool {
        let request = SetRequest {
            path,
            value,
            gpo,
            target,
            metadata_path,
        };
        match set_value(&self.tree(), &self.store, &request) {
            Ok(_) => true,
            Err(err) => {
                error!("[datastore] Failed to set {path} in {gpo}: {err}");
                false
            }
        }
    }

    /// Read a value straight from Registry.pol. `path` is `<registry key>\<value name>`
    pub fn get_current_value(
        &self,
        path: &str,
        gpo: &str,
        target: Option<&str>,
    ) -> Option<RegistryEntry> {
        let class = resolve_class(target, None);
        let (key_path, value_name) = split_key_path(path);
        let (data, reg_type) = self.store.get(gpo, class, &key_path, &value_name)?;
        Some(RegistryEntry {
            key_path,
            value_name,
            value_type: reg_type.name(),
            data,
        })
    }

    /// Remove a value from Registry.pol. Missing values are not an error
    pub fn delete_value(&self, path: &str, gpo: &str, target: Option<&str>) -> bool {
        if gpo.trim().is_empty() {
            error!("[datastore] GPO identifier is required to delete {path}");
            return false;
        }
        let class = resolve_class(target, None);
        let (key_path, value_name) = split_key_path(path);
        debug!("[datastore] Deleting {class}\\{key_path}\\{value_name} in {gpo}");
        self.store.delete(gpo, class, &key_path, &value_name)
    }

    pub fn find(&self, pattern: &str, search_type: &str) -> Vec<String> {
        find_paths(&self.tree(), pattern, search_type)
    }

    /// The whole tree as pretty printed JSON
    pub fn tree_json(&self) -> Option<String> {
        match serde_json::to_string_pretty(self.tree().as_ref()) {
            Ok(result) => Some(result),
            Err(err) => {
                error!("[datastore] Could not serialize policy tree: {err:?}");
                None
            }
        }
    }
}
