use super::{
    locale::pick_locale,
    tables::{load_locale_tables, LocaleTables},
};
use log::debug;
use std::{collections::HashMap, path::Path, sync::Arc};

/// ADML tables already loaded, keyed by (ADMX directory, chosen locale). Grows without eviction
#[derive(Debug, Default)]
pub(crate) struct DefinitionCache {
    tables: HashMap<(String, String), Arc<LocaleTables>>,
}

impl DefinitionCache {
    pub(crate) fn new() -> DefinitionCache {
        DefinitionCache {
            tables: HashMap::new(),
        }
    }

    /// Get the tables for the ADMX files in `base_dir`, loading them on first use
    pub(crate) fn tables(&mut self, base_dir: &str, requested_locale: &str) -> Arc<LocaleTables> {
        let locale = pick_locale(base_dir, requested_locale);
        let cache_key = (base_dir.to_string(), locale.clone());
        if let Some(tables) = self.tables.get(&cache_key) {
            return tables.clone();
        }

        let locale_dir = Path::new(base_dir).join(&locale).display().to_string();
        debug!("[adml] Loading ADML tables from {locale_dir}");
        let tables = Arc::new(load_locale_tables(&locale_dir, &locale));
        self.tables.insert(cache_key, tables.clone());
        tables
    }

    pub(crate) fn len(&self) -> usize {
        self.tables.len()
    }

    pub(crate) fn clear(&mut self) {
        self.tables.clear();
    }
}
