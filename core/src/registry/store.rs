use super::{
    error::RegistryError,
    pol::{build_pol, parse_pol, PolEntry},
    types::RegType,
    value::{decode_value, encode_value},
};
use crate::filesystem::{
    directory::is_directory,
    files::{delete_file, is_file, read_file, write_file_atomic},
};
use common::{
    policy::PolicyClass,
    registry::{RegistryEntry, RegistryValue},
};
use log::{debug, error, info};
use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
};

/// Registry values of one Registry.pol file: key path -> value name -> (data, type)
pub(crate) type PolicyEntries = BTreeMap<String, BTreeMap<String, (RegistryValue, RegType)>>;

pub(crate) const POL_FILE_NAME: &str = "Registry.pol";

/// Whether the store can touch Registry.pol files at all
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoreCapability {
    Available,
    Unavailable(String),
}

/// Reads and rewrites the Registry.pol files of GPOs under a sysvol directory
#[derive(Debug, Clone)]
pub(crate) struct PolicyFileStore {
    sysvol_root: PathBuf,
    capability: StoreCapability,
}

impl PolicyFileStore {
    /// Open the store. The sysvol root must be an existing directory
    pub(crate) fn new(sysvol_root: &str) -> PolicyFileStore {
        let capability = if is_directory(sysvol_root) {
            StoreCapability::Available
        } else {
            error!("[registry] Sysvol directory {sysvol_root} does not exist, Registry.pol operations are disabled");
            StoreCapability::Unavailable(format!("sysvol directory {sysvol_root} does not exist"))
        };

        PolicyFileStore {
            sysvol_root: PathBuf::from(sysvol_root),
            capability,
        }
    }

    pub(crate) fn is_available(&self) -> bool {
        self.capability == StoreCapability::Available
    }

    /// Location of the Registry.pol file for a GPO and policy class
    pub(crate) fn pol_file_path(&self, gpo_path: &str, class: PolicyClass) -> PathBuf {
        self.sysvol_root
            .join(gpo_path)
            .join(class.as_str())
            .join(POL_FILE_NAME)
    }

    /// Split a path to a `Machine|User/Registry.pol` file into its GPO directory and class.
    /// The GPO directory is sysvol relative when the file lives under the sysvol root
    pub(crate) fn pol_file_target(&self, gpo_path: &str) -> Option<(String, PolicyClass)> {
        let path = Path::new(gpo_path);
        if path.file_name()? != POL_FILE_NAME {
            return None;
        }

        let parent = path.parent()?;
        let parent_name = parent.file_name()?.to_string_lossy().to_string();
        let file_class = match PolicyClass::from_target(&parent_name) {
            Some(result) if parent_name == result.as_str() => result,
            _ => return None,
        };

        let gpo_dir = parent.parent().unwrap_or(Path::new(""));
        let gpo = match gpo_dir.strip_prefix(&self.sysvol_root) {
            Ok(relative) => relative.display().to_string(),
            Err(_) => gpo_dir.display().to_string(),
        };
        Some((gpo, file_class))
    }

    /// Find the Registry.pol file for a GPO. Plain GPO paths must stay inside the sysvol root,
    /// only an explicit Registry.pol path may point elsewhere
    fn locate(&self, gpo_path: &str, class: PolicyClass) -> Result<PathBuf, RegistryError> {
        if let Some((gpo, file_class)) = self.pol_file_target(gpo_path) {
            return Ok(self.pol_file_path(&gpo, file_class));
        }

        let escapes = Path::new(gpo_path).components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if escapes {
            error!("[registry] GPO path {gpo_path} must be relative to the sysvol root");
            return Err(RegistryError::BadGpoPath);
        }
        Ok(self.pol_file_path(gpo_path, class))
    }

    /// Read every value of a Registry.pol file. Missing or corrupt files are empty
    pub(crate) fn read(&self, gpo_path: &str, class: PolicyClass) -> PolicyEntries {
        if let Err(err) = self.check_available() {
            error!("[registry] Cannot read Registry.pol: {err}");
            return PolicyEntries::new();
        }
        match self.locate(gpo_path, class) {
            Ok(path) => load_entries(&path),
            Err(_) => PolicyEntries::new(),
        }
    }

    /// Set one value and rewrite the file
    pub(crate) fn upsert(
        &self,
        gpo_path: &str,
        class: PolicyClass,
        key_path: &str,
        value_name: &str,
        data: RegistryValue,
        reg_type: RegType,
    ) -> bool {
        if let Err(err) = self.check_available() {
            error!("[registry] Cannot update policy {key_path}\\{value_name}: {err}");
            return false;
        }
        let path = match self.locate(gpo_path, class) {
            Ok(result) => result,
            Err(_) => return false,
        };

        // A corrupt file is replaced by the new value
        let mut entries = load_entries(&path);
        entries
            .entry(key_path.to_string())
            .or_default()
            .insert(value_name.to_string(), (data, reg_type));

        save_entries(&path, &entries)
    }

    /// Get one value
    pub(crate) fn get(
        &self,
        gpo_path: &str,
        class: PolicyClass,
        key_path: &str,
        value_name: &str,
    ) -> Option<(RegistryValue, RegType)> {
        let entries = self.read(gpo_path, class);
        let found = entries
            .get(key_path)
            .and_then(|values| values.get(value_name))
            .cloned();
        if found.is_none() {
            debug!("[registry] Policy value not found: {key_path}\\{value_name}");
        }
        found
    }

    /// Remove one value. The file is deleted when no values remain. Missing values are not an error
    pub(crate) fn delete(
        &self,
        gpo_path: &str,
        class: PolicyClass,
        key_path: &str,
        value_name: &str,
    ) -> bool {
        if let Err(err) = self.check_available() {
            error!("[registry] Cannot delete policy {key_path}\\{value_name}: {err}");
            return false;
        }
        let path = match self.locate(gpo_path, class) {
            Ok(result) => result,
            Err(_) => return false,
        };
        let path_str = path.display().to_string();
        if !is_file(&path_str) {
            debug!("[registry] Registry.pol file not found at {path_str}");
            return true;
        }

        let mut entries = load_entries(&path);
        let removed = match entries.get_mut(key_path) {
            Some(values) => {
                let removed = values.remove(value_name).is_some();
                if values.is_empty() {
                    entries.remove(key_path);
                }
                removed
            }
            None => false,
        };
        if !removed {
            debug!("[registry] Policy value not found: {key_path}\\{value_name}");
            return true;
        }

        if !entries.is_empty() {
            return save_entries(&path, &entries);
        }

        match delete_file(&path_str) {
            Ok(_) => {
                info!("[registry] Deleted empty Registry.pol file at {path_str}");
                true
            }
            Err(err) => {
                error!("[registry] Failed to delete empty Registry.pol file at {path_str}: {err}");
                false
            }
        }
    }

    fn check_available(&self) -> Result<(), RegistryError> {
        match &self.capability {
            StoreCapability::Available => Ok(()),
            StoreCapability::Unavailable(reason) => {
                debug!("[registry] Store unavailable: {reason}");
                Err(RegistryError::Unavailable)
            }
        }
    }
}

fn load_entries(path: &Path) -> PolicyEntries {
    match read_entries(path) {
        Ok(result) => result,
        Err(err) => {
            error!(
                "[registry] Failed to read Registry.pol file at {}: {err}",
                path.display()
            );
            PolicyEntries::new()
        }
    }
}

fn save_entries(path: &Path, entries: &PolicyEntries) -> bool {
    match write_entries(path, entries) {
        Ok(count) => {
            info!(
                "[registry] Wrote Registry.pol file at {} with {count} values",
                path.display()
            );
            true
        }
        Err(err) => {
            error!(
                "[registry] Failed to write Registry.pol file at {}: {err}",
                path.display()
            );
            false
        }
    }
}

/// Parse a Registry.pol file into values. A missing file has no values
pub(crate) fn read_entries(path: &Path) -> Result<PolicyEntries, RegistryError> {
    let path_str = path.display().to_string();
    if !is_file(&path_str) {
        debug!("[registry] Registry.pol file not found at {path_str}");
        return Ok(PolicyEntries::new());
    }

    let data = match read_file(&path_str) {
        Ok(result) => result,
        Err(err) => {
            error!("[registry] Could not read {path_str}: {err:?}");
            return Err(RegistryError::Parser);
        }
    };
    let pol = parse_pol(&data)?;
    debug!(
        "[registry] Parsed {} version {} records from {path_str}",
        pol.entry_count(),
        pol.version
    );

    let mut entries = PolicyEntries::new();
    for entry in pol.entries {
        let value = decode_value(&entry.data, &entry.reg_type);
        entries
            .entry(entry.key)
            .or_default()
            .insert(entry.value_name, (value, entry.reg_type));
    }
    debug!(
        "[registry] Read {} registry keys from {path_str}",
        entries.len()
    );
    Ok(entries)
}

/// Every value of a Registry.pol file in file order
pub(crate) fn list_pol_file(path: &str) -> Result<Vec<RegistryEntry>, RegistryError> {
    let data = match read_file(path) {
        Ok(result) => result,
        Err(err) => {
            error!("[registry] Could not read {path}: {err:?}");
            return Err(RegistryError::Parser);
        }
    };
    let pol = parse_pol(&data)?;

    let entries = pol
        .entries
        .into_iter()
        .map(|entry| RegistryEntry {
            data: decode_value(&entry.data, &entry.reg_type),
            value_type: entry.reg_type.name(),
            key_path: entry.key,
            value_name: entry.value_name,
        })
        .collect();
    Ok(entries)
}

fn write_entries(path: &Path, entries: &PolicyEntries) -> Result<usize, RegistryError> {
    let mut records = Vec::new();
    for (key, values) in entries {
        for (value_name, (value, reg_type)) in values {
            let data = encode_value(value, reg_type)?;
            records.push(PolEntry {
                key: key.clone(),
                value_name: value_name.clone(),
                reg_type: *reg_type,
                data,
            });
        }
    }

    let bytes = build_pol(&records)?;
    if let Err(err) = write_file_atomic(&path.display().to_string(), &bytes) {
        error!("[registry] Could not save {}: {err:?}", path.display());
        return Err(RegistryError::WriteFile);
    }
    Ok(records.len())
}
