use crate::{
    filesystem::directory::{find_files, is_directory},
    utils::{
        encoding::read_xml,
        xml::{parse_xml_tree, XmlNode},
    },
};
use common::policy::PresentationDefaults;
use log::{error, warn};
use regex::Regex;
use std::{collections::HashMap, sync::LazyLock};

static STRING_REF: LazyLock<Option<Regex>> =
    LazyLock::new(|| reference_regex(r"^\$\(\s*string\.([A-Za-z0-9_.-]+)\s*\)$"));
static PRESENTATION_REF: LazyLock<Option<Regex>> =
    LazyLock::new(|| reference_regex(r"^\$\(\s*presentation\.([A-Za-z0-9_.-]+)\s*\)$"));

fn reference_regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(result) => Some(result),
        Err(err) => {
            error!("[adml] Bad reference regex: {pattern}, error: {err:?}");
            None
        }
    }
}

/// Presentation id -> control refId -> defaults
pub(crate) type PresentationTable = HashMap<String, HashMap<String, PresentationDefaults>>;

/// ADML string and presentation tables for one locale directory
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LocaleTables {
    pub(crate) locale: String,
    pub(crate) strings: HashMap<String, String>,
    pub(crate) presentations: PresentationTable,
}

impl LocaleTables {
    /// Resolve `$(string.X)` through the string table. Anything else, or a missing id, is returned as is
    pub(crate) fn resolve_string(&self, value: Option<&str>) -> Option<String> {
        let value = value?;
        if value.is_empty() {
            return None;
        }
        let captures = STRING_REF
            .as_ref()
            .and_then(|pattern| pattern.captures(value.trim()));
        let id = match captures {
            Some(captures) => captures.get(1).map(|id| id.as_str()),
            None => return Some(value.to_string()),
        };
        match id.and_then(|id| self.strings.get(id)) {
            Some(text) => Some(text.clone()),
            None => Some(value.to_string()),
        }
    }

    /// Controls of the presentation referenced as `$(presentation.X)`
    pub(crate) fn presentation(
        &self,
        reference: Option<&str>,
    ) -> Option<&HashMap<String, PresentationDefaults>> {
        let id = presentation_id(reference?)?;
        self.presentations.get(&id)
    }
}

/// Get `X` out of `$(presentation.X)`
pub(crate) fn presentation_id(value: &str) -> Option<String> {
    let captures = PRESENTATION_REF.as_ref()?.captures(value.trim())?;
    captures.get(1).map(|id| id.as_str().to_string())
}

/// Load every ADML file under a locale directory
pub(crate) fn load_locale_tables(locale_dir: &str, locale: &str) -> LocaleTables {
    let mut tables = LocaleTables {
        locale: locale.to_string(),
        ..Default::default()
    };
    if !is_directory(locale_dir) {
        warn!("[adml] Locale directory not found: {locale_dir}");
        return tables;
    }

    let files = match find_files(locale_dir, "adml") {
        Ok(result) => result,
        Err(err) => {
            warn!("[adml] Could not list ADML files in {locale_dir}: {err:?}");
            return tables;
        }
    };

    let mut documents = Vec::new();
    for path in files {
        match read_adml(&path) {
            Some(root) => documents.push(root),
            None => continue,
        }
    }

    // Strings first, presentation labels may reference them
    for root in &documents {
        collect_strings(root, &mut tables.strings);
    }
    for root in &documents {
        let mut presentations = std::mem::take(&mut tables.presentations);
        collect_presentations(root, &tables, &mut presentations);
        tables.presentations = presentations;
    }
    tables
}

fn read_adml(path: &str) -> Option<XmlNode> {
    let xml = match read_xml(path) {
        Ok(result) => result,
        Err(err) => {
            warn!("[adml] Could not read ADML file {path}: {err:?}");
            return None;
        }
    };
    match parse_xml_tree(&xml) {
        Ok(result) => Some(result),
        Err(err) => {
            warn!("[adml] ADML parse error: {path}: {err:?}");
            None
        }
    }
}

fn collect_strings(root: &XmlNode, strings: &mut HashMap<String, String>) {
    for string in root.descendants("string") {
        let id = match string.attribute("id") {
            Some(result) if !result.is_empty() => result,
            _ => continue,
        };
        strings.insert(id.to_string(), string.text.trim().to_string());
    }
}

fn collect_presentations(
    root: &XmlNode,
    tables: &LocaleTables,
    presentations: &mut PresentationTable,
) {
    for table in root.descendants("presentationTable") {
        for presentation in table.children_named("presentation") {
            let id = match presentation.attribute("id") {
                Some(result) if !result.is_empty() => result,
                _ => continue,
            };
            let slot = presentations.entry(id.to_string()).or_default();

            for control in &presentation.children {
                let ref_id = match control.attribute("refId") {
                    Some(result) if !result.is_empty() => result,
                    _ => continue,
                };
                let info = control_defaults(control, tables);
                if info.is_empty() {
                    continue;
                }

                let existing = slot.entry(ref_id.to_string()).or_default();
                if existing.label.is_none() {
                    existing.label = info.label;
                }
                if existing.default_item.is_none() {
                    existing.default_item = info.default_item;
                }
                if existing.default_value.is_none() {
                    existing.default_value = info.default_value;
                }
            }
        }
    }
}

/// Label and defaults of one presentation control such as `<textBox>` or `<dropdownList>`
fn control_defaults(control: &XmlNode, tables: &LocaleTables) -> PresentationDefaults {
    let mut label = None;
    let text = control.text.trim();
    if !text.is_empty() {
        label = tables.resolve_string(Some(text));
    } else if let Some(child) = control.child("label") {
        let text = child.text.trim();
        if !text.is_empty() {
            label = tables.resolve_string(Some(text));
        }
    }

    let default_value = match control.attribute("defaultValue") {
        Some(value) => Some(value.to_string()),
        None => control
            .child("defaultValue")
            .map(|child| child.text.trim().to_string()),
    };

    PresentationDefaults {
        label,
        default_item: control.attribute("defaultItem").map(str::to_string),
        default_value,
    }
}
