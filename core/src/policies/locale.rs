use crate::filesystem::directory::{has_files, is_directory, list_directories};
use log::debug;
use std::path::Path;

pub(crate) const DEFAULT_LOCALE: &str = "en-US";

/// Pick the locale directory next to an ADMX file.
/// Order: requested locale, `en-US`, first locale directory (sorted) with ADML files, then `en-US` as a label
pub(crate) fn pick_locale(base_dir: &str, requested: &str) -> String {
    if !requested.is_empty() && locale_has_adml(base_dir, requested) {
        return requested.to_string();
    }
    if locale_has_adml(base_dir, DEFAULT_LOCALE) {
        if !requested.is_empty() && requested != DEFAULT_LOCALE {
            debug!("[adml] Locale {requested} not found in {base_dir}, using {DEFAULT_LOCALE}");
        }
        return DEFAULT_LOCALE.to_string();
    }

    let dirs = list_directories(base_dir).unwrap_or_default();
    for dir in dirs {
        if !has_files(&dir, "adml") {
            continue;
        }
        if let Some(name) = Path::new(&dir).file_name() {
            let locale = name.to_string_lossy().to_string();
            debug!("[adml] Falling back to locale {locale} in {base_dir}");
            return locale;
        }
    }

    DEFAULT_LOCALE.to_string()
}

fn locale_has_adml(base_dir: &str, locale: &str) -> bool {
    let dir = Path::new(base_dir).join(locale).display().to_string();
    is_directory(&dir) && has_files(&dir, "adml")
}
