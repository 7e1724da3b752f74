use super::tables::LocaleTables;

/// Localize a `supportedOn` reference such as `windows:SUPPORTED_Win7`.
/// Tries the id without its vendor prefix, then without `SUPPORTED_`, then any string id ending
/// with it (case-sensitive first). Unknown references are returned unchanged
pub(crate) fn localize_supported_on(tables: &LocaleTables, reference: Option<&str>) -> Option<String> {
    let original = reference?;
    let trimmed = original.trim();
    if trimmed.is_empty() {
        return None;
    }

    let tail = match trimmed.split_once(':') {
        Some((_, result)) => result,
        None => trimmed,
    };

    let mut candidates = vec![tail];
    if let Some(stripped) = tail.strip_prefix("SUPPORTED_") {
        candidates.push(stripped);
    }
    for candidate in candidates {
        if let Some(text) = tables.strings.get(candidate) {
            return Some(text.clone());
        }
    }

    // Sorted so the match does not depend on hash order
    let mut ids: Vec<&String> = tables.strings.keys().collect();
    ids.sort();

    if let Some(id) = ids.iter().find(|id| id.ends_with(tail)) {
        return tables.strings.get(id.as_str()).cloned();
    }
    let tail_lower = tail.to_lowercase();
    if let Some(id) = ids
        .iter()
        .find(|id| id.to_lowercase().ends_with(&tail_lower))
    {
        return tables.strings.get(id.as_str()).cloned();
    }

    Some(original.to_string())
}

#[cfg(test)]
mod tests {
    use super::localize_supported_on;
    use crate::policies::tables::LocaleTables;

    fn tables() -> LocaleTables {
        let mut tables = LocaleTables::default();
        for (id, text) in [
            ("SUPPORTED_Win7", "At least Windows 7"),
            ("Vista", "At least Windows Vista"),
            ("ALT_SUPPORTED_ProductVersion2", "Product version 2 or later"),
            ("alt_supported_lower", "Lower case id"),
        ] {
            tables.strings.insert(id.to_string(), text.to_string());
        }
        tables
    }

    #[test]
    fn test_exact_match() {
        let result = localize_supported_on(&tables(), Some("windows:SUPPORTED_Win7"));
        assert_eq!(result.unwrap(), "At least Windows 7");
    }

    #[test]
    fn test_supported_prefix_stripped() {
        let result = localize_supported_on(&tables(), Some("SUPPORTED_Vista"));
        assert_eq!(result.unwrap(), "At least Windows Vista");
    }

    #[test]
    fn test_suffix_match() {
        let result = localize_supported_on(&tables(), Some("SUPPORTED_ProductVersion2"));
        assert_eq!(result.unwrap(), "Product version 2 or later");

        let result = localize_supported_on(&tables(), Some("vendor:SUPPORTED_LOWER"));
        assert_eq!(result.unwrap(), "Lower case id");
    }

    #[test]
    fn test_unknown_reference() {
        let result = localize_supported_on(&tables(), Some("vendor:Nothing"));
        assert_eq!(result.unwrap(), "vendor:Nothing");
        assert_eq!(localize_supported_on(&tables(), Some("  ")), None);
        assert_eq!(localize_supported_on(&tables(), None), None);
    }
}
