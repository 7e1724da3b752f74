use common::policy::{PolicyHeader, PolicyMetadata};

/// Split a registry path at its last backslash. Forward slashes are accepted as separators
pub(crate) fn split_key_path(raw_key_path: &str) -> (String, String) {
    let normalized = raw_key_path.replace('/', "\\");
    let trimmed = normalized.trim_matches('\\');
    match trimmed.rsplit_once('\\') {
        Some((parent, last)) => (parent.to_string(), last.to_string()),
        None => (String::new(), trimmed.to_string()),
    }
}

/// Work out the registry key and value name for a write.
/// The element's own key and value name win over the policy header
pub(crate) fn resolve_key_and_value_name(
    raw_key_path: &str,
    header: Option<&PolicyHeader>,
    element: Option<&PolicyMetadata>,
) -> (String, String) {
    let meta_key = element
        .and_then(PolicyMetadata::key)
        .map(str::to_string)
        .or_else(|| header.and_then(|header| non_empty(header.key.as_deref())))
        .map(|key| key.replace('/', "\\").trim_matches('\\').to_string());
    let meta_value_name = element
        .and_then(PolicyMetadata::value_name)
        .map(str::to_string)
        .or_else(|| header.and_then(|header| non_empty(header.value_name.as_deref())));

    let full = raw_key_path
        .replace('/', "\\")
        .trim_matches('\\')
        .to_string();
    let (parent, last) = split_key_path(raw_key_path);

    if meta_key.as_deref() == Some(parent.as_str()) {
        return (parent, last);
    }
    match meta_value_name {
        Some(value_name) if value_name == last => (parent, value_name),
        // Mismatch is tolerated, the path is used as the key
        Some(value_name) => (full, value_name),
        None => (parent, last),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(str::to_string)
}
