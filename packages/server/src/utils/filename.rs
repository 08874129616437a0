use std::path::Path;

/// Reduce a client-supplied filename to a storage-safe flat name.
///
/// Takes the final path component, replaces whitespace with underscores,
/// and drops everything outside a conservative ASCII set. Falls back to
/// `"file"` when nothing survives.
pub fn sanitize(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let cleaned: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}
