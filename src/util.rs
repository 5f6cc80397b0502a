use std::path::Path;

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

/// Reduce a channel spec to a file-name-safe label (`"DE, ES"` → `"DE_ES"`).
pub fn file_label(spec: &str) -> String {
    let label: String = spec
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let parts: Vec<&str> = label.split('_').filter(|part| !part.is_empty()).collect();
    if parts.is_empty() {
        return crate::channels::DEFAULT_CHANNEL.to_string();
    }
    parts.join("_")
}
