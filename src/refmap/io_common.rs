use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Resolves a path from the configuration against the directory holding
/// the configuration file. Absolute paths are kept as they are.
pub fn resolve_path(root: &Path, file_path: &str) -> String {
    root.join(file_path).display().to_string()
}
