//! Helpers for the `/`-separated paths used by archive entries and the VFS.
//!
//! VFS paths are always absolute and clean (`/`, `/Photos`, `/Photos/a.jpg`).
//! Archive entry names are relative; `..` segments that would climb above the
//! archive root are dropped so no entry can land outside its destination.

/// Normalizes a relative path: drops empty and `.` segments and resolves `..`.
pub fn clean_relative(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Normalizes into an absolute VFS path.
pub fn clean(path: &str) -> String {
    format!("/{}", clean_relative(path))
}

/// Joins `rel` under `base`; a leading `/` on `rel` does not reset to the root.
pub fn join(base: &str, rel: &str) -> String {
    clean(&format!("{}/{}", base, rel))
}

/// Splits a clean absolute path into (parent, name). The root has no name.
pub fn split(path: &str) -> (String, String) {
    let path = clean(path);
    match path.rfind('/') {
        Some(0) => ("/".to_string(), path[1..].to_string()),
        Some(i) => (path[..i].to_string(), path[i + 1..].to_string()),
        None => ("/".to_string(), path),
    }
}

/// The segments of a path, root excluded.
pub fn segments(path: &str) -> Vec<String> {
    clean_relative(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits an archive entry name on its first separator into (doctype, rest).
///
/// Entries without a separator have no doctype.
pub fn split_doctype(entry_name: &str) -> Option<(String, String)> {
    let cleaned = clean_relative(entry_name);
    let (doctype, rest) = cleaned.split_once('/')?;
    Some((doctype.to_string(), rest.to_string()))
}

/// Splits a file name into base and extension, Go-style: the extension starts
/// at the last dot. A leading dot alone does not start an extension.
pub fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}
