//! Folder path normalization.
//!
//! Every path indexed by the size table is a normalized folder path: it
//! starts with `/` and ends with `/`. Arbitrary strings are repaired,
//! never rejected.

use compact_str::CompactString;

/// Normalize an arbitrary string into a folder path.
///
/// A missing leading or trailing separator is added; the empty string
/// becomes the root `/`.
pub fn normalize_folder(path: &str) -> CompactString {
    if path.is_empty() || path == "/" {
        return CompactString::const_new("/");
    }

    let mut normalized = CompactString::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(path);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Return the nearest enclosing folder of `path`, or `None` at the root.
///
/// Works for both folder paths (`/a/b/` → `/a/`) and resource paths
/// (`/a/b/file.txt` → `/a/b/`). The result always carries a trailing
/// separator.
pub fn parent_folder(path: &str) -> Option<CompactString> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        // `path` was the root (or all separators) — no parent.
        return None;
    }
    let cut = trimmed.rfind('/')?;
    Some(CompactString::new(&trimmed[..=cut]))
}

/// Whether `path` is `prefix` itself or a descendant of it.
///
/// Both arguments must already be normalized; the trailing separator on
/// `prefix` guarantees that `/ab/` is not treated as being under `/a/`.
pub fn is_under(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_separators() {
        assert_eq!(normalize_folder("/a/b"), "/a/b/");
        assert_eq!(normalize_folder("/a/b/"), "/a/b/");
        assert_eq!(normalize_folder("a/b"), "/a/b/");
        assert_eq!(normalize_folder(""), "/");
        assert_eq!(normalize_folder("/"), "/");
    }

    #[test]
    fn test_parent_folder() {
        assert_eq!(parent_folder("/a/b/").as_deref(), Some("/a/"));
        assert_eq!(parent_folder("/a/").as_deref(), Some("/"));
        assert_eq!(parent_folder("/a/b/file.txt").as_deref(), Some("/a/b/"));
        assert_eq!(parent_folder("/file.txt").as_deref(), Some("/"));
        assert_eq!(parent_folder("/"), None);
        assert_eq!(parent_folder(""), None);
    }

    #[test]
    fn test_is_under_respects_separator_boundary() {
        assert!(is_under("/a/b/", "/a/"));
        assert!(is_under("/a/", "/a/"));
        // Sibling with a shared name prefix is not a descendant.
        assert!(!is_under("/ab/", "/a/"));
    }
}
