//! Logical path normalization.
//!
//! Logical paths are platform-independent and always use forward slashes,
//! even on Windows. Every lookup in the VFS goes through [`normalize`]
//! first, so `"/docs/readme.md"`, `"docs\\readme.md"` and
//! `"docs/./readme.md/"` all name the same file.
//!
//! The canonical form of "this directory" is `"."`.
//!
//! # Examples
//!
//! ```
//! use embedfs::path::normalize;
//!
//! assert_eq!(normalize("/a/b/"), "a/b");
//! assert_eq!(normalize("a\\b\\..\\c"), "a/c");
//! assert_eq!(normalize("/"), ".");
//! ```

/// Canonical logical path of a directory's own root.
pub const ROOT: &str = ".";

/// Normalizes a logical path.
///
/// Converts backslashes to forward slashes, collapses `.` and `..`
/// segments, and strips the leading and trailing slash. Empty and
/// root-only inputs (`""`, `"."`, `"/"`) all normalize to `"."`.
///
/// A `..` that would climb above a rooted path is dropped; on a relative
/// path it is kept, so `"../a"` stays `"../a"`. The function is idempotent.
///
/// # Examples
///
/// ```
/// use embedfs::path::normalize;
///
/// assert_eq!(normalize(""), ".");
/// assert_eq!(normalize("/../a"), "a");
/// assert_eq!(normalize("../a"), "../a");
/// assert_eq!(normalize(&normalize("x//y/./z/")), normalize("x//y/./z/"));
/// ```
#[must_use]
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let rooted = unified.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        ROOT.to_string()
    } else {
        segments.join("/")
    }
}

/// Returns `true` if a normalized path denotes the directory itself.
#[must_use]
pub fn is_root(normalized: &str) -> bool {
    normalized == ROOT
}

/// Splits a normalized path into its first segment and the remainder.
///
/// The remainder is `"."` when the path has a single segment.
///
/// # Examples
///
/// ```
/// use embedfs::path::split_first;
///
/// assert_eq!(split_first("a/b/c"), ("a", "b/c"));
/// assert_eq!(split_first("a"), ("a", "."));
/// ```
#[must_use]
pub fn split_first(normalized: &str) -> (&str, &str) {
    normalized
        .split_once('/')
        .map_or((normalized, ROOT), |(first, rest)| (first, rest))
}

/// Splits a normalized path into its parent directory and base name.
///
/// # Examples
///
/// ```
/// use embedfs::path::split_parent;
///
/// assert_eq!(split_parent("a/b/c.txt"), ("a/b", "c.txt"));
/// assert_eq!(split_parent("c.txt"), (".", "c.txt"));
/// ```
#[must_use]
pub fn split_parent(normalized: &str) -> (&str, &str) {
    normalized
        .rsplit_once('/')
        .map_or((ROOT, normalized), |(parent, name)| (parent, name))
}

/// Returns the last segment of a path, or `"."` for the root.
#[must_use]
pub fn base_name(path: &str) -> String {
    let normalized = normalize(path);
    let (_, name) = split_parent(&normalized);
    name.to_string()
}

/// Joins two logical paths and normalizes the result.
///
/// # Examples
///
/// ```
/// use embedfs::path::join;
///
/// assert_eq!(join(".", "docs"), "docs");
/// assert_eq!(join("static", "docs/readme.md"), "static/docs/readme.md");
/// ```
#[must_use]
pub fn join(base: &str, rest: &str) -> String {
    if is_root(&normalize(base)) {
        normalize(rest)
    } else {
        normalize(&format!("{base}/{rest}"))
    }
}

/// Converts a physical relative path into slash-separated form.
pub(crate) fn to_slash(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
