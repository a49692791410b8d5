//! String path helpers for server-side paths.
//!
//! Paths belong to the server, which may run on either platform, so they are
//! kept as strings and never routed through `std::path`: both `/` and `\` must
//! be understood no matter where the picker runs.

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Separator style used by `path`: `\` if it contains one, `/` otherwise.
pub fn separator_of(path: &str) -> char {
    if path.contains('\\') { '\\' } else { '/' }
}

/// Whether `path` already ends with a separator of either style.
pub fn ends_with_separator(path: &str) -> bool {
    path.ends_with(SEPARATORS)
}

/// Appends `child` to `dir`, reusing the separator style of `dir`.
///
/// No separator is added when `dir` already ends with one. An empty `dir`
/// yields `child` unchanged.
pub fn join_child(dir: &str, child: &str) -> String {
    if dir.is_empty() {
        return child.to_owned();
    }
    let mut out = String::with_capacity(dir.len() + 1 + child.len());
    out.push_str(dir);
    if !ends_with_separator(dir) {
        out.push(separator_of(dir));
    }
    out.push_str(child);
    out
}

/// Last separator-delimited segment of `path`, splitting on either style.
pub fn basename(path: &str) -> &str {
    path.rsplit(SEPARATORS).next().unwrap_or(path)
}

/// Everything before the last separator of `path`'s own style.
///
/// Returns an empty string when there is no such separator.
pub fn containing_dir(path: &str) -> &str {
    match path.rfind(separator_of(path)) {
        Some(i) => &path[..i],
        None => "",
    }
}
