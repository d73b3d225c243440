//! Share path normalization.
//!
//! The share protocol addresses files with backslash-delimited paths that
//! are relative to the share root. Pipelines hand us paths with forward
//! slashes, OS-native separators, and often the share name as the first
//! segment; these helpers turn them into the protocol form. None of them
//! perform I/O or fail.

use std::path::MAIN_SEPARATOR;

/// Separator used by the share protocol.
pub const PROTOCOL_SEPARATOR: char = '\\';

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\' || c == MAIN_SEPARATOR
}

/// Replace every `/` and OS-native separator with `\`.
pub fn to_protocol_separators(path: &str) -> String {
    path.chars()
        .map(|c| if is_separator(c) { PROTOCOL_SEPARATOR } else { c })
        .collect()
}

/// Remove a leading `share` segment so the path becomes share-relative.
///
/// The share name is compared literally and must end at a segment boundary:
/// `public\docs` loses `public`, `publicity\docs` is left alone. With
/// `only_if_prefix` unset, separators before the share name are tolerated
/// (`\public\docs` → `docs`). Separators left at the head after stripping
/// are dropped. Paths without the share at their head are returned as-is.
pub fn strip_share_name(path: &str, share: &str, only_if_prefix: bool) -> String {
    if share.is_empty() {
        return path.to_string();
    }

    let candidate = if only_if_prefix {
        path
    } else {
        path.trim_start_matches(is_separator)
    };

    match candidate.strip_prefix(share) {
        Some(rest) if rest.is_empty() || rest.starts_with(is_separator) => {
            rest.trim_start_matches(is_separator).to_string()
        }
        _ => path.to_string(),
    }
}

/// Split a path into its non-empty components.
///
/// `/`, `\` and the OS-native separator all delimit components; empty and
/// `.` components are dropped.
pub fn split_components(path: &str) -> Vec<&str> {
    path.split(is_separator)
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

/// Join the configured base path with a relative path in protocol form.
pub fn join_base(base: &str, relative: &str) -> String {
    split_components(base)
        .into_iter()
        .chain(split_components(relative))
        .collect::<Vec<_>>()
        .join("\\")
}
