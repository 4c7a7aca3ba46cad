// SPDX-License-Identifier: MIT

//! Path utilities for absolute, `/`-separated volume paths.
//!
//! All functions are no_std + alloc safe. Paths are never normalised
//! beyond dropping empty segments: `/a//b/` names the same entry as `/a/b`.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// Longest name an entry can hold, in bytes (the on-disk field keeps one
/// more byte for the NUL terminator).
pub const MAX_NAME_LEN: usize = 31;

/// Join two path components with `/`, ensuring no duplicate slash
pub fn join_paths(base: &str, part: &str) -> String {
    let mut out = String::new();
    out.push_str(base.trim_end_matches('/'));
    out.push('/');
    out.push_str(part.trim_start_matches('/'));
    out
}

/// Splits a path into its components, using `/` as separator.
///
/// Returns a Vec of non-empty components.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Returns `true` for a non-empty path starting with `/`.
#[inline]
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Returns `true` if the path names the root directory (`/`, `//`, ...).
pub fn is_root_path(path: &str) -> bool {
    is_absolute(path) && path.bytes().all(|b| b == b'/')
}

/// Splits an absolute path into its parent components and its leaf name.
///
/// Returns `None` for the root path, which has no leaf.
///
/// Example: `/docs/notes.txt` → (`["docs"]`, `notes.txt`).
pub fn split_parent(path: &str) -> Option<(Vec<&str>, &str)> {
    let mut parts = split_path(path);
    let leaf = parts.pop()?;
    Some((parts, leaf))
}

/// Checks that `name` can be stored as an entry name.
///
/// Returns a short reason on failure.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("Empty name");
    }
    if name.len() > MAX_NAME_LEN {
        return Err("Name longer than 31 bytes");
    }
    if name.bytes().any(|b| b == 0 || b == b'/') {
        return Err("Name contains a reserved character");
    }
    if name == "." || name == ".." {
        return Err("Reserved name");
    }
    Ok(())
}
