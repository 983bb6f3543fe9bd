//! # kflow: static call-flow tracing for Kotlin sources
//!
//! Builds a lightweight symbol model (files, classes, functions, properties)
//! from tree-sitter syntax trees and computes, for an entry function, the
//! ordered set of functions it transitively reaches. Resolution is purely
//! syntactic: declared property types, imports and a global by-name fallback.
//!
//! ## Library usage
//!
//! ```no_run
//! use kflow::model::build_project;
//! use kflow::trace::{trace, TraceOptions};
//!
//! let (project, _stats) = build_project("src", &["kt".to_string()]).unwrap();
//! let entry = project.find_functions("main", None)[0];
//! let flow = trace(&project, entry, &TraceOptions::default());
//! for entry in flow.entries(&project, true) {
//!     println!("{}", entry.text);
//! }
//! ```

use std::collections::HashSet;
use std::hash::Hash;

pub mod error;
pub mod model;
pub mod prompt;
pub mod render;
pub mod resolve;
pub mod trace;

pub use error::FlowError;

// ─── Paths & files ──────────────────────────────────────────────────

/// Strip the `\\?\` extended-length path prefix that Windows canonicalize adds.
#[must_use]
pub fn clean_path(p: &str) -> String {
    p.strip_prefix(r"\\?\").unwrap_or(p).to_string()
}

/// Read a file as a String, using lossy UTF-8 conversion for non-UTF8 files.
/// Returns `(content, was_lossy)` where `was_lossy` is true if replacement
/// characters were inserted.
pub fn read_file_lossy(path: &std::path::Path) -> std::io::Result<(String, bool)> {
    let raw = std::fs::read(path)?;
    match String::from_utf8(raw) {
        Ok(s) => Ok((s, false)),
        Err(e) => Ok((String::from_utf8_lossy(e.as_bytes()).into_owned(), true)),
    }
}

// ─── Deduplication ──────────────────────────────────────────────────

/// Keep the first occurrence of every key, preserving relative order.
///
/// # Examples
///
/// ```
/// use kflow::distinct;
///
/// let names = vec!["load", "validate", "load", "save", "validate"];
/// assert_eq!(distinct(names, |n| *n), vec!["load", "validate", "save"]);
/// ```
#[must_use]
pub fn distinct<T, K, I, F>(items: I, mut key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}


// ─── Property-based tests (proptest) ─────────────────────────────────
