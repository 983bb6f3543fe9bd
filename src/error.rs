//! Unified error type for model building, tracing and the CLI.

use thiserror::Error;

/// All errors that can occur while building the model or tracing a flow.
///
/// Resolution misses are not errors: they are logged and recorded on the
/// [`Trace`](crate::trace::Trace). Only invariant violations and I/O land here.
#[derive(Error, Debug)]
pub enum FlowError {
    /// I/O error (file read/write, directory access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (`--json` output)
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The Kotlin grammar could not be loaded into the parser
    #[error("Failed to load Kotlin grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// Directory does not exist
    #[error("Directory does not exist: {0}")]
    DirNotFound(String),

    /// tree-sitter returned no tree (cancelled or no language set)
    #[error("Parser produced no syntax tree for {path}")]
    ParseFailed { path: String },

    /// The syntax tree has a shape the model builder cannot accept,
    /// e.g. a declaration without a name token.
    #[error("Malformed syntax tree in {path}:{line}: {kind} {reason}")]
    MalformedTree {
        path: String,
        line: u32,
        kind: String,
        reason: String,
    },

    /// A helper was handed a node of the wrong kind
    #[error("Expected a '{expected}' node, found '{found}'")]
    UnexpectedNode {
        expected: &'static str,
        found: String,
    },

    /// No function matches the requested entry point
    #[error("{}", function_not_found_message(.name, .class.as_deref()))]
    FunctionNotFound { name: String, class: Option<String> },

    /// Invalid regex pattern
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Mutually exclusive flags or other argument validation error
    #[error("{0}")]
    InvalidArgs(String),
}

fn function_not_found_message(name: &str, class: Option<&str>) -> String {
    match class {
        Some(cls) => format!("Function '{}' not found in class '{}'. Run 'kflow list' to see candidates.", name, cls),
        None => format!("Function '{}' not found. Run 'kflow list' to see candidates.", name),
    }
}
