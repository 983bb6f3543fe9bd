//! Core data types for the source model.
//!
//! Entities live in the [`Project`](super::Project) arena and refer to each
//! other by index. Nothing here owns a syntax tree: declarations keep byte
//! spans into their file's retained source text.

use serde::{Deserialize, Serialize};

/// Sentinel reported for a property without an explicit user-defined type.
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

// ─── Arena ids ───────────────────────────────────────────────────────

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Index into [`Project::files`](super::Project::files).
    FileId
);
arena_id!(
    /// Index into [`Project::classes`](super::Project::classes).
    ClassId
);
arena_id!(
    /// Index into [`Project::functions`](super::Project::functions).
    FunctionId
);

// ─── Spans ───────────────────────────────────────────────────────────

/// Byte range into the owning file's source text.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn of(node: tree_sitter::Node) -> Self {
        Self { start: node.start_byte(), end: node.end_byte() }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Self {
        Self { start: self.start.min(other.start), end: self.end.max(other.end) }
    }
}

// ─── File ────────────────────────────────────────────────────────────

/// An `import` directive as written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Qualified name without the trailing `.*`, e.g. `com.example.Test1`.
    pub path: String,
    /// `import a.b.C as D` → `Some("D")`
    pub alias: Option<String>,
    /// `import a.b.*`
    pub wildcard: bool,
}

impl Import {
    /// Last segment of the path (`com.example.Test1` → `Test1`).
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    /// Empty when the file has no `package` header.
    pub package: String,
    pub imports: Vec<Import>,
    /// Top-level classes in declaration order.
    pub classes: Vec<ClassId>,
    /// Top-level (free) functions in declaration order.
    pub functions: Vec<FunctionId>,
    /// Retained source; spans of the file's entities index into it.
    pub source: String,
}

// ─── Class ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub file: FileId,
    /// Enclosing class for nested declarations and companion objects.
    pub parent: Option<ClassId>,
    pub package: String,
    /// `object` / `companion object` rather than `class` / `interface`.
    pub is_object: bool,
    pub doc: Option<Span>,
    pub span: Span,
    /// Constructor parameters first, then body-declared properties.
    pub properties: Vec<Property>,
    pub classes: Vec<ClassId>,
    pub functions: Vec<FunctionId>,
}

// ─── Function ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub file: FileId,
    /// `None` for top-level functions.
    pub class: Option<ClassId>,
    pub doc: Option<Span>,
    pub span: Span,
    /// 1-based line of the declaration.
    pub line: u32,
    /// Annotation names as written, e.g. `Doc4k` for `@Doc4k`.
    pub annotations: Vec<String>,
    /// Call sites in pre-order of the body, nested local functions and
    /// lambdas included. Empty for declarations without a body.
    pub calls: Vec<CallSite>,
}

impl Function {
    /// `name` matches an annotation either exactly or as its last segment.
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| {
            a == name || a.rsplit_once('.').is_some_and(|(_, last)| last == name)
        })
    }
}

// ─── Property ────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    /// Declared type as written, minus type arguments and `?`.
    /// `None` when the declaration relies on inference.
    pub type_name: Option<String>,
    /// Declared as a `val`/`var` parameter of the primary constructor.
    pub from_constructor: bool,
}

impl Property {
    pub fn declared_type(&self) -> &str {
        self.type_name.as_deref().unwrap_or(UNKNOWN_TYPE)
    }
}

// ─── Call site ───────────────────────────────────────────────────────

/// A call expression classified at build time, so resolution never has to
/// re-parse source text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CallSite {
    /// `foo(...)`. `name` is `None` when the callee is not a plain
    /// identifier, e.g. `factory()()` or `(block)()`.
    Simple { name: Option<String>, line: u32 },
    /// `receiver.member(...)`; `receiver` is the compacted text of whatever
    /// precedes the last member access.
    Navigation { receiver: String, member: String, line: u32 },
}

impl CallSite {
    pub fn line(&self) -> u32 {
        match self {
            Self::Simple { line, .. } | Self::Navigation { line, .. } => *line,
        }
    }

    /// Name of the function being called, if one is identifiable.
    pub fn target_name(&self) -> Option<&str> {
        match self {
            Self::Simple { name, .. } => name.as_deref(),
            Self::Navigation { member, .. } => Some(member),
        }
    }
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple { name: Some(name), .. } => write!(f, "{}()", name),
            Self::Simple { name: None, .. } => write!(f, "<anonymous>()"),
            Self::Navigation { receiver, member, .. } => write!(f, "{}.{}()", receiver, member),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_site_display() {
        let simple = CallSite::Simple { name: Some("validate".into()), line: 3 };
        let anonymous = CallSite::Simple { name: None, line: 4 };
        let nav = CallSite::Navigation { receiver: "repo".into(), member: "save".into(), line: 5 };
        assert_eq!(simple.to_string(), "validate()");
        assert_eq!(anonymous.to_string(), "<anonymous>()");
        assert_eq!(nav.to_string(), "repo.save()");
        assert_eq!(nav.target_name(), Some("save"));
        assert_eq!(anonymous.target_name(), None);
        assert_eq!(nav.line(), 5);
    }

    #[test]
    fn test_call_site_json_is_tagged() {
        let nav = CallSite::Navigation { receiver: "repo".into(), member: "save".into(), line: 5 };
        let json = serde_json::to_value(&nav).unwrap();
        assert_eq!(json["kind"], "navigation");
        assert_eq!(json["receiver"], "repo");
    }

    #[test]
    fn test_span_cover() {
        let a = Span { start: 10, end: 20 };
        let b = Span { start: 2, end: 12 };
        assert_eq!(a.cover(b), Span { start: 2, end: 20 });
    }

    #[test]
    fn test_property_declared_type_sentinel() {
        let typed = Property { name: "repo".into(), type_name: Some("Repo".into()), from_constructor: true };
        let inferred = Property { name: "count".into(), type_name: None, from_constructor: false };
        assert_eq!(typed.declared_type(), "Repo");
        assert_eq!(inferred.declared_type(), UNKNOWN_TYPE);
    }

    #[test]
    fn test_function_has_annotation() {
        let function = Function {
            name: "test".into(),
            file: FileId(0),
            class: None,
            doc: None,
            span: Span::default(),
            line: 1,
            annotations: vec!["Doc4k".into(), "com.example.Entry".into()],
            calls: Vec::new(),
        };
        assert!(function.has_annotation("Doc4k"));
        assert!(function.has_annotation("Entry"));
        assert!(function.has_annotation("com.example.Entry"));
        assert!(!function.has_annotation("Doc"));
    }

    #[test]
    fn test_import_simple_name() {
        let import = Import { path: "com.example.Test1".into(), alias: None, wildcard: false };
        assert_eq!(import.simple_name(), "Test1");
    }
}
