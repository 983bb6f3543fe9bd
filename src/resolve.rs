//! Class resolution from qualifier text.
//!
//! This is a heuristic, not type inference. A qualifier (a declared property
//! type or a receiver written in source) is matched against imports and
//! packages first, then against every class in the project by simple name.
//! On an ambiguous simple name the global fallback returns the first class in
//! file order; that trades precision for recall and is deliberate.

use tracing::trace;

use crate::model::{ClassId, FileId, Project};

pub struct SymbolResolver<'p> {
    project: &'p Project,
}

impl<'p> SymbolResolver<'p> {
    pub fn new(project: &'p Project) -> Self {
        Self { project }
    }

    /// Resolve `qualifier` in the lexical context of `from` (its file's
    /// imports and package).
    pub fn resolve_class(&self, from: ClassId, qualifier: &str) -> Option<ClassId> {
        self.resolve_class_in_file(self.project.class(from).file, qualifier)
    }

    /// Resolve `qualifier` in the lexical context of `file`.
    ///
    /// Phase 1 tries each candidate package (see [`Self::candidate_packages`])
    /// for a class with the wanted simple name; phase 2 falls back to the first
    /// class with the qualifier's simple name anywhere. `None` means
    /// unresolvable and is not an error.
    ///
    /// A qualified receiver (`data.Repo`) falls back by its last segment only.
    pub fn resolve_class_in_file(&self, file: FileId, qualifier: &str) -> Option<ClassId> {
        let qualifier = qualifier.trim();
        if qualifier.is_empty() {
            return None;
        }

        for (package, simple) in self.candidate_packages(file, qualifier) {
            let found = self.project.class_name_index.get(&simple)
                .and_then(|ids| ids.iter().copied().find(|&c| self.project.class(c).package == package));
            if let Some(class) = found {
                trace!(qualifier, package = %package, class = %self.project.qualified_class_name(class), "Resolved by package");
                return Some(class);
            }
        }

        let found = self.project.class_name_index.get(simple_name(qualifier))
            .and_then(|ids| ids.first().copied());
        if let Some(class) = found {
            trace!(qualifier, class = %self.project.qualified_class_name(class), "Resolved by global name fallback");
        }
        found
    }

    /// `(package, simple class name)` pairs to try, most specific first:
    /// 1. an import whose path is `qualifier` or ends with `.qualifier`, or
    ///    whose alias is the qualifier's first segment
    /// 2. the qualifier's own prefix when it is written fully qualified
    /// 3. the file's own package
    /// 4. packages of wildcard imports
    pub fn candidate_packages(&self, file: FileId, qualifier: &str) -> Vec<(String, String)> {
        let source_file = self.project.file(file);
        let simple = simple_name(qualifier).to_string();
        let mut out: Vec<(String, String)> = Vec::new();
        let mut push = |package: String, name: String| {
            if !out.iter().any(|(p, n)| *p == package && *n == name) {
                out.push((package, name));
            }
        };

        let first_segment = qualifier.split('.').next().unwrap_or(qualifier);
        for import in source_file.imports.iter().filter(|i| !i.wildcard) {
            if import.path == qualifier {
                push(package_of(&import.path).to_string(), simple.clone());
            } else if let Some(prefix) = import.path.strip_suffix(qualifier).and_then(|p| p.strip_suffix('.')) {
                push(prefix.to_string(), simple.clone());
            } else if import.alias.as_deref() == Some(first_segment) {
                // `import a.b.C as D`: `D` → a.b.C, `D.Inner` → Inner
                let name = if qualifier.contains('.') { simple.clone() } else { import.simple_name().to_string() };
                let package = if qualifier.contains('.') { import.path.clone() } else { package_of(&import.path).to_string() };
                push(package, name);
            }
        }

        if qualifier.contains('.') {
            push(package_of(qualifier).to_string(), simple.clone());
        }

        push(source_file.package.clone(), simple.clone());

        for import in source_file.imports.iter().filter(|i| i.wildcard) {
            push(import.path.clone(), simple.clone());
        }

        out
    }
}

/// Last `.`-separated segment.
fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Everything before the last `.`; empty for an unqualified name.
fn package_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn class_named(project: &Project, name: &str) -> ClassId {
        project.class_ids()
            .find(|&c| project.qualified_class_name(c) == name)
            .unwrap_or_else(|| panic!("class {} not in project", name))
    }

    #[test]
    fn test_simple_name_and_package_of() {
        assert_eq!(simple_name("com.example.Test1"), "Test1");
        assert_eq!(simple_name("Test1"), "Test1");
        assert_eq!(package_of("com.example.Test1"), "com.example");
        assert_eq!(package_of("Test1"), "");
    }

    #[test]
    fn test_resolve_through_import() {
        let project = Project::from_sources(&[
            ("a/Main.kt", "package app\nimport com.example.Repo\nclass Service(val repo: Repo)\n"),
            ("b/Repo.kt", "package other\nclass Repo\n"),
            ("c/Repo.kt", "package com.example\nclass Repo\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        let resolved = resolver.resolve_class(service, "Repo").unwrap();
        assert_eq!(project.class(resolved).package, "com.example",
            "import must win over the first global match");
    }

    #[test]
    fn test_resolve_same_package_without_import() {
        let project = Project::from_sources(&[
            ("x/Repo.kt", "package other\nclass Repo\n"),
            ("y/Repo.kt", "package app\nclass Repo\n"),
            ("y/Service.kt", "package app\nclass Service\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        let resolved = resolver.resolve_class(service, "Repo").unwrap();
        assert_eq!(project.class(resolved).package, "app");
    }

    #[test]
    fn test_resolve_global_fallback_first_in_file_order() {
        let project = Project::from_sources(&[
            ("a/Service.kt", "package app\nclass Service\n"),
            ("b/Repo.kt", "package first\nclass Repo\n"),
            ("c/Repo.kt", "package second\nclass Repo\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        let resolved = resolver.resolve_class(service, "Repo").unwrap();
        assert_eq!(project.class(resolved).package, "first");
    }

    #[test]
    fn test_import_suffix_match_is_segment_aware() {
        // `com.example.MyRepo` must not be taken as an import of `Repo`.
        let project = Project::from_sources(&[
            ("a/Main.kt", "package app\nimport com.example.MyRepo\nclass Service\n"),
            ("b/Repo.kt", "package com.example\nclass Repo\n"),
            ("c/Repo.kt", "package app\nclass Repo\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        let resolved = resolver.resolve_class(service, "Repo").unwrap();
        assert_eq!(project.class(resolved).package, "app");
    }

    #[test]
    fn test_resolve_import_alias() {
        let project = Project::from_sources(&[
            ("a/Main.kt", "package app\nimport com.example.Repository as Repo\nclass Service\n"),
            ("b/Repository.kt", "package com.example\nclass Repository\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        let resolved = resolver.resolve_class(service, "Repo").unwrap();
        assert_eq!(project.class(resolved).name, "Repository");
    }

    #[test]
    fn test_resolve_wildcard_import_before_global_fallback() {
        let project = Project::from_sources(&[
            ("a/Repo.kt", "package unrelated\nclass Repo\n"),
            ("b/Main.kt", "package app\nimport com.example.*\nclass Service\n"),
            ("c/Repo.kt", "package com.example\nclass Repo\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        let resolved = resolver.resolve_class(service, "Repo").unwrap();
        assert_eq!(project.class(resolved).package, "com.example");
    }

    #[test]
    fn test_resolve_fully_qualified_qualifier() {
        let project = Project::from_sources(&[
            ("a/Repo.kt", "package first\nclass Repo\n"),
            ("b/Repo.kt", "package second\nclass Repo\n"),
            ("c/Main.kt", "package app\nclass Service\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        let resolved = resolver.resolve_class(service, "second.Repo").unwrap();
        assert_eq!(project.class(resolved).package, "second");
    }

    #[test]
    fn test_unresolvable_returns_none() {
        let project = Project::from_sources(&[
            ("a/Main.kt", "package app\nimport test.TestWithPackage\nclass Service\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        assert!(resolver.resolve_class(service, "TestWithPackage").is_none());
        assert!(resolver.resolve_class(service, "").is_none());
        assert!(resolver.resolve_class(service, "UNKNOWN").is_none());
    }

    #[test]
    fn test_candidate_packages_order() {
        let project = Project::from_sources(&[
            ("a/Main.kt", "package app\nimport com.example.Repo\nimport util.*\nclass Service\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);

        let candidates = resolver.candidate_packages(FileId(0), "Repo");
        let packages: Vec<&str> = candidates.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(packages, vec!["com.example", "app", "util"]);
    }

    #[test]
    fn test_resolve_from_free_function_file_context() {
        let project = Project::from_sources(&[
            ("a/Main.kt", "package app\n\nimport com.example.Repo\n\nfun main() { Repo.load() }\n"),
            ("b/Repo.kt", "package other\nclass Repo\n"),
            ("c/Repo.kt", "package com.example\n\nobject Repo {\n    fun load() {}\n}\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);

        let resolved = resolver.resolve_class_in_file(FileId(0), "Repo").unwrap();
        assert_eq!(project.class(resolved).package, "com.example");
        assert!(project.class(resolved).is_object);
    }

    #[test]
    fn test_qualified_qualifier_falls_back_by_last_segment() {
        let project = Project::from_sources(&[
            ("a/Main.kt", "package app\nclass Service\n"),
            ("b/Repo.kt", "package data\nclass Repo\n"),
        ]).unwrap();
        let resolver = SymbolResolver::new(&project);
        let service = class_named(&project, "Service");

        let resolved = resolver.resolve_class(service, "legacy.Repo").unwrap();
        assert_eq!(project.class(resolved).package, "data");
    }
}
