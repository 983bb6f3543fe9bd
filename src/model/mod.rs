//! Source model: arena-held files, classes and functions built from Kotlin
//! syntax trees, plus the directory-level project build.

mod parser_kotlin;
pub mod tree;
mod types;

pub use parser_kotlin::{classify_call, kotlin_parser};
pub use types::*;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ignore::WalkBuilder;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{clean_path, read_file_lossy, FlowError};

/// Extensions picked up by a directory build when none are given.
pub const DEFAULT_EXTENSIONS: &[&str] = &["kt", "kts"];

// ─── Project arena ──────────────────────────────────────────────────

/// Read-only (after build) model of a source tree.
///
/// Files own their top-level classes and functions, classes own nested
/// classes, member functions and properties; ownership is expressed by id
/// lists and every back-reference is an id as well.
#[derive(Debug, Default)]
pub struct Project {
    pub root: String,
    pub files: Vec<SourceFile>,
    pub classes: Vec<Class>,
    pub functions: Vec<Function>,
    /// class simple name -> class ids in arena order (file order, then
    /// pre-order within a file)
    pub class_name_index: HashMap<String, Vec<ClassId>>,
}

impl Project {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into(), ..Self::default() }
    }

    /// Build a project from in-memory `(path, source)` pairs, in order.
    /// The first malformed source aborts the build.
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, FlowError> {
        let mut parser = kotlin_parser()?;
        let mut project = Self::new(".");
        for (path, source) in sources {
            project.add_source(&mut parser, path, source.to_string())?;
        }
        Ok(project)
    }

    /// Parse one file and add its model. On error the project is unchanged.
    pub fn add_source(
        &mut self,
        parser: &mut tree_sitter::Parser,
        path: &str,
        source: String,
    ) -> Result<FileId, FlowError> {
        let tree = parser.parse(&source, None)
            .ok_or_else(|| FlowError::ParseFailed { path: path.to_string() })?;
        let model = parser_kotlin::build_file_model(self, path, source, &tree)?;
        Ok(self.commit(model))
    }

    fn commit(&mut self, model: parser_kotlin::FileModel) -> FileId {
        let file_id = FileId(self.files.len() as u32);
        let class_base = self.classes.len() as u32;
        debug_assert!(model.file.classes.iter().all(|c| c.0 >= class_base));

        for (offset, class) in model.classes.iter().enumerate() {
            self.class_name_index.entry(class.name.clone())
                .or_default()
                .push(ClassId(class_base + offset as u32));
        }
        self.classes.extend(model.classes);
        self.functions.extend(model.functions);
        self.files.push(model.file);
        file_id
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32).map(ClassId)
    }

    pub fn function_ids(&self) -> impl Iterator<Item = FunctionId> + '_ {
        (0..self.functions.len() as u32).map(FunctionId)
    }

    /// Source text covered by `span` in `file`.
    pub fn text(&self, file: FileId, span: Span) -> &str {
        self.file(file).source.get(span.start..span.end).unwrap_or("")
    }

    pub fn call_site_count(&self) -> usize {
        self.functions.iter().map(|f| f.calls.len()).sum()
    }

    /// Member functions of `class` named `name`, in declaration order.
    pub fn member_functions_named(&self, class: ClassId, name: &str) -> Vec<FunctionId> {
        self.class(class).functions.iter()
            .copied()
            .filter(|&f| self.function(f).name == name)
            .collect()
    }

    /// Top-level functions of `file` named `name`, in declaration order.
    pub fn top_level_functions_named(&self, file: FileId, name: &str) -> Vec<FunctionId> {
        self.file(file).functions.iter()
            .copied()
            .filter(|&f| self.function(f).name == name)
            .collect()
    }

    pub fn property(&self, class: ClassId, name: &str) -> Option<&Property> {
        self.class(class).properties.iter().find(|p| p.name == name)
    }

    /// `Outer.Inner` for nested classes, the plain name otherwise.
    pub fn qualified_class_name(&self, id: ClassId) -> String {
        let class = self.class(id);
        match class.parent {
            Some(parent) => format!("{}.{}", self.qualified_class_name(parent), class.name),
            None => class.name.clone(),
        }
    }

    /// `Class.function` for members, the plain name for free functions.
    pub fn qualified_function_name(&self, id: FunctionId) -> String {
        let function = self.function(id);
        match function.class {
            Some(class) => format!("{}.{}", self.qualified_class_name(class), function.name),
            None => function.name.clone(),
        }
    }

    /// Candidate entry points: functions named `name`, optionally restricted
    /// to a class given by simple or qualified name. Arena order.
    pub fn find_functions(&self, name: &str, class: Option<&str>) -> Vec<FunctionId> {
        self.function_ids()
            .filter(|&id| {
                let function = self.function(id);
                if function.name != name {
                    return false;
                }
                match (class, function.class) {
                    (None, _) => true,
                    (Some(_), None) => false,
                    (Some(wanted), Some(owner)) => {
                        self.class(owner).name == wanted || self.qualified_class_name(owner) == wanted
                    }
                }
            })
            .collect()
    }
}

// ─── Directory build ────────────────────────────────────────────────

/// Counters reported after a directory build.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub files_found: usize,
    pub files_built: usize,
    pub read_errors: usize,
    pub lossy_files: usize,
    /// Files aborted on an invariant violation (malformed tree).
    pub rejected_files: usize,
    pub classes: usize,
    pub functions: usize,
    pub call_sites: usize,
    pub elapsed_ms: u64,
}

/// Discover source files under `dir` (gitignore-aware, hidden files
/// included), sorted for a deterministic file order.
pub fn discover_files(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut walker = WalkBuilder::new(dir);
    walker.hidden(false).git_ignore(true);

    let mut files: Vec<PathBuf> = walker.build()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        })
        .collect();
    files.sort();
    files
}

/// Build the model for every matching file under `dir`, one file at a time.
///
/// A file that cannot be read, or whose tree violates a model invariant, is
/// skipped with a warning; the rest of the project is still built.
pub fn build_project(dir: &str, extensions: &[String]) -> Result<(Project, BuildStats), FlowError> {
    let dir_path = Path::new(dir);
    if !dir_path.is_dir() {
        return Err(FlowError::DirNotFound(dir.to_string()));
    }
    let canonical = std::fs::canonicalize(dir_path).unwrap_or_else(|_| PathBuf::from(dir));
    let root = clean_path(&canonical.to_string_lossy());

    let start = Instant::now();
    let files = discover_files(&canonical, extensions);
    info!(dir = %root, files = files.len(), "Discovered source files");

    let mut parser = kotlin_parser()?;
    let mut project = Project::new(root);
    let mut stats = BuildStats { files_found: files.len(), ..BuildStats::default() };

    for path in &files {
        let path_str = clean_path(&path.to_string_lossy());
        let (source, was_lossy) = match read_file_lossy(path) {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path_str, error = %e, "Failed to read source file");
                stats.read_errors += 1;
                continue;
            }
        };
        if was_lossy {
            warn!(path = %path_str, "File contains non-UTF8 bytes (lossy conversion applied)");
            stats.lossy_files += 1;
        }

        match project.add_source(&mut parser, &path_str, source) {
            Ok(_) => stats.files_built += 1,
            Err(e) => {
                warn!(path = %path_str, error = %e, "Rejected source file");
                stats.rejected_files += 1;
            }
        }
    }

    stats.classes = project.classes.len();
    stats.functions = project.functions.len();
    stats.call_sites = project.call_site_count();
    stats.elapsed_ms = start.elapsed().as_millis() as u64;
    info!(
        files = stats.files_built,
        rejected = stats.rejected_files,
        classes = stats.classes,
        functions = stats.functions,
        call_sites = stats.call_sites,
        elapsed_ms = stats.elapsed_ms,
        "Built source model"
    );

    Ok((project, stats))
}

/// Split a comma-separated extension list, falling back to
/// [`DEFAULT_EXTENSIONS`] when it is empty.
pub fn parse_extensions(ext: &str) -> Vec<String> {
    let exts: Vec<String> = ext.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if exts.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    } else {
        exts
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "parser_kotlin_tests.rs"]
mod parser_tests;
