//! Kotlin source model builder: walks a tree-sitter-kotlin syntax tree and
//! produces the file's classes, functions, properties and call sites.

use tree_sitter::{Node, Tree};

use crate::FlowError;

use super::tree::*;
use super::types::*;
use super::Project;

// ─── Node kinds ─────────────────────────────────────────────────────

const SOURCE_FILE: &str = "source_file";
const PACKAGE_HEADER: &str = "package_header";
const IMPORT_LIST: &str = "import_list";
const IMPORT_HEADER: &str = "import_header";
const CLASS_DECLARATION: &str = "class_declaration";
const OBJECT_DECLARATION: &str = "object_declaration";
const COMPANION_OBJECT: &str = "companion_object";
const PRIMARY_CONSTRUCTOR: &str = "primary_constructor";
const CLASS_PARAMETER: &str = "class_parameter";
const PROPERTY_DECLARATION: &str = "property_declaration";
const VARIABLE_DECLARATION: &str = "variable_declaration";
const MULTI_VARIABLE_DECLARATION: &str = "multi_variable_declaration";
const FUNCTION_DECLARATION: &str = "function_declaration";
const FUNCTION_BODY: &str = "function_body";
pub(crate) const CALL_EXPRESSION: &str = "call_expression";
const NAVIGATION_EXPRESSION: &str = "navigation_expression";
const NAVIGATION_SUFFIX: &str = "navigation_suffix";
const SIMPLE_IDENTIFIER: &str = "simple_identifier";
const TYPE_IDENTIFIER: &str = "type_identifier";
const USER_TYPE: &str = "user_type";
const MODIFIERS: &str = "modifiers";
const ANNOTATION: &str = "annotation";

const CLASS_BODY_KINDS: &[&str] = &["class_body", "enum_class_body"];
/// Named nodes a `.kt` file may hold at the top level. Anything else there
/// (expressions in particular) means the grammar misread a declaration.
const TOP_LEVEL_KINDS: &[&str] = &[
    "shebang_line", "file_annotation", PACKAGE_HEADER, IMPORT_LIST, IMPORT_HEADER,
    CLASS_DECLARATION, OBJECT_DECLARATION, FUNCTION_DECLARATION, PROPERTY_DECLARATION,
    "type_alias",
];
/// Named nodes a class or enum body may hold.
const CLASS_MEMBER_KINDS: &[&str] = &[
    CLASS_DECLARATION, OBJECT_DECLARATION, COMPANION_OBJECT, FUNCTION_DECLARATION,
    PROPERTY_DECLARATION, "secondary_constructor", "anonymous_initializer", "type_alias",
    "enum_entry",
];
/// Script files may carry top-level statements.
const SCRIPT_EXTENSION: &str = ".kts";
/// Header nodes that may swallow the comment of the declaration that follows.
const HEADER_KINDS: &[&str] = &[IMPORT_LIST, IMPORT_HEADER, PACKAGE_HEADER];
const DEFAULT_COMPANION_NAME: &str = "Companion";

// ─── Main entry point ───────────────────────────────────────────────

/// Create a parser loaded with the Kotlin grammar.
pub fn kotlin_parser() -> Result<tree_sitter::Parser, FlowError> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&tree_sitter_kotlin_sg::LANGUAGE.into())?;
    Ok(parser)
}

/// Everything one source file contributes to the arena, with ids already
/// assigned relative to the project it was built against.
#[derive(Debug)]
pub(crate) struct FileModel {
    pub file: SourceFile,
    pub classes: Vec<Class>,
    pub functions: Vec<Function>,
}

/// Build the model for one parsed file.
///
/// Fails fast on an unexpected root or a declaration without a name token;
/// nothing is added to `project` in that case because the caller only commits
/// a complete [`FileModel`].
pub(crate) fn build_file_model(
    project: &Project,
    path: &str,
    source: String,
    tree: &Tree,
) -> Result<FileModel, FlowError> {
    let mut builder = KotlinModelBuilder {
        path,
        source: &source,
        file: FileId(project.files.len() as u32),
        package: String::new(),
        class_base: project.classes.len() as u32,
        function_base: project.functions.len() as u32,
        classes: Vec::new(),
        functions: Vec::new(),
    };

    let root = tree.root_node();
    if root.kind() != SOURCE_FILE {
        return Err(builder.malformed(root, "is not a Kotlin source_file root"));
    }
    if let Some(error) = find_error(root) {
        let reason = if error.is_missing() { "is missing" } else { "could not be parsed" };
        return Err(builder.malformed(error, reason));
    }
    let is_script = path.ends_with(SCRIPT_EXTENSION);

    builder.package = extract_package(root, &source);
    let imports = extract_imports(root, &source);

    let mut top_classes = Vec::new();
    let mut top_functions = Vec::new();
    for i in 0..root.child_count() {
        let Some(child) = root.child(i) else { continue };
        match child.kind() {
            CLASS_DECLARATION | OBJECT_DECLARATION => {
                top_classes.push(builder.build_class(child, None)?);
            }
            FUNCTION_DECLARATION => {
                top_functions.push(builder.build_function(child, None)?);
            }
            _ if !is_script && is_unexpected(child, TOP_LEVEL_KINDS) => {
                return Err(builder.malformed(child, "is not a top-level declaration"));
            }
            _ => {}
        }
    }

    let KotlinModelBuilder { package, classes, functions, .. } = builder;
    Ok(FileModel {
        file: SourceFile {
            path: path.to_string(),
            package,
            imports,
            classes: top_classes,
            functions: top_functions,
            source,
        },
        classes,
        functions,
    })
}

// ─── Builder ────────────────────────────────────────────────────────

struct KotlinModelBuilder<'s> {
    path: &'s str,
    source: &'s str,
    file: FileId,
    package: String,
    class_base: u32,
    function_base: u32,
    classes: Vec<Class>,
    functions: Vec<Function>,
}

impl KotlinModelBuilder<'_> {
    fn malformed(&self, node: Node, reason: &str) -> FlowError {
        FlowError::MalformedTree {
            path: self.path.to_string(),
            line: node_line(node),
            kind: node.kind().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Text of a name token; zero-width recovery tokens and empty text are
    /// invariant violations.
    fn name_of(&self, name_node: Node) -> Result<String, FlowError> {
        let name = node_text(name_node, self.source);
        if name_node.is_missing() || name.trim().is_empty() {
            return Err(self.malformed(name_node, "has an empty name"));
        }
        Ok(name.to_string())
    }

    fn build_class(&mut self, node: Node, parent: Option<ClassId>) -> Result<ClassId, FlowError> {
        let is_companion = node.kind() == COMPANION_OBJECT;
        let name = match find_child_by_kind(node, TYPE_IDENTIFIER) {
            Some(n) => self.name_of(n)?,
            None if is_companion => DEFAULT_COMPANION_NAME.to_string(),
            None => return Err(self.malformed(node, "has no name token")),
        };

        // Reserve the slot first so nested classes get later ids (pre-order).
        let local = self.classes.len();
        let id = ClassId(self.class_base + local as u32);
        self.classes.push(Class {
            name,
            file: self.file,
            parent,
            package: self.package.clone(),
            is_object: is_companion || node.kind() == OBJECT_DECLARATION,
            doc: find_doc(node, self.source),
            span: Span::of(node),
            properties: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
        });

        let mut properties = Vec::new();
        if let Some(ctor) = find_child_by_kind(node, PRIMARY_CONSTRUCTOR) {
            let mut params = Vec::new();
            collect_descendants(ctor, &|n: Node| n.kind() == CLASS_PARAMETER, &mut params);
            for param in params {
                let name_node = find_child_by_kind(param, SIMPLE_IDENTIFIER)
                    .ok_or_else(|| self.malformed(param, "has no name token"))?;
                properties.push(Property {
                    name: self.name_of(name_node)?,
                    type_name: declared_type_name(param, self.source),
                    from_constructor: true,
                });
            }
        }

        let mut nested = Vec::new();
        let mut functions = Vec::new();
        if let Some(body) = find_child_by_kinds(node, CLASS_BODY_KINDS) {
            for i in 0..body.child_count() {
                let Some(member) = body.child(i) else { continue };
                match member.kind() {
                    PROPERTY_DECLARATION => self.extract_properties(member, &mut properties)?,
                    CLASS_DECLARATION | OBJECT_DECLARATION | COMPANION_OBJECT => {
                        nested.push(self.build_class(member, Some(id))?);
                    }
                    FUNCTION_DECLARATION => functions.push(self.build_function(member, Some(id))?),
                    _ if is_unexpected(member, CLASS_MEMBER_KINDS) => {
                        return Err(self.malformed(member, "is not a class member declaration"));
                    }
                    _ => {}
                }
            }
        }

        let class = &mut self.classes[local];
        class.properties = properties;
        class.classes = nested;
        class.functions = functions;
        Ok(id)
    }

    fn extract_properties(&self, decl: Node, out: &mut Vec<Property>) -> Result<(), FlowError> {
        let mut vars = children_by_kind(decl, VARIABLE_DECLARATION);
        if let Some(multi) = find_child_by_kind(decl, MULTI_VARIABLE_DECLARATION) {
            vars.extend(children_by_kind(multi, VARIABLE_DECLARATION));
        }
        for var in vars {
            let name_node = find_child_by_kind(var, SIMPLE_IDENTIFIER)
                .ok_or_else(|| self.malformed(var, "has no name token"))?;
            out.push(Property {
                name: self.name_of(name_node)?,
                type_name: declared_type_name(var, self.source),
                from_constructor: false,
            });
        }
        Ok(())
    }

    fn build_function(&mut self, node: Node, class: Option<ClassId>) -> Result<FunctionId, FlowError> {
        let name_node = find_child_by_kind(node, SIMPLE_IDENTIFIER)
            .ok_or_else(|| self.malformed(node, "has no name token"))?;
        let name = self.name_of(name_node)?;

        let calls = extract_call_sites(node, self.source)?;
        let id = FunctionId(self.function_base + self.functions.len() as u32);
        self.functions.push(Function {
            name,
            file: self.file,
            class,
            doc: find_doc(node, self.source),
            span: Span::of(node),
            line: node_line(node),
            annotations: annotation_names(node, self.source),
            calls,
        });
        Ok(id)
    }
}

/// A named, non-comment node whose kind is not in `allowed`.
fn is_unexpected(node: Node, allowed: &[&str]) -> bool {
    node.is_named() && !is_comment(node) && !allowed.contains(&node.kind())
}

// ─── Package & imports ──────────────────────────────────────────────

fn extract_package(root: Node, source: &str) -> String {
    find_child_by_kind(root, PACKAGE_HEADER)
        .and_then(|header| find_child_by_kind(header, "identifier"))
        .map(|id| compact_text(id, source))
        .unwrap_or_default()
}

fn extract_imports(root: Node, source: &str) -> Vec<Import> {
    // Depending on the grammar revision, headers are wrapped in `import_list`
    // or sit directly under the root.
    let mut headers = Vec::new();
    for i in 0..root.child_count() {
        let Some(child) = root.child(i) else { continue };
        match child.kind() {
            IMPORT_LIST => headers.extend(children_by_kind(child, IMPORT_HEADER)),
            IMPORT_HEADER => headers.push(child),
            _ => {}
        }
    }

    headers.into_iter()
        .filter_map(|header| {
            let id = find_child_by_kind(header, "identifier")?;
            let path = compact_text(id, source);
            if path.is_empty() {
                return None;
            }
            let wildcard = find_child_by_kind(header, "wildcard_import").is_some()
                || compact_text(header, source).ends_with(".*");
            let alias = find_child_by_kind(header, "import_alias")
                .and_then(last_named_child)
                .map(|n| node_text(n, source).to_string());
            Some(Import { path, alias, wildcard })
        })
        .collect()
}

// ─── Types ──────────────────────────────────────────────────────────

/// Declared type of a parameter or variable declaration: the `user_type`
/// segments joined by `.`, with type arguments and `?` dropped.
/// Function types, `dynamic` and absent annotations yield `None`.
fn declared_type_name(holder: Node, source: &str) -> Option<String> {
    let ty = find_child_by_kinds(holder, &[USER_TYPE, "nullable_type", "not_nullable_type"])?;
    let user_type = if ty.kind() == USER_TYPE {
        ty
    } else {
        find_descendant_by_kind(ty, USER_TYPE)?
    };
    let segments: Vec<&str> = children_by_kind(user_type, TYPE_IDENTIFIER)
        .into_iter()
        .map(|n| node_text(n, source))
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("."))
    }
}

// ─── Annotations ────────────────────────────────────────────────────

/// Annotation names on a declaration's modifiers as written
/// (`@Doc4k` → `Doc4k`, `@a.b.Marker(1)` → `a.b.Marker`), in source order.
fn annotation_names(decl: Node, source: &str) -> Vec<String> {
    let Some(modifiers) = find_child_by_kind(decl, MODIFIERS) else {
        return Vec::new();
    };
    let mut annotations = Vec::new();
    collect_descendants(modifiers, &|n: Node| n.kind() == ANNOTATION, &mut annotations);
    annotations.into_iter()
        .filter_map(|annotation| {
            let user_type = find_descendant_by_kind(annotation, USER_TYPE)?;
            let segments: Vec<&str> = children_by_kind(user_type, TYPE_IDENTIFIER)
                .into_iter()
                .map(|n| node_text(n, source))
                .collect();
            (!segments.is_empty()).then(|| segments.join("."))
        })
        .collect()
}

// ─── Documentation ──────────────────────────────────────────────────

/// Comment attached to a declaration: the immediately preceding sibling if it
/// is a comment (consecutive `//` lines are merged), or the trailing comment
/// of a preceding import/package header, which the grammar sometimes folds
/// the comment into. The comment must sit on lines of its own above the
/// declaration; a trailing comment of the previous member is not documentation.
fn find_doc(node: Node, source: &str) -> Option<Span> {
    let prev = node.prev_sibling()?;
    let comment = if is_comment(prev) {
        prev
    } else if HEADER_KINDS.contains(&prev.kind()) {
        find_trailing(prev, &is_comment)?
    } else {
        return None;
    };
    let above = comment.end_position().row < node.start_position().row;
    if above && starts_own_line(comment, source) {
        Some(comment_run(comment, source))
    } else {
        None
    }
}

fn comment_run(last: Node, source: &str) -> Span {
    let mut span = Span::of(last);
    if last.kind() != "line_comment" {
        return span;
    }
    let mut current = last;
    while let Some(prev) = current.prev_sibling() {
        let adjacent = prev.end_position().row + 1 >= current.start_position().row;
        if prev.kind() != "line_comment" || !adjacent || !starts_own_line(prev, source) {
            break;
        }
        span = span.cover(Span::of(prev));
        current = prev;
    }
    span
}

// ─── Call site extraction ───────────────────────────────────────────

/// Call sites of a function declaration in pre-order.
///
/// A block body contributes every call expression inside it, including those
/// in local functions and lambdas. An expression body that is itself a call
/// contributes exactly that call.
fn extract_call_sites(function: Node, source: &str) -> Result<Vec<CallSite>, FlowError> {
    let Some(body) = find_child_by_kind(function, FUNCTION_BODY) else {
        return Ok(Vec::new());
    };

    let scope = if find_child_by_kind(body, "=").is_some() {
        let Some(expr) = last_named_child(body) else {
            return Ok(Vec::new());
        };
        if expr.kind() == CALL_EXPRESSION {
            return Ok(vec![classify_call(expr, source)?]);
        }
        expr
    } else {
        body
    };

    let mut nodes = Vec::new();
    collect_descendants(scope, &|n: Node| n.kind() == CALL_EXPRESSION, &mut nodes);
    nodes.into_iter().map(|n| classify_call(n, source)).collect()
}

/// Classify a `call_expression` node as a simple or navigation call.
pub fn classify_call(node: Node, source: &str) -> Result<CallSite, FlowError> {
    if node.kind() != CALL_EXPRESSION {
        return Err(FlowError::UnexpectedNode {
            expected: CALL_EXPRESSION,
            found: node.kind().to_string(),
        });
    }
    let line = node_line(node);
    let Some(callee) = first_named_child(node) else {
        return Ok(CallSite::Simple { name: None, line });
    };

    match callee.kind() {
        SIMPLE_IDENTIFIER => Ok(CallSite::Simple {
            name: Some(node_text(callee, source).to_string()),
            line,
        }),
        NAVIGATION_EXPRESSION => {
            let member = find_child_by_kind(callee, NAVIGATION_SUFFIX)
                .and_then(|suffix| find_child_by_kind(suffix, SIMPLE_IDENTIFIER));
            let receiver = first_named_child(callee).filter(|n| n.kind() != NAVIGATION_SUFFIX);
            match (receiver, member) {
                (Some(receiver), Some(member)) => Ok(CallSite::Navigation {
                    receiver: compact_text(receiver, source),
                    member: node_text(member, source).to_string(),
                    line,
                }),
                _ => Ok(CallSite::Simple { name: None, line }),
            }
        }
        _ => Ok(CallSite::Simple { name: None, line }),
    }
}
