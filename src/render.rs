//! Rendering of traced functions into the output records handed to prompt
//! construction: documentation plus declaration text, re-indented to column zero.

use serde::Serialize;

use crate::model::{FunctionId, Project, Span};

/// One function of a flow as seen by downstream consumers.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlowEntry {
    pub name: String,
    /// Qualified owning class (`Outer.Inner`), `None` for free functions.
    pub class: Option<String>,
    pub file: String,
    pub line: u32,
    pub text: String,
}

impl FlowEntry {
    pub fn from_function(project: &Project, id: FunctionId) -> Self {
        let function = project.function(id);
        Self {
            name: function.name.clone(),
            class: function.class.map(|c| project.qualified_class_name(c)),
            file: project.file(function.file).path.clone(),
            line: function.line,
            text: render_function(project, id),
        }
    }
}

/// Documentation (if any) followed by the declaration, each dedented.
pub fn render_function(project: &Project, id: FunctionId) -> String {
    let function = project.function(id);
    let source = &project.file(function.file).source;
    let body = render_span(source, function.span);
    match function.doc {
        Some(doc) => format!("{}\n{}", render_span(source, doc), body),
        None => body,
    }
}

/// Text of `span`, re-indented so that its least-indented line starts at
/// column zero. Indentation is measured from the start of the line the span
/// begins on, so continuation lines keep their shape relative to the first.
pub fn render_span(source: &str, span: Span) -> String {
    let start = span.start.min(source.len());
    let end = span.end.clamp(start, source.len());
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);

    // Anything before the span on its first line becomes padding of equal width.
    let lead: String = source[line_start..start]
        .chars()
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    dedent(&format!("{}{}", lead, &source[start..end]))
}

/// Remove the common leading whitespace of all non-blank lines and trailing
/// whitespace of every line.
pub fn dedent(text: &str) -> String {
    let indent = text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(indent..).unwrap_or(l.trim_start()).trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
