//! Prompt construction for a traced flow: one instruction block naming the
//! entry function, followed by the rendered text of every function in the flow.

use std::fmt;
use std::str::FromStr;

use crate::render::FlowEntry;
use crate::FlowError;

/// Placeholder replaced by the entry function's name.
pub const FUNCTION_PLACEHOLDER: &str = "<fun>";

/// Used when no `--project` description is given.
pub const DEFAULT_PROJECT_DESCRIPTION: &str = "The project consists a claims management project.";

const DESCRIBE_FLOW: &str = "\
Below is a list functions of a large Kotlin project.
<project>
I want you to take a look at the functions provided and provide me a summary of the execution flow.
Start looking from the '<fun>' function.
Please provide also the following information:
  - a list with all validations checks that are performed.
  - were there any exceptions thrown?

Here are the functions:";

const WRITE_TESTS: &str = "\
Below is a list functions of a large Kotlin project.
<project>
Start looking from the '<fun>' function.
I want you to take a look at the functions provided and provide me a small and abstract summary of the execution flow.
I also want you to write me extensive tests for this flow, especially for the entry point of the flow.

Here are the functions:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// Execution-flow summary with validations and thrown exceptions.
    DescribeFlow,
    /// Short summary plus tests for the entry point.
    WriteTests,
}

impl PromptTemplate {
    pub const ALL: [PromptTemplate; 2] = [Self::DescribeFlow, Self::WriteTests];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DescribeFlow => "describe-flow",
            Self::WriteTests => "write-tests",
        }
    }

    fn body(&self) -> &'static str {
        match self {
            Self::DescribeFlow => DESCRIBE_FLOW,
            Self::WriteTests => WRITE_TESTS,
        }
    }

    /// Instruction block with the entry name and project description filled in.
    pub fn instructions(&self, entry_name: &str, project_description: Option<&str>) -> String {
        let description = project_description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_PROJECT_DESCRIPTION);
        self.body()
            .replace("<project>", description)
            .replacen(FUNCTION_PLACEHOLDER, entry_name, 1)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptTemplate {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FlowError::InvalidArgs(format!(
                "Unknown template '{}'. Expected one of: describe-flow, write-tests",
                s
            )))
    }
}

/// Full prompt: instructions, then each entry's text, separated by blank lines.
pub fn build_prompt(
    template: PromptTemplate,
    entry_name: &str,
    project_description: Option<&str>,
    entries: &[FlowEntry],
) -> String {
    let mut out = template.instructions(entry_name, project_description);
    for entry in entries {
        out.push_str("\n\n");
        out.push_str(&entry.text);
    }
    out.push('\n');
    out
}
