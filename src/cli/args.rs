//! CLI argument structs for all subcommands.

use clap::Parser;

/// Where the source model comes from; shared by every subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SourceArgs {
    /// Root directory of the Kotlin project
    #[arg(short, long, default_value = ".")]
    pub dir: String,

    /// File extensions to include (comma-separated)
    #[arg(short, long, default_value = "kt,kts")]
    pub ext: String,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only show functions whose qualified name (`Class.function`) matches this regex
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Only show functions carrying this annotation (bare flag: Doc4k)
    #[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = "Doc4k")]
    pub annotated: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// How the entry function of a flow is selected.
#[derive(Parser, Debug, Clone)]
pub struct EntryArgs {
    /// Name of the entry function
    #[arg(short, long)]
    pub function: String,

    /// Owning class of the entry function (simple or `Outer.Inner` name)
    #[arg(short, long)]
    pub class: Option<String>,

    /// Stop expanding calls below this depth (entry = depth 0)
    #[arg(long)]
    pub max_depth: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct TraceArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub entry: EntryArgs,

    /// Keep functions reached along several paths once per path
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Also report call sites that could not be resolved
    #[arg(long)]
    pub show_unresolved: bool,
}

#[derive(Parser, Debug)]
pub struct PromptArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub entry: EntryArgs,

    /// Prompt template: describe-flow or write-tests
    #[arg(short, long, default_value = "describe-flow")]
    pub template: String,

    /// One-line description of the project placed in the prompt
    #[arg(long)]
    pub project: Option<String>,

    /// Write the prompt to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}
