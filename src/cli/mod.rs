//! CLI layer: argument parsing, logging setup, command dispatch, and
//! subcommand implementations.

pub mod args;

pub use args::*;

use clap::{Parser, Subcommand};
use regex::Regex;
use serde_json::json;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use kflow::model::{build_project, parse_extensions, FunctionId, Project};
use kflow::prompt::{build_prompt, PromptTemplate};
use kflow::trace::{trace, Trace, TraceOptions};
use kflow::FlowError;

// ─── CLI ─────────────────────────────────────────────────────────────

/// Static call-flow tracing for Kotlin projects
#[derive(Parser, Debug)]
#[command(name = "kflow", version, about, after_help = "\
Run 'kflow <COMMAND> --help' for detailed options and examples.\n\
Common options: -d <DIR> (project directory), -e <EXT> (extension filter), -f <NAME> (entry function)")]
pub(crate) struct Cli {
    /// Log level: error, warn, info, debug, trace (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// List classes and their functions (candidate entry points)
    List(ListArgs),

    /// Trace the call flow starting at a function
    Trace(TraceArgs),

    /// Build a language-model prompt from a traced flow
    Prompt(PromptArgs),
}

// ─── Main entry point ───────────────────────────────────────────────

pub fn run() {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    let result = match cli.command {
        Commands::List(args) => cmd_list(args),
        Commands::Trace(args) => cmd_trace(args),
        Commands::Prompt(args) => cmd_prompt(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(normalize_level(level)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn normalize_level(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "error" => "error",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "warn",
    }
}

// ─── Shared helpers ─────────────────────────────────────────────────

fn load_project(source: &SourceArgs) -> Result<Project, FlowError> {
    let extensions = parse_extensions(&source.ext);
    let (project, stats) = build_project(&source.dir, &extensions)?;
    if stats.rejected_files > 0 || stats.read_errors > 0 {
        eprintln!(
            "[kflow] {} of {} files skipped ({} unreadable, {} rejected); run with --log-level warn for details",
            stats.rejected_files + stats.read_errors,
            stats.files_found,
            stats.read_errors,
            stats.rejected_files
        );
    }
    Ok(project)
}

/// Pick the entry function. Several matches without `--class` take the first
/// in project order and warn with the alternatives.
fn select_entry(project: &Project, entry: &EntryArgs) -> Result<FunctionId, FlowError> {
    let candidates = project.find_functions(&entry.function, entry.class.as_deref());
    let Some(&first) = candidates.first() else {
        return Err(FlowError::FunctionNotFound {
            name: entry.function.clone(),
            class: entry.class.clone(),
        });
    };
    if candidates.len() > 1 {
        let alternatives: Vec<String> = candidates[1..].iter()
            .map(|&f| describe_function(project, f))
            .collect();
        warn!(
            function = %entry.function,
            chosen = %describe_function(project, first),
            alternatives = %alternatives.join(", "),
            "Ambiguous entry function, using the first match (narrow it with --class)"
        );
    }
    Ok(first)
}

fn describe_function(project: &Project, id: FunctionId) -> String {
    let function = project.function(id);
    format!(
        "{} ({}:{})",
        project.qualified_function_name(id),
        project.file(function.file).path,
        function.line
    )
}

fn trace_entry(project: &Project, entry: &EntryArgs) -> Result<Trace, FlowError> {
    let id = select_entry(project, entry)?;
    let options = TraceOptions { max_depth: entry.max_depth };
    Ok(trace(project, id, &options))
}

// ─── list ───────────────────────────────────────────────────────────

fn cmd_list(args: ListArgs) -> Result<(), FlowError> {
    let filter = match &args.pattern {
        Some(pattern) => Some(Regex::new(pattern).map_err(|e| FlowError::InvalidRegex {
            pattern: pattern.clone(),
            source: e,
        })?),
        None => None,
    };

    let project = load_project(&args.source)?;
    let functions = listed_functions(&project, filter.as_ref(), args.annotated.as_deref());

    if args.json {
        let items: Vec<serde_json::Value> = functions.iter()
            .map(|&f| {
                let function = project.function(f);
                json!({
                    "name": function.name,
                    "class": function.class.map(|c| project.qualified_class_name(c)),
                    "file": project.file(function.file).path,
                    "line": function.line,
                    "annotations": function.annotations,
                    "calls": function.calls.len(),
                })
            })
            .collect();
        let output = json!({ "functions": items, "count": items.len() });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let mut current_file = None;
    for &f in &functions {
        let function = project.function(f);
        if current_file != Some(function.file) {
            current_file = Some(function.file);
            println!("{}", project.file(function.file).path);
        }
        let marks: String = function.annotations.iter().map(|a| format!("  @{}", a)).collect();
        println!("  {:>5}  {}{}", function.line, project.qualified_function_name(f), marks);
    }
    eprintln!("{} functions", functions.len());
    Ok(())
}

/// Functions in project order whose qualified name matches `filter` and that
/// carry `annotated`, when given.
fn listed_functions(project: &Project, filter: Option<&Regex>, annotated: Option<&str>) -> Vec<FunctionId> {
    project.function_ids()
        .filter(|&f| annotated.is_none_or(|name| project.function(f).has_annotation(name)))
        .filter(|&f| filter.is_none_or(|re| re.is_match(&project.qualified_function_name(f))))
        .collect()
}

// ─── trace ──────────────────────────────────────────────────────────

fn cmd_trace(args: TraceArgs) -> Result<(), FlowError> {
    let project = load_project(&args.source)?;
    let flow = trace_entry(&project, &args.entry)?;
    let entries = flow.entries(&project, !args.all);

    if args.json {
        let mut output = json!({
            "entry": project.qualified_function_name(flow.entry),
            "functions": entries,
            "count": entries.len(),
        });
        if args.show_unresolved {
            let unresolved: Vec<serde_json::Value> = flow.unresolved.iter()
                .map(|u| json!({
                    "caller": project.qualified_function_name(u.caller),
                    "call": u.call.to_string(),
                    "line": u.call.line(),
                    "reason": u.reason,
                }))
                .collect();
            output["unresolved"] = json!(unresolved);
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for entry in &entries {
        let owner = entry.class.as_deref().map(|c| format!("{}.", c)).unwrap_or_default();
        println!("// {}{} ({}:{})", owner, entry.name, entry.file, entry.line);
        println!("{}\n", entry.text);
    }
    if args.show_unresolved {
        for u in &flow.unresolved {
            eprintln!(
                "[unresolved] {} line {}: {} ({})",
                project.qualified_function_name(u.caller),
                u.call.line(),
                u.call,
                u.reason
            );
        }
    }
    eprintln!(
        "{} functions in flow ({} visited, {} unresolved call sites)",
        entries.len(),
        flow.functions.len(),
        flow.unresolved.len()
    );
    Ok(())
}

// ─── prompt ─────────────────────────────────────────────────────────

fn cmd_prompt(args: PromptArgs) -> Result<(), FlowError> {
    let template: PromptTemplate = args.template.parse()?;
    let project = load_project(&args.source)?;
    let flow = trace_entry(&project, &args.entry)?;
    let entries = flow.entries(&project, true);
    let entry_name = &project.function(flow.entry).name;

    let prompt = build_prompt(template, entry_name, args.project.as_deref(), &entries);
    match &args.output {
        Some(path) => {
            std::fs::write(path, &prompt)?;
            eprintln!("Prompt ({}, {} functions) written to {}", template, entries.len(), path);
        }
        None => print!("{}", prompt),
    }
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
