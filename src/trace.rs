//! Flow tracing: depth-first expansion of call sites from an entry function
//! into one ordered sequence of visited functions.

use serde::Serialize;
use tracing::{debug, trace as log_trace};

use crate::distinct;
use crate::model::{CallSite, ClassId, FunctionId, Project};
use crate::render::FlowEntry;
use crate::resolve::SymbolResolver;

#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    /// Functions at this depth are recorded but not expanded. `None` = unbounded.
    pub max_depth: Option<usize>,
}

/// Why a call site contributed nothing to the flow.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MissReason {
    /// The callee is not a plain identifier.
    NoName,
    /// `receiver` is a property whose type was not written out.
    UnknownPropertyType,
    /// `receiver` is a property whose declared type resolves to no class.
    UnresolvedPropertyType,
    /// `receiver` is neither a property nor a resolvable class name.
    UnresolvedReceiver,
    /// `this` used outside of a class.
    NoClassContext,
    /// The target class (or current scope) has no function with that name.
    NoMatchingFunction,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoName => "callee has no identifiable name",
            Self::UnknownPropertyType => "receiver property has no declared type",
            Self::UnresolvedPropertyType => "receiver property type resolves to no class",
            Self::UnresolvedReceiver => "receiver is neither a property nor a known class",
            Self::NoClassContext => "'this' outside of a class",
            Self::NoMatchingFunction => "no function with that name in the target scope",
        }
    }
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A call site that was skipped because it could not be resolved.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedCall {
    pub caller: FunctionId,
    pub call: CallSite,
    pub reason: MissReason,
}

/// Result of tracing one entry function.
#[derive(Debug, Clone)]
pub struct Trace {
    pub entry: FunctionId,
    /// Visit order; the entry is always first. A function reached along
    /// several paths appears once per path.
    pub functions: Vec<FunctionId>,
    pub unresolved: Vec<UnresolvedCall>,
}

impl Trace {
    /// Output records in visit order. With `dedup`, entries whose rendered
    /// text repeats an earlier one are dropped.
    pub fn entries(&self, project: &Project, dedup: bool) -> Vec<FlowEntry> {
        let entries = self.functions.iter().map(|&f| FlowEntry::from_function(project, f));
        if dedup {
            distinct(entries, |e| e.text.clone())
        } else {
            entries.collect()
        }
    }
}

/// Trace the flow reachable from `entry`.
///
/// Never fails: unresolvable call sites are logged, recorded in
/// [`Trace::unresolved`] and skipped.
pub fn trace(project: &Project, entry: FunctionId, options: &TraceOptions) -> Trace {
    let mut tracer = FlowTracer {
        project,
        resolver: SymbolResolver::new(project),
        options,
        functions: Vec::new(),
        unresolved: Vec::new(),
        path: Vec::new(),
    };
    tracer.expand(entry, 0);
    debug!(
        entry = %project.qualified_function_name(entry),
        visited = tracer.functions.len(),
        unresolved = tracer.unresolved.len(),
        "Traced flow"
    );
    Trace { entry, functions: tracer.functions, unresolved: tracer.unresolved }
}

struct FlowTracer<'p, 'o> {
    project: &'p Project,
    resolver: SymbolResolver<'p>,
    options: &'o TraceOptions,
    functions: Vec<FunctionId>,
    unresolved: Vec<UnresolvedCall>,
    /// Functions on the active expansion path.
    path: Vec<FunctionId>,
}

impl FlowTracer<'_, '_> {
    fn expand(&mut self, id: FunctionId, depth: usize) {
        self.functions.push(id);
        if self.options.max_depth.is_some_and(|max| depth >= max) {
            log_trace!(function = %self.project.qualified_function_name(id), depth, "Depth limit reached");
            return;
        }

        self.path.push(id);
        let project = self.project;
        let function = project.function(id);
        for call in &function.calls {
            let targets = match self.resolve_call(id, call) {
                Ok(targets) => targets,
                Err(Some(reason)) => {
                    debug!(
                        caller = %project.qualified_function_name(id),
                        call = %call,
                        line = call.line(),
                        reason = %reason,
                        "Unresolved call site"
                    );
                    self.unresolved.push(UnresolvedCall { caller: id, call: call.clone(), reason });
                    continue;
                }
                Err(None) => continue,
            };

            for target in targets {
                if self.path.contains(&target) {
                    log_trace!(
                        caller = %project.qualified_function_name(id),
                        target = %project.qualified_function_name(target),
                        "Cycle on the active path, not expanding"
                    );
                    continue;
                }
                self.expand(target, depth + 1);
            }
        }
        self.path.pop();
    }

    /// Target functions of one call site. `Err(None)` skips silently
    /// (direct self-recursion); `Err(Some(_))` is a resolution miss.
    fn resolve_call(&self, caller: FunctionId, call: &CallSite) -> Result<Vec<FunctionId>, Option<MissReason>> {
        let function = self.project.function(caller);
        let targets = match call {
            CallSite::Navigation { receiver, member, .. } => {
                let class = self.navigation_target(caller, receiver).map_err(Some)?;
                self.project.member_functions_named(class, member)
            }
            CallSite::Simple { name: None, .. } => return Err(Some(MissReason::NoName)),
            CallSite::Simple { name: Some(name), .. } => {
                if *name == function.name {
                    return Err(None);
                }
                match function.class {
                    Some(class) => self.project.member_functions_named(class, name),
                    None => self.project.top_level_functions_named(function.file, name),
                }
            }
        };
        if targets.is_empty() {
            Err(Some(MissReason::NoMatchingFunction))
        } else {
            Ok(targets)
        }
    }

    /// Class reached through `receiver`: `this`, a property of the current
    /// class (via its declared type), or a class qualifier.
    fn navigation_target(&self, caller: FunctionId, receiver: &str) -> Result<ClassId, MissReason> {
        let function = self.project.function(caller);

        if receiver == "this" {
            return function.class.ok_or(MissReason::NoClassContext);
        }

        if let Some(class) = function.class {
            if let Some(property) = self.project.property(class, receiver) {
                let type_name = property.type_name.as_deref()
                    .ok_or(MissReason::UnknownPropertyType)?;
                return self.resolver.resolve_class(class, type_name)
                    .ok_or(MissReason::UnresolvedPropertyType);
            }
        }

        self.resolver.resolve_class_in_file(function.file, receiver)
            .ok_or(MissReason::UnresolvedReceiver)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
