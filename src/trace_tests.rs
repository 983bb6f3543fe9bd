use super::*;

const SAMPLE: &str = r#"import com.example.test1
import com.example.test2
import test.TestWithPackage

@Doc4k
fun main() {
    fun test() {
        println("Hello, from main fun!")
    }

    println("Hello, from main fun!")
    test()
}

fun test() {
    println("Hello, from test fun!")
}

class Test(
    private val test1: Test1
) {
    private lateinit var test2: Test2
    private lateinit var test3: TestWithPackage

    @Doc4k
    fun test() {
        test3.foo()
        println("Hello, from Test.test fun!")
        if (true) {
            test2()
        }
    }

    fun test2() {
        fun test3() {
            println("Hello, from Test.test fun!")
            test1.test1()
            test2.test2()
        }
        println("Hello, from Test.test fun!")
        test3()
    }
}

class Test1 {
    fun test1() {
        println("Hello, from Test1.test1 fun!")
    }
}

class Test2 {
    fun test2() {
        println("Hello, from Test2.test2 fun!")
    }
}
"#;

fn project(source: &str) -> Project {
    Project::from_sources(&[("Main.kt", source)]).unwrap()
}

fn entry(project: &Project, name: &str, class: Option<&str>) -> FunctionId {
    let found = project.find_functions(name, class);
    assert_eq!(found.len(), 1, "expected exactly one {:?}.{}", class, name);
    found[0]
}

fn names(project: &Project, trace: &Trace) -> Vec<String> {
    trace.functions.iter().map(|&f| project.qualified_function_name(f)).collect()
}

fn unbounded() -> TraceOptions {
    TraceOptions::default()
}

// ─── Sample project ─────────────────────────────────────────────────

#[test]
fn test_sample_member_entry() {
    let project = project(SAMPLE);
    let flow = trace(&project, entry(&project, "test", Some("Test")), &unbounded());
    assert_eq!(
        names(&project, &flow),
        vec!["Test.test", "Test.test2", "Test1.test1", "Test2.test2"]
    );
}

#[test]
fn test_sample_unresolved_calls_are_recorded() {
    let project = project(SAMPLE);
    let flow = trace(&project, entry(&project, "test", Some("Test")), &unbounded());

    // test3 is typed with a class that is not part of the project
    let foo = flow.unresolved.iter()
        .find(|u| u.call.target_name() == Some("foo"))
        .expect("test3.foo() should be reported");
    assert_eq!(foo.reason, MissReason::UnresolvedPropertyType);

    // the local `test3` is not a member of Test
    let local = flow.unresolved.iter()
        .find(|u| u.call == CallSite::Simple { name: Some("test3".to_string()), line: u.call.line() })
        .expect("local function call should be reported");
    assert_eq!(local.reason, MissReason::NoMatchingFunction);

    assert!(flow.unresolved.iter().any(|u| u.call.target_name() == Some("println")));
}

#[test]
fn test_sample_free_function_entry() {
    let project = project(SAMPLE);
    let main = entry(&project, "main", None);
    let flow = trace(&project, main, &unbounded());
    // `test()` reaches the top-level `test`, never the member Test.test
    assert_eq!(names(&project, &flow), vec!["main", "test"]);
    let reached = flow.functions[1];
    assert!(project.function(reached).class.is_none());
}

#[test]
fn test_sample_leaf_entry() {
    let project = project(SAMPLE);
    let flow = trace(&project, entry(&project, "test1", Some("Test1")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["Test1.test1"]);
}

// ─── Ordering & recursion ───────────────────────────────────────────

#[test]
fn test_entry_is_first_and_order_is_depth_first() {
    let source = r#"
class A {
    fun a() {
        b()
        d()
    }
    fun b() { c() }
    fun c() {}
    fun d() {}
}
"#;
    let project = project(source);
    let flow = trace(&project, entry(&project, "a", Some("A")), &unbounded());
    assert_eq!(flow.entry, flow.functions[0]);
    assert_eq!(names(&project, &flow), vec!["A.a", "A.b", "A.c", "A.d"]);
}

#[test]
fn test_direct_self_recursion_is_skipped_silently() {
    let source = "class A {\n    fun loop(n: Int) {\n        if (n > 0) loop(n - 1)\n    }\n}\n";
    let project = project(source);
    let flow = trace(&project, entry(&project, "loop", Some("A")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["A.loop"]);
    assert!(flow.unresolved.is_empty());
}

#[test]
fn test_mutual_recursion_terminates() {
    let source = "class A {\n    fun x() { y() }\n    fun y() { x() }\n}\n";
    let project = project(source);
    let flow = trace(&project, entry(&project, "x", Some("A")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["A.x", "A.y"]);
}

#[test]
fn test_longer_cycle_terminates() {
    let source = "class A {\n    fun x() { y() }\n    fun y() { z() }\n    fun z() { x() }\n}\n";
    let project = project(source);
    let flow = trace(&project, entry(&project, "y", Some("A")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["A.y", "A.z", "A.x"]);
}

#[test]
fn test_repeated_paths_keep_duplicates_until_dedup() {
    let source = r#"
class A {
    fun a() {
        b()
        b()
    }
    fun b() { c() }
    fun c() {}
}
"#;
    let project = project(source);
    let flow = trace(&project, entry(&project, "a", Some("A")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["A.a", "A.b", "A.c", "A.b", "A.c"]);

    let all = flow.entries(&project, false);
    assert_eq!(all.len(), 5);
    let unique = flow.entries(&project, true);
    let unique_names: Vec<&str> = unique.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(unique_names, vec!["a", "b", "c"]);
}

#[test]
fn test_max_depth_limits_expansion() {
    let source = "class A {\n    fun a() { b() }\n    fun b() { c() }\n    fun c() {}\n}\n";
    let project = project(source);
    let a = entry(&project, "a", Some("A"));

    let zero = trace(&project, a, &TraceOptions { max_depth: Some(0) });
    assert_eq!(names(&project, &zero), vec!["A.a"]);

    let one = trace(&project, a, &TraceOptions { max_depth: Some(1) });
    assert_eq!(names(&project, &one), vec!["A.a", "A.b"]);

    let deep = trace(&project, a, &TraceOptions { max_depth: Some(10) });
    assert_eq!(names(&project, &deep), vec!["A.a", "A.b", "A.c"]);
}

// ─── Receivers ──────────────────────────────────────────────────────

#[test]
fn test_object_qualifier_receiver() {
    let source = r#"
object Repo {
    fun load() {}
}

class Service {
    fun run() {
        Repo.load()
    }
}
"#;
    let project = project(source);
    let flow = trace(&project, entry(&project, "run", Some("Service")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["Service.run", "Repo.load"]);
}

#[test]
fn test_this_receiver_targets_own_class() {
    let source = "class A {\n    fun a() { this.b() }\n    fun b() {}\n}\n";
    let project = project(source);
    let flow = trace(&project, entry(&project, "a", Some("A")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["A.a", "A.b"]);
}

#[test]
fn test_this_outside_class_is_unresolved() {
    let source = "fun a() { this.b() }\nfun b() {}\n";
    let project = project(source);
    let flow = trace(&project, entry(&project, "a", None), &unbounded());
    assert_eq!(names(&project, &flow), vec!["a"]);
    assert_eq!(flow.unresolved.len(), 1);
    assert_eq!(flow.unresolved[0].reason, MissReason::NoClassContext);
}

#[test]
fn test_property_without_declared_type() {
    let source = r#"
class Repo {
    fun load() {}
}

class Service {
    val repo = Repo()
    fun run() {
        repo.load()
    }
}
"#;
    let project = project(source);
    let flow = trace(&project, entry(&project, "run", Some("Service")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["Service.run"]);
    assert_eq!(flow.unresolved.len(), 1);
    assert_eq!(flow.unresolved[0].reason, MissReason::UnknownPropertyType);
}

#[test]
fn test_property_type_across_files_through_import() {
    let project = Project::from_sources(&[
        ("a/Repo.kt", "package other\nclass Repo {\n    fun load() {}\n}\n"),
        ("b/Repo.kt", "package data\nclass Repo {\n    fun load() { save() }\n    fun save() {}\n}\n"),
        ("c/Service.kt", "package app\nimport data.Repo\nclass Service(private val repo: Repo?) {\n    fun run() { repo?.load() }\n}\n"),
    ]).unwrap();
    let run = entry(&project, "run", Some("Service"));
    let flow = trace(&project, run, &unbounded());
    assert_eq!(names(&project, &flow), vec!["Service.run", "Repo.load", "Repo.save"]);
    let load = flow.functions[1];
    let owner = project.function(load).class.unwrap();
    assert_eq!(project.class(owner).package, "data");
}

#[test]
fn test_unknown_receiver_in_free_function() {
    let source = "fun a() {\n    foo.bar()\n    b()\n}\nfun b() {}\n";
    let project = project(source);
    let flow = trace(&project, entry(&project, "a", None), &unbounded());
    assert_eq!(names(&project, &flow), vec!["a", "b"], "a miss must not truncate the flow");
    assert_eq!(flow.unresolved.len(), 1);
    assert_eq!(flow.unresolved[0].reason, MissReason::UnresolvedReceiver);
    assert_eq!(flow.unresolved[0].call.to_string(), "foo.bar()");
}

#[test]
fn test_overloads_are_all_expanded() {
    let source = "class A {\n    fun a() { b() }\n    fun b() {}\n    fun b(x: Int) { c() }\n    fun c() {}\n}\n";
    let project = project(source);
    let flow = trace(&project, entry(&project, "a", Some("A")), &unbounded());
    assert_eq!(names(&project, &flow), vec!["A.a", "A.b", "A.b", "A.c"]);
}

#[test]
fn test_miss_reason_display() {
    assert_eq!(MissReason::NoClassContext.to_string(), "'this' outside of a class");
    assert_eq!(
        MissReason::NoMatchingFunction.to_string(),
        "no function with that name in the target scope"
    );
}
