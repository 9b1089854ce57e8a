//! End-to-end analyzer scenarios over real project trees.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use rld::config::Config;
use rld::core::context::AnalysisContext;
use rld::diagnostics::{Category, Confidence, DiagnosticCode, RunResult};

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn run(dir: &Path) -> RunResult {
    run_with(Config::default(), dir)
}

fn run_with(config: Config, dir: &Path) -> RunResult {
    AnalysisContext::new(config, dir, false)
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn unconditional_effect_setter() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "Counter.tsx",
        "import { useEffect, useState } from \"react\";\n\
         export function Counter() {\n\
           const [x, setX] = useState(0);\n\
           useEffect(() => {\n\
             setX(x + 1);\n\
           }, [x]);\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    assert_eq!(result.hook_diagnostics.len(), 1);
    let d = &result.hook_diagnostics[0];
    assert_eq!(d.code, DiagnosticCode::EffectUnconditionalWrite);
    assert_eq!(d.category, Category::Critical);
    assert_eq!(d.confidence, Confidence::High);
    assert_eq!(d.problematic_dependency.as_deref(), Some("x"));
    assert_eq!(d.setter_function.as_deref(), Some("setX"));
}

#[test]
fn equality_guard_produces_nothing() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "Sync.tsx",
        "import { useEffect, useState } from \"react\";\n\
         export function Sync({ newX }) {\n\
           const [x, setX] = useState(0);\n\
           useEffect(() => {\n\
             if (x !== newX) setX(newX);\n\
           }, [x, newX]);\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    assert!(result.is_clean(), "unexpected: {:?}", result.hook_diagnostics);
}

#[test]
fn object_literal_in_deps() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "App.tsx",
        "import { useEffect } from \"react\";\n\
         export function App() {\n\
           const cfg = { url: \"/a\" };\n\
           useEffect(() => {\n\
             load(cfg);\n\
           }, [cfg]);\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    assert_eq!(result.hook_diagnostics.len(), 1);
    let d = &result.hook_diagnostics[0];
    assert_eq!(d.code, DiagnosticCode::UnstableObjectDep);
    assert_eq!(d.category, Category::Performance);
    assert_eq!(d.problematic_dependency.as_deref(), Some("cfg"));
}

#[test]
fn memoized_child_with_inline_handler() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "Button.tsx",
        "import { memo } from \"react\";\n\
         export const Button = memo(() => <button />);\n",
    );
    write(
        dir.path(),
        "App.tsx",
        "import { Button } from \"./Button\";\n\
         export function App() {\n\
           return (\n\
             <div>\n\
               <Button onClick={() => {}} />\n\
               <button onClick={() => {}} />\n\
             </div>\n\
           );\n\
         }\n",
    );

    let result = run(dir.path());
    let memo_props: Vec<_> = result
        .hook_diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::UnstableMemoProp)
        .collect();
    assert_eq!(memo_props.len(), 1);
    assert!(memo_props[0].location.file_path.ends_with("App.tsx"));
}

#[test]
fn import_cycle_between_two_files() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "a.tsx",
        "import { b } from \"./b\";\nexport const a = () => <div>{b}</div>;\n",
    );
    write(
        dir.path(),
        "b.tsx",
        "import { a } from \"./a\";\nexport const b = () => <div>{a}</div>;\n",
    );

    let result = run(dir.path());
    assert_eq!(result.import_cycles.len(), 1);
    let cycle = result.import_cycles[0].cycle.as_ref().unwrap();
    assert_eq!(cycle.len(), 3);
    assert!(cycle[0].ends_with("a.tsx"));
    assert!(cycle[1].ends_with("b.tsx"));
    assert_eq!(cycle[0], cycle[2]);
    assert_eq!(result.cross_file_cycles.len(), 1);
}

#[test]
fn render_phase_setter_and_one_shot() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "Bad.tsx",
        "import { useState } from \"react\";\n\
         export function Bad() {\n\
           const [x, setX] = useState(0);\n\
           setX(1);\n\
           return null;\n\
         }\n",
    );
    write(
        dir.path(),
        "Good.tsx",
        "import { useState } from \"react\";\n\
         export function Good() {\n\
           const [initialized, setInitialized] = useState(false);\n\
           if (!initialized) {\n\
             setInitialized(true);\n\
           }\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    assert_eq!(result.hook_diagnostics.len(), 1);
    let d = &result.hook_diagnostics[0];
    assert_eq!(d.code, DiagnosticCode::RenderPhaseSetState);
    assert_eq!(d.category, Category::Critical);
    assert_eq!(d.confidence, Confidence::High);
    assert!(d.location.file_path.ends_with("Bad.tsx"));
}

#[test]
fn absent_and_empty_dep_arrays_are_distinct() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "App.tsx",
        "import { useEffect, useState } from \"react\";\n\
         export function App() {\n\
           const [a, setA] = useState(0);\n\
           const [b, setB] = useState(0);\n\
           useEffect(() => {\n\
             setA(1);\n\
           });\n\
           useEffect(() => {\n\
             setB(1);\n\
           }, []);\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    assert_eq!(result.hook_diagnostics.len(), 1);
    assert_eq!(
        result.hook_diagnostics[0].code,
        DiagnosticCode::EffectMissingDeps
    );
    assert_eq!(result.hook_diagnostics[0].location.line, 5);
}

#[test]
fn promise_setter_confirmed_timer_setter_potential() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "Poller.tsx",
        "import { useEffect, useState } from \"react\";\n\
         export function Poller() {\n\
           const [data, setData] = useState(null);\n\
           useEffect(() => {\n\
             fetchData().then((next) => setData(next));\n\
           }, [data]);\n\
           return null;\n\
         }\n",
    );
    write(
        dir.path(),
        "Ticker.tsx",
        "import { useEffect, useState } from \"react\";\n\
         export function Ticker() {\n\
           const [tick, setTick] = useState(0);\n\
           useEffect(() => {\n\
             setTimeout(() => setTick(tick + 1), 100);\n\
           }, [tick]);\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    let by_file = |suffix: &str| {
        result
            .hook_diagnostics
            .iter()
            .find(|d| d.location.file_path.ends_with(suffix))
            .unwrap()
    };
    assert_eq!(
        by_file("Poller.tsx").code,
        DiagnosticCode::EffectUnconditionalWrite
    );
    assert_eq!(
        by_file("Ticker.tsx").code,
        DiagnosticCode::EffectConditionalWrite
    );
}

#[test]
fn oversized_file_is_not_analyzed() {
    let dir = tempdir().unwrap();
    let mut big = String::from("import { useEffect, useState } from \"react\";\n");
    big.push_str("export function Big() {\n  const [x, setX] = useState(0);\n  setX(1);\n  return null;\n}\n");
    big.push_str(&"// padding line to exceed the size cap\n".repeat(40_000));
    write(dir.path(), "Big.tsx", &big);

    let result = run(dir.path());
    assert_eq!(result.summary.files_analyzed, 0);
    assert!(result.is_clean());
}

#[test]
fn byte_identical_results_for_unchanged_inputs() {
    let dir = tempdir().unwrap();
    for name in ["Zed.tsx", "Alpha.tsx", "Mid.tsx"] {
        write(
            dir.path(),
            name,
            "import { useEffect, useState } from \"react\";\n\
             export function Widget() {\n\
               const cfg = { id: 1 };\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => { setX(x + 1); }, [x, cfg]);\n\
               return null;\n\
             }\n",
        );
    }

    let first = run(dir.path());
    let second = run(dir.path());
    assert_eq!(first, second);

    let json_a = rld::envelope::to_json(&first).unwrap();
    let json_b = rld::envelope::to_json(&second).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn member_dependency_classified_like_its_root() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "A.tsx",
        "import { useEffect } from \"react\";\n\
         export function A() {\n\
           const cfg = { a: { b: { c: 1 } } };\n\
           useEffect(() => {}, [cfg.a.b]);\n\
           return null;\n\
         }\n",
    );
    write(
        dir.path(),
        "B.tsx",
        "import { useEffect } from \"react\";\n\
         export function B() {\n\
           const cfg = { a: { b: { c: 1 } } };\n\
           useEffect(() => {}, [cfg]);\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    assert_eq!(result.hook_diagnostics.len(), 2);
    assert!(
        result
            .hook_diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::UnstableObjectDep)
    );
}

#[test]
fn setter_passed_to_imported_helper_counts_as_write() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "helpers.ts",
        "export function applyUpdate(useValue, set) {\n  set(useValue + 1);\n}\n",
    );
    write(
        dir.path(),
        "App.tsx",
        "import { useEffect, useState } from \"react\";\n\
         import { applyUpdate } from \"./helpers\";\n\
         export function App() {\n\
           const [x, setX] = useState(0);\n\
           useEffect(() => {\n\
             applyUpdate(x, setX);\n\
           }, [x]);\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    let app = result
        .hook_diagnostics
        .iter()
        .find(|d| d.location.file_path.ends_with("App.tsx"))
        .expect("cross-file setter flow finding");
    assert_eq!(app.code, DiagnosticCode::EffectUnconditionalWrite);
    assert_eq!(app.setter_function.as_deref(), Some("setX"));
}

#[test]
fn confirmed_only_filter_drops_potential_issues() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "App.tsx",
        "import { useEffect, useState } from \"react\";\n\
         export function App({ flag }) {\n\
           const [x, setX] = useState(0);\n\
           useEffect(() => {\n\
             if (flag) setX(x + 1);\n\
           }, [x, flag]);\n\
           useEffect(() => {\n\
             setX(x + 1);\n\
           }, [x]);\n\
           return null;\n\
         }\n",
    );

    let all = run(dir.path());
    assert_eq!(all.hook_diagnostics.len(), 2);

    let config = Config {
        include_potential_issues: false,
        ..Default::default()
    };
    let confirmed = run_with(config, dir.path());
    assert_eq!(confirmed.hook_diagnostics.len(), 1);
    assert_eq!(
        confirmed.hook_diagnostics[0].code,
        DiagnosticCode::EffectUnconditionalWrite
    );
}

#[test]
fn exit_signal_matches_blocking_findings() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "Perf.tsx",
        "import { useEffect } from \"react\";\n\
         export function Perf() {\n\
           const cfg = { a: 1 };\n\
           useEffect(() => {}, [cfg]);\n\
           return null;\n\
         }\n",
    );

    let result = run(dir.path());
    assert_eq!(result.hook_diagnostics.len(), 1);
    // Performance findings alone do not fail the run.
    assert!(!result.has_blocking());
}
