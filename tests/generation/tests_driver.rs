//! End-to-end generation passes: script → rendered outputs → sweep.

use regen::driver::Driver;
use regen::solution::{ChangeKind, FileChange};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SCRIPT: &str = r#"{{declare_source "solution.json"}}{{log "pass"}}{{#each (lookup (code) "classes")}}{{open_output "gen" this.name}}class {{this.name}};
{{/each}}"#;

fn scaffold(classes: &[&str]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("Server")).expect("project dir");
    fs::write(
        dir.path().join("solution.json"),
        r#"{ "projects": ["Server"] }"#,
    )
    .expect("manifest");
    for class in classes {
        fs::write(
            dir.path().join("Server").join(format!("{class}.cs")),
            format!("namespace Shop {{ public class {class} {{ }} }}"),
        )
        .expect("unit");
    }
    let script = dir.path().join("script.hbs");
    fs::write(&script, SCRIPT).expect("script");
    (dir, script)
}

#[test]
fn first_pass_renders_one_file_per_class() {
    let (dir, script) = scaffold(&["Customer", "Order"]);
    let driver = Driver::new(&script, false).expect("driver");
    driver.run_pass().expect("pass");

    let customer = dir.path().join("gen/Customer");
    let order = dir.path().join("gen/Order");
    assert_eq!(fs::read_to_string(&customer).expect("read"), "class Customer;\n");
    assert_eq!(fs::read_to_string(&order).expect("read"), "class Order;\n");
    assert_eq!(driver.state().lock().epoch(), 1);
}

#[test]
fn second_pass_is_idempotent() {
    let (dir, script) = scaffold(&["Customer"]);
    let driver = Driver::new(&script, false).expect("driver");
    driver.run_pass().expect("first");

    let path = dir.path().join("gen/Customer");
    let modified = fs::metadata(&path).expect("meta").modified().expect("mtime");

    driver.run_pass().expect("second");
    assert_eq!(driver.state().lock().epoch(), 2);
    assert!(path.exists());
    assert_eq!(
        fs::metadata(&path).expect("meta").modified().expect("mtime"),
        modified,
        "unchanged content must not be rewritten"
    );
}

#[test]
fn removing_a_source_sweeps_its_output() {
    let (dir, script) = scaffold(&["Customer", "Order"]);
    let driver = Driver::new(&script, false).expect("driver");
    driver.run_pass().expect("first");
    assert!(dir.path().join("gen/Order").exists());

    let unit = dir.path().join("Server/Order.cs");
    fs::remove_file(&unit).expect("rm");
    {
        let mut state = driver.state().lock();
        let solution = state.solution_mut().expect("solution");
        solution
            .process_change(&FileChange {
                path: unit,
                kind: ChangeKind::Removed,
            })
            .expect("apply");
        solution.rebuild_all();
    }
    driver.run_pass().expect("second");

    assert!(dir.path().join("gen/Customer").exists());
    assert!(!dir.path().join("gen/Order").exists());
}

#[test]
fn adding_a_source_grows_the_outputs() {
    let (dir, script) = scaffold(&["Customer"]);
    let driver = Driver::new(&script, false).expect("driver");
    driver.run_pass().expect("first");

    let unit = dir.path().join("Server/Order.cs");
    fs::write(&unit, "namespace Shop { public class Order { } }").expect("write");
    {
        let mut state = driver.state().lock();
        let solution = state.solution_mut().expect("solution");
        solution
            .process_change(&FileChange {
                path: unit,
                kind: ChangeKind::Added,
            })
            .expect("apply");
        solution.rebuild_all();
    }
    driver.run_pass().expect("second");

    assert!(dir.path().join("gen/Order").exists());
}

#[test]
fn missing_script_fails_construction() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Driver::new(&dir.path().join("nope.hbs"), false);
    assert!(err.is_err());
}

#[test]
fn template_syntax_error_fails_construction() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("bad.hbs");
    fs::write(&script, "{{#if broken}}never closed").expect("script");
    assert!(Driver::new(&script, false).is_err());
}

#[test]
fn failed_render_reports_the_render_error_and_still_commits() {
    let (dir, script) = scaffold(&["Customer"]);
    fs::write(
        &script,
        r#"{{declare_source "solution.json"}}{{open_output "gen" "Customer"}}class Customer;
{{no_such_helper "boom"}}"#,
    )
    .expect("script");
    let driver = Driver::new(&script, false).expect("driver");

    let err = driver.run_pass();
    assert!(matches!(err, Err(regen::Error::Render(_))));
    // Output rendered before the failure is committed, not lost.
    assert_eq!(
        fs::read_to_string(dir.path().join("gen/Customer")).expect("read"),
        "class Customer;\n"
    );
}

#[test]
fn missing_manifest_fails_the_first_pass() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("script.hbs");
    fs::write(&script, r#"{{declare_source "solution.json"}}"#).expect("script");
    let driver = Driver::new(&script, false).expect("driver");
    assert!(driver.run_pass().is_err());
}
