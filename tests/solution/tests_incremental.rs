//! Solution loading and incremental resynchronization.

use regen::solution::{ChangeKind, FileChange, Project, Solution};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CUSTOMER: &str = r#"
namespace Shop
{
    public class Customer { }
}
"#;

const ORDER: &str = r#"
namespace Shop
{
    public class Order { }
}
"#;

fn scaffold(projects: &[&str], files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let entries: Vec<String> = projects.iter().map(|p| format!("\"{p}\"")).collect();
    let manifest = dir.path().join("solution.json");
    fs::write(&manifest, format!("{{ \"projects\": [{}] }}", entries.join(", "))).expect("manifest");
    for project in projects {
        fs::create_dir_all(dir.path().join(project)).expect("project dir");
    }
    for (rel, text) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("dirs");
        fs::write(path, text).expect("unit");
    }
    (dir, manifest)
}

fn type_names(solution: &Solution) -> Vec<String> {
    let mut names: Vec<String> = solution
        .projects()
        .iter()
        .flat_map(|p| {
            let comp = p.compilation();
            comp.type_ids()
                .map(|id| comp.ty(id).name.to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    names.sort();
    names
}

fn type_names_of(project: &Project) -> Vec<String> {
    let comp = project.compilation();
    let mut names: Vec<String> = comp
        .type_ids()
        .map(|id| comp.ty(id).name.to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn load_indexes_every_source_unit() {
    let (_dir, manifest) = scaffold(
        &["Server"],
        &[
            ("Server/Customer.cs", CUSTOMER),
            ("Server/Sub/Order.cs", ORDER),
            ("Server/notes.txt", "not source"),
        ],
    );
    let solution = Solution::load(&manifest, None, false).expect("load");
    assert_eq!(solution.projects().len(), 1);
    assert_eq!(solution.projects()[0].unit_count(), 2);
    assert_eq!(type_names(&solution), vec!["Customer", "Order"]);
}

#[test]
fn project_filter_selects_by_glob() {
    let (_dir, manifest) = scaffold(
        &["Server", "Client"],
        &[
            ("Server/Customer.cs", CUSTOMER),
            ("Client/Order.cs", ORDER),
        ],
    );
    let solution = Solution::load(&manifest, Some("Ser*"), false).expect("load");
    assert_eq!(solution.projects().len(), 1);
    assert_eq!(solution.projects()[0].name(), "Server");
}

#[test]
fn added_then_rebuild_matches_a_fresh_load() {
    let (dir, manifest) = scaffold(&["Server"], &[("Server/Customer.cs", CUSTOMER)]);
    let mut solution = Solution::load(&manifest, None, false).expect("load");

    let order = dir.path().join("Server/Order.cs");
    fs::write(&order, ORDER).expect("write");
    solution
        .process_change(&FileChange {
            path: order,
            kind: ChangeKind::Added,
        })
        .expect("apply");
    solution.rebuild_all();

    let fresh = Solution::load(&manifest, None, false).expect("reload");
    assert_eq!(type_names(&solution), type_names(&fresh));
}

#[test]
fn removed_drops_the_unit_and_its_types() {
    let (dir, manifest) = scaffold(
        &["Server"],
        &[
            ("Server/Customer.cs", CUSTOMER),
            ("Server/Order.cs", ORDER),
        ],
    );
    let mut solution = Solution::load(&manifest, None, false).expect("load");

    solution
        .process_change(&FileChange {
            path: dir.path().join("Server/Order.cs"),
            kind: ChangeKind::Removed,
        })
        .expect("apply");
    solution.rebuild_all();

    assert_eq!(type_names(&solution), vec!["Customer"]);
}

#[test]
fn changed_replaces_the_unit_in_place() {
    let (dir, manifest) = scaffold(&["Server"], &[("Server/Customer.cs", CUSTOMER)]);
    let mut solution = Solution::load(&manifest, None, false).expect("load");

    let path = dir.path().join("Server/Customer.cs");
    fs::write(&path, "namespace Shop { public class Renamed { } }").expect("rewrite");
    solution
        .process_change(&FileChange {
            path,
            kind: ChangeKind::Changed,
        })
        .expect("apply");
    solution.rebuild_all();

    assert_eq!(type_names(&solution), vec!["Renamed"]);
}

#[test]
fn changed_for_an_unindexed_path_is_ignored() {
    let (dir, manifest) = scaffold(&["Server"], &[("Server/Customer.cs", CUSTOMER)]);
    let mut solution = Solution::load(&manifest, None, false).expect("load");

    solution
        .process_change(&FileChange {
            path: dir.path().join("Server/Ghost.cs"),
            kind: ChangeKind::Changed,
        })
        .expect("stale event must not fail");
    solution.rebuild_all();

    assert_eq!(type_names(&solution), vec!["Customer"]);
}

#[test]
fn added_outside_every_project_root_is_a_noop() {
    let (dir, manifest) = scaffold(&["Server"], &[("Server/Customer.cs", CUSTOMER)]);
    let mut solution = Solution::load(&manifest, None, false).expect("load");

    let stray = dir.path().join("Elsewhere.cs");
    fs::write(&stray, ORDER).expect("write");
    solution
        .process_change(&FileChange {
            path: stray,
            kind: ChangeKind::Added,
        })
        .expect("apply");
    solution.rebuild_all();

    assert_eq!(type_names(&solution), vec!["Customer"]);
}

#[test]
fn added_owner_is_the_deepest_containing_project() {
    let (dir, manifest) = scaffold(
        &["Apps", "Apps/Server"],
        &[("Apps/Server/Customer.cs", CUSTOMER)],
    );
    let mut solution = Solution::load(&manifest, None, false).expect("load");

    let order = dir.path().join("Apps/Server/Order.cs");
    fs::write(&order, ORDER).expect("write");
    solution
        .process_change(&FileChange {
            path: order,
            kind: ChangeKind::Added,
        })
        .expect("apply");
    solution.rebuild_all();

    let server = solution.project("Apps/Server").expect("project");
    assert_eq!(server.unit_count(), 2);
}

#[test]
fn projects_sharing_a_leaf_directory_keep_distinct_names() {
    let (_dir, manifest) = scaffold(
        &["Server/Core", "Shared/Core"],
        &[
            ("Server/Core/Customer.cs", CUSTOMER),
            ("Shared/Core/Order.cs", ORDER),
        ],
    );
    let solution = Solution::load(&manifest, None, false).expect("load");

    let server = solution.project("Server/Core").expect("server project");
    let shared = solution.project("Shared/Core").expect("shared project");
    assert_eq!(type_names_of(server), vec!["Customer"]);
    assert_eq!(type_names_of(shared), vec!["Order"]);
}

#[test]
fn malformed_manifest_fails_the_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = dir.path().join("solution.json");
    fs::write(&manifest, "{ not json").expect("write");
    assert!(Solution::load(&manifest, None, false).is_err());
}
