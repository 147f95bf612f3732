mod common;

use std::path::Path;

use common::harness;
use idlspec::test_harness::suite::{discover_yaml_files, load_suite, run_suites};

fn suites_root() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/suites"))
}

#[test]
fn test_discovers_yaml_and_yml_suites_in_order() {
    let files = discover_yaml_files(suites_root());
    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["enums_and_commands.yml", "structs.yaml"]);
}

#[test]
fn test_load_suite_reads_every_case() {
    let cases = load_suite(&suites_root().join("structs.yaml")).unwrap();
    assert_eq!(cases.len(), 5);
    assert_eq!(cases[0].expect_error, None);
    assert_eq!(cases[1].expect_error.as_deref(), Some("missing_field"));
    assert!(cases[3].allow_multiple);
}

#[test]
fn test_all_suites_pass() {
    let report = run_suites(&harness(), suites_root()).unwrap();
    for (case, failure) in &report.failures {
        eprintln!("{case}\n{failure}\n");
    }
    assert!(report.is_success(), "{} suite case(s) failed", report.failed);
    assert_eq!(report.passed, 9);
    assert_eq!(report.skipped, 1);
}
