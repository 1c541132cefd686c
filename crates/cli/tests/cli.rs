use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("reconcile.toml");
    let work_dir = dir.join("work");
    let dataset = dir.join("dataset.txt");
    std::fs::write(
        &path,
        format!(
            r#"
index_url = "http://localhost:9/index"
dataset_file = "{}"
work_dir = "{}"
{extra}
"#,
            dataset.display(),
            work_dir.display()
        ),
    )
    .unwrap();
    path
}

fn reconcile() -> Command {
    Command::cargo_bin("reconcile").unwrap()
}

#[test]
fn help_lists_the_phases() {
    reconcile()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("fix"))
        .stdout(predicate::str::contains("clear-failures"));
}

#[test]
fn missing_config_file_is_a_clear_error() {
    let temp = tempfile::tempdir().unwrap();
    reconcile()
        .arg("--config")
        .arg(temp.path().join("nope.toml"))
        .arg("fix")
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading config"));
}

#[test]
fn unknown_query_strategy_fails_with_guidance() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path(), r#"query_strategy = "breadth-first""#);
    reconcile()
        .arg("--config")
        .arg(&config)
        .arg("fix")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown query strategy"));
}

#[test]
fn database_backing_store_points_at_file_extraction() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path(), r#"backing_store = "postgres""#);
    reconcile()
        .arg("--config")
        .arg(&config)
        .arg("fix")
        .assert()
        .failure()
        .stderr(predicate::str::contains("extraction step"));
}

#[test]
fn fix_with_no_staged_files_is_a_clean_no_op() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path(), "");
    reconcile()
        .arg("--config")
        .arg(&config)
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("nodes"))
        .stdout(predicate::str::contains("purge"));
}

#[test]
fn fix_summary_json_emits_json() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path(), "");
    reconcile()
        .arg("--config")
        .arg(&config)
        .arg("fix")
        .arg("--summary-json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"purge_candidates\""));
}

#[test]
fn malformed_dataset_fails_before_any_network_use() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path(), "");
    // index_url points at a closed port; a format error must win anyway.
    std::fs::write(temp.path().join("dataset.txt"), "1 2 three 4\n").unwrap();
    reconcile()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed source record"));
}

#[test]
fn clear_failures_is_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path(), "");
    for _ in 0..2 {
        reconcile()
            .arg("--config")
            .arg(&config)
            .arg("clear-failures")
            .assert()
            .success();
    }
}
