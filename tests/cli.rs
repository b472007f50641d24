use assert_cmd::Command;
use git2::{Repository, Signature, Time};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const DATASET: &str = "\
commit,file,line,depth,length,date,time,timezone,datetime,author,repo,type
aaa,index.html,1,0,6,2025-02-11,08:30:00,+00:00,2025-02-11T08:30:00+00:00,alice,me/site,html
aaa,index.html,2,1,12,2025-02-11,08:30:00,+00:00,2025-02-11T08:30:00+00:00,alice,me/site,html
aaa,global.js,1,0,20,2025-02-11,08:30:00,+00:00,2025-02-11T08:30:00+00:00,alice,me/site,js
bbb,style.css,1,0,8,2025-02-12,14:00:00,+00:00,2025-02-12T14:00:00+00:00,bob,me/site,css
";

fn dataset_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("loc.csv"), DATASET).unwrap();
    dir
}

fn cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("commit-meta").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn stats_json() {
    let dir = dataset_dir();
    cmd(dir.path())
        .args(["stats", "loc.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_loc\": 4"))
        .stdout(predicate::str::contains("\"total_commits\": 2"))
        .stdout(predicate::str::contains("\"file_count\": 3"))
        .stdout(predicate::str::contains("\"peak_hour\": 8"));
}

#[test]
fn stats_csv() {
    let dir = dataset_dir();
    cmd(dir.path())
        .args(["stats", "loc.csv", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "total_loc,total_commits,file_count,average_file_length,peak_hour\n4,2,3,1,8",
        ));
}

#[test]
fn stats_rejects_unknown_format() {
    let dir = dataset_dir();
    cmd(dir.path())
        .args(["stats", "loc.csv", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported output format"));
}

#[test]
fn missing_dataset_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["stats", "nope.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load nope.csv"));
}

#[test]
fn render_html_with_brush() {
    let dir = dataset_dir();
    cmd(dir.path())
        .args(["render", "loc.csv", "--brush", "0,0,1000,500", "-o", "meta.html"])
        .assert()
        .success();

    let html = std::fs::read_to_string(dir.path().join("meta.html")).unwrap();
    assert!(html.contains("2 commits selected"));
    assert!(html.contains("February 12, 2025 at 2:00 PM"));
    assert!(html.contains("<dt>html</dt><dd>2 lines (50%)</dd>"));
    assert_eq!(html.matches("<circle").count(), 2);
}

#[test]
fn render_svg_at_start_of_timeline() {
    let dir = dataset_dir();
    cmd(dir.path())
        .args(["render", "loc.csv", "--progress", "0", "--format", "svg"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<svg"))
        .stdout(predicate::str::contains("<title>aaa</title>"))
        .stdout(predicate::str::contains("<title>bbb</title>").not());
}

#[test]
fn render_json_lists_updates() {
    let dir = dataset_dir();
    let output = cmd(dir.path())
        .args(["render", "loc.csv", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let updates: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let kinds: Vec<&str> = updates
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["stats", "cutoff_label", "scatter", "files"]);
}

#[test]
fn render_rejects_bad_brush() {
    let dir = dataset_dir();
    cmd(dir.path())
        .args(["render", "loc.csv", "--brush", "1,2,3"])
        .assert()
        .failure();
}

#[test]
fn render_uses_chart_config() {
    let dir = dataset_dir();
    std::fs::write(dir.path().join("meta.toml"), "[chart]\nwidth = 640\nheight = 320\n").unwrap();
    cmd(dir.path())
        .args(["render", "loc.csv", "--format", "svg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("viewBox=\"0 0 640 320\""));
}

fn init_repo(dir: &Path) {
    let repo = Repository::init(dir).unwrap();
    std::fs::write(dir.join("main.js"), "function f() {\n  return 1;\n}\n").unwrap();
    std::fs::write(dir.join("package-lock.json"), "{}\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("main.js")).unwrap();
    index.add_path(Path::new("package-lock.json")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("alice", "alice@example.com", &Time::new(1_739_318_000, 0)).unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
}

#[test]
fn generate_then_stats() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    cmd(dir.path())
        .args(["generate", "--repo", ".", "--slug", "me/site", "-o", "loc.csv"])
        .assert()
        .success();

    let csv = std::fs::read_to_string(dir.path().join("loc.csv")).unwrap();
    assert!(csv.starts_with(
        "commit,file,line,depth,length,date,time,timezone,datetime,author,repo,type\n"
    ));
    assert_eq!(csv.lines().count(), 4);
    assert!(!csv.contains("package-lock.json"));
    assert!(csv.contains(",me/site,js"));

    cmd(dir.path())
        .args(["stats", "loc.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_loc\": 3"))
        .stdout(predicate::str::contains("\"peak_hour\": 23"));
}

#[test]
fn generate_without_default_excludes() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    cmd(dir.path())
        .args(["generate", "--repo", ".", "--no-default-excludes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package-lock.json"))
        .stdout(predicate::str::contains("local/"));
}
