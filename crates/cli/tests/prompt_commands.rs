use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

#[allow(deprecated)]
fn promptdir(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("promptdir").expect("binary");
    cmd.env_remove("RUST_LOG").arg("--root").arg(root);
    cmd
}

fn setup_prompts() -> TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("team")).unwrap();
    fs::create_dir_all(root.join(".drafts")).unwrap();
    fs::write(
        root.join("code-review.md"),
        "---\ntitle: Code Review\ncategory: development\ntags: [review, quality]\n---\n\nReview the following {{language}} code.\n",
    )
    .unwrap();
    fs::write(root.join("team/review.md"), "Nested prompt body").unwrap();
    fs::write(root.join(".drafts/secret.md"), "hidden").unwrap();
    temp
}

#[test]
fn list_prints_visible_prompts_as_json() {
    let temp = setup_prompts();
    let output = promptdir(temp.path())
        .args(["--json", "list"])
        .output()
        .expect("command run");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let names: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(names, vec!["code-review", "team_review"]);
    assert_eq!(body[0]["attributes"]["title"], "Code Review");
}

#[test]
fn list_prints_one_line_per_prompt() {
    let temp = setup_prompts();
    promptdir(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("code-review  Code Review  Review the following"))
        .stdout(predicate::str::contains("team_review  -  Nested prompt body..."))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn get_prints_raw_document() {
    let temp = setup_prompts();
    promptdir(temp.path())
        .args(["get", "team/review"])
        .assert()
        .success()
        .stdout("Nested prompt body");
}

#[test]
fn missing_prompt_fails_with_error_envelope() {
    let temp = setup_prompts();
    let output = promptdir(temp.path())
        .args(["--json", "get", "nope"])
        .output()
        .expect("command run");
    assert!(!output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["code"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("nope"));

    promptdir(temp.path())
        .args(["meta", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Prompt not found: nope"));
}

#[test]
fn meta_accepts_nested_and_flattened_names() {
    let temp = setup_prompts();
    for name in ["team/review", "team_review"] {
        promptdir(temp.path())
            .args(["meta", name])
            .assert()
            .success()
            .stdout(predicate::str::contains("name: team_review"));
    }
}

#[test]
fn render_fills_arguments() {
    let temp = setup_prompts();
    promptdir(temp.path())
        .args(["render", "code-review", "--arg", "language=Rust"])
        .assert()
        .success()
        .stdout("Review the following Rust code.\n\n");

    promptdir(temp.path())
        .args(["render", "code-review", "--arg", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}

#[test]
fn add_then_delete_round_trip() {
    let temp = setup_prompts();
    promptdir(temp.path())
        .args(["add", "Bug Triage", "--title", "Bug Triage", "--tag", "ops"])
        .write_stdin("Triage {{issue}}.")
        .assert()
        .success()
        .stdout(predicate::str::contains("bug_triage.md"));

    let written = fs::read_to_string(temp.path().join("bug_triage.md")).unwrap();
    assert!(written.starts_with("---\n"));
    assert!(written.contains("title: Bug Triage"));
    assert!(written.ends_with("Triage {{issue}}."));

    promptdir(temp.path())
        .args(["render", "bug_triage", "--arg", "issue=#7"])
        .assert()
        .success()
        .stdout("Triage #7.\n");

    promptdir(temp.path())
        .args(["delete", "bug_triage"])
        .assert()
        .success();
    assert!(!temp.path().join("bug_triage.md").exists());

    promptdir(temp.path())
        .args(["delete", "bug_triage"])
        .assert()
        .failure();
}

#[test]
fn add_reads_body_from_file_without_header() {
    let temp = setup_prompts();
    let source = temp.path().join("source.txt");
    fs::write(&source, "plain body").unwrap();

    promptdir(temp.path())
        .args(["add", "plain"])
        .arg("--file")
        .arg(&source)
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(temp.path().join("plain.md")).unwrap(),
        "plain body"
    );
}
