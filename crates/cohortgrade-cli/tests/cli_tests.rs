//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Runs the binary from `workdir`, isolated from any user or env config.
fn cohortgrade(workdir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cohortgrade").unwrap();
    cmd.current_dir(workdir)
        .env("HOME", workdir)
        .env_remove("COHORTGRADE_OUTPUT_DIR")
        .env_remove("COHORTGRADE_PARALLELISM")
        .env_remove("RUST_LOG");
    cmd
}

fn gradebooks() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../gradebooks")
}

fn rust_cohort() -> PathBuf {
    gradebooks().join("rust-2024-a.toml")
}

/// Path of the single report with `extension` in `dir`.
fn single_report(dir: &Path, extension: &str) -> PathBuf {
    let mut found: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == extension))
        .collect();
    assert_eq!(found.len(), 1, "expected one .{extension} report in {dir:?}");
    found.remove(0)
}

#[test]
fn validate_valid_gradebook() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("validate")
        .arg("--gradebook")
        .arg(rust_cohort())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Cohort: rust-2024-a (3 exams, 3 students, 4 grades, 2 certificates)",
        ))
        .stdout(predicate::str::contains("All gradebooks valid"));
}

#[test]
fn validate_directory_reports_warnings() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("validate")
        .arg("--gradebook")
        .arg(gradebooks())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cohort: python-2024-b"))
        .stdout(predicate::str::contains("Cohort: rust-2024-a"))
        .stdout(predicate::str::contains(
            "[cert-enzo] WARNING: final score 55 is outside the cohort scale",
        ))
        .stdout(predicate::str::contains("0 error(s), 1 warning(s) found"));
}

#[test]
fn validate_degenerate_scale_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[cohort]
id = "broken"
course_id = "rust"

[[exams]]
id = "quiz"
score_min = 10.0
score_max = 10.0
"#,
    )
    .unwrap();

    cohortgrade(dir.path())
        .arg("validate")
        .arg("--gradebook")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[quiz] ERROR: exam has a degenerate scale"))
        .stderr(predicate::str::contains("would prevent evaluation"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("validate")
        .arg("--gradebook")
        .arg("no_such_file.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read gradebook file"));
}

#[test]
fn evaluate_writes_json_and_html_reports() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");

    cohortgrade(dir.path())
        .arg("evaluate")
        .arg("--gradebook")
        .arg(gradebooks())
        .arg("--output")
        .arg(&output)
        .arg("--format")
        .arg("all")
        .assert()
        .success()
        .stdout(predicate::str::contains("RST-2024-A"))
        .stdout(predicate::str::contains("PY-2024-B"))
        .stderr(predicate::str::contains("2/2 cohorts evaluated, 0 failed"));

    let files: Vec<_> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 4);
    assert_eq!(files.iter().filter(|f| f.ends_with(".json")).count(), 2);
    assert_eq!(files.iter().filter(|f| f.ends_with(".html")).count(), 2);
    assert!(files.iter().any(|f| f.starts_with("rust-2024-a-")));
}

#[test]
fn evaluate_report_contains_rounded_ranking() {
    let dir = TempDir::new().unwrap();

    cohortgrade(dir.path())
        .arg("evaluate")
        .arg("--gradebook")
        .arg(rust_cohort())
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success();

    let json = std::fs::read_to_string(single_report(dir.path(), "json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["cohort"]["id"], "rust-2024-a");
    assert_eq!(report["ranking"]["ranked"][0]["student_id"], "ana");
    assert_eq!(report["ranking"]["ranked"][1]["student_id"], "bruno");
    assert_eq!(report["ranking"]["unranked"][0], "carla");
    assert_eq!(report["ranking"]["total_enrolled"], 3);
    assert_eq!(report["statistics"]["total_graded"], 4);
}

#[test]
fn evaluate_fails_when_a_cohort_fails() {
    let dir = TempDir::new().unwrap();
    let books = dir.path().join("books");
    std::fs::create_dir(&books).unwrap();
    std::fs::copy(rust_cohort(), books.join("rust-2024-a.toml")).unwrap();
    std::fs::write(
        books.join("broken.toml"),
        r#"
[cohort]
id = "broken"
course_id = "rust"

[[exams]]
id = "quiz"
score_min = 10.0
score_max = 10.0
"#,
    )
    .unwrap();
    let output = dir.path().join("out");

    cohortgrade(dir.path())
        .arg("evaluate")
        .arg("--gradebook")
        .arg(&books)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stdout(predicate::str::contains("RST-2024-A"))
        .stderr(predicate::str::contains("ERROR: broken"))
        .stderr(predicate::str::contains("1 cohort(s) failed to evaluate"));

    // The healthy cohort's report is still written.
    let report = single_report(&output, "json");
    assert!(report
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("rust-2024-a-"));
}

#[test]
fn evaluate_warns_about_duplicate_cohort_ids() {
    let dir = TempDir::new().unwrap();
    let books = dir.path().join("books");
    std::fs::create_dir(&books).unwrap();
    std::fs::copy(rust_cohort(), books.join("a.toml")).unwrap();
    std::fs::copy(rust_cohort(), books.join("b.toml")).unwrap();

    cohortgrade(dir.path())
        .arg("evaluate")
        .arg("--gradebook")
        .arg(&books)
        .arg("--format")
        .arg("none")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "gradebook for cohort 'rust-2024-a' replaces an earlier one",
        ))
        .stderr(predicate::str::contains("1/1 cohorts evaluated"));
}

#[test]
fn evaluate_uses_config_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("cohortgrade.toml"),
        "output_dir = \"configured\"\ndefault_format = \"html\"\n",
    )
    .unwrap();

    cohortgrade(dir.path())
        .arg("evaluate")
        .arg("--gradebook")
        .arg(rust_cohort())
        .assert()
        .success();

    single_report(&dir.path().join("configured"), "html");
}

#[test]
fn evaluate_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("evaluate")
        .arg("--gradebook")
        .arg(rust_cohort())
        .arg("--format")
        .arg("sarif")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format: 'sarif'"));
}

#[test]
fn rank_student_below_average() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("rank")
        .arg("--gradebook")
        .arg(rust_cohort())
        .arg("--cohort")
        .arg("rust-2024-a")
        .arg("--student")
        .arg("bruno")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rank:             #2"))
        .stdout(predicate::str::contains("Average:          85.0"))
        .stdout(predicate::str::contains("Delta to best:    -12.0"))
        .stdout(predicate::str::contains("-6.0 below cohort average"));
}

#[test]
fn rank_student_at_average() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("rank")
        .arg("--gradebook")
        .arg(gradebooks())
        .arg("--cohort")
        .arg("python-2024-b")
        .arg("--student")
        .arg("dora")
        .assert()
        .success()
        .stdout(predicate::str::contains("#2"))
        .stdout(predicate::str::contains("at cohort average"));
}

#[test]
fn rank_ungraded_student_as_json() {
    let dir = TempDir::new().unwrap();
    let output = cohortgrade(dir.path())
        .arg("rank")
        .arg("--gradebook")
        .arg(rust_cohort())
        .arg("--cohort")
        .arg("rust-2024-a")
        .arg("--student")
        .arg("carla")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["my_rank"], "unranked");
    assert_eq!(view["my_average"], serde_json::Value::Null);
    assert_eq!(view["message"]["kind"], "not_graded");
    assert_eq!(view["total_graded"], 2);
    assert_eq!(view["cohort_average"], 91.0);
}

#[test]
fn rank_ranked_student_as_json() {
    let dir = TempDir::new().unwrap();
    let output = cohortgrade(dir.path())
        .arg("rank")
        .arg("--gradebook")
        .arg(rust_cohort())
        .arg("--cohort")
        .arg("rust-2024-a")
        .arg("--student")
        .arg("bruno")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["my_rank"], 2);
    assert_eq!(view["message"]["kind"], "below_average");
    assert_eq!(view["message"]["delta"], -6.0);
}

#[test]
fn rank_whole_cohort() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("rank")
        .arg("--gradebook")
        .arg(rust_cohort())
        .arg("--cohort")
        .arg("rust-2024-a")
        .assert()
        .success()
        .stdout(predicate::str::contains("ana"))
        .stdout(predicate::str::contains("unranked"))
        .stdout(predicate::str::contains(
            "Cohort average 91.0, best 97.0, 2/3 students graded",
        ));
}

#[test]
fn rank_unknown_cohort_fails() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("rank")
        .arg("--gradebook")
        .arg(rust_cohort())
        .arg("--cohort")
        .arg("nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown cohort: nope"));
}

#[test]
fn verify_by_code_and_by_id() {
    let dir = TempDir::new().unwrap();
    for key in ["RST-7F3K-21QX", "cert-ana"] {
        cohortgrade(dir.path())
            .arg("verify")
            .arg("--gradebook")
            .arg(gradebooks())
            .arg(key)
            .assert()
            .success()
            .stdout(predicate::str::contains("Status:       Approved"))
            .stdout(predicate::str::contains("Ana Souza [ana]"))
            .stdout(predicate::str::contains("Rust Fundamentals [rust]"))
            .stdout(predicate::str::contains("Issued:       2024-07-01"));
    }
}

#[test]
fn verify_derives_pending_and_rejected() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("verify")
        .arg("--gradebook")
        .arg(gradebooks())
        .arg("cert-bruno")
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:       Pending"))
        .stdout(predicate::str::contains("Final score:  -"));

    cohortgrade(dir.path())
        .arg("verify")
        .arg("--gradebook")
        .arg(gradebooks())
        .arg("PY-55TR-0K1A")
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:       Rejected"));
}

#[test]
fn verify_unknown_key_is_not_found() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("verify")
        .arg("--gradebook")
        .arg(gradebooks())
        .arg("XXXX-0000")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Certificate not found: XXXX-0000"));
}

#[test]
fn verify_json_output() {
    let dir = TempDir::new().unwrap();
    let output = cohortgrade(dir.path())
        .arg("verify")
        .arg("--gradebook")
        .arg(rust_cohort())
        .arg("--format")
        .arg("json")
        .arg("RST-7F3K-21QX")
        .output()
        .unwrap();
    assert!(output.status.success());

    let lookup: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(lookup["outcome"], "found");
    assert_eq!(lookup["status"], "approved");
    assert_eq!(lookup["cohort_code"], "RST-2024-A");
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created cohortgrade.toml"))
        .stdout(predicate::str::contains("Created gradebooks/example.toml"));

    assert!(dir.path().join("cohortgrade.toml").exists());
    assert!(dir.path().join("gradebooks/example.toml").exists());

    cohortgrade(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping"));

    cohortgrade(dir.path())
        .arg("validate")
        .arg("--gradebook")
        .arg("gradebooks/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All gradebooks valid"));
}

/// Evaluate `gradebook` into its own directory and return the JSON report path.
fn evaluate_to_json(workdir: &Path, gradebook: &Path, name: &str) -> PathBuf {
    let output = workdir.join(name);
    cohortgrade(workdir)
        .arg("evaluate")
        .arg("--gradebook")
        .arg(gradebook)
        .arg("--output")
        .arg(&output)
        .arg("--format")
        .arg("json")
        .assert()
        .success();
    single_report(&output, "json")
}

#[test]
fn compare_identical_reports() {
    let dir = TempDir::new().unwrap();
    let baseline = evaluate_to_json(dir.path(), &rust_cohort(), "baseline");
    let current = evaluate_to_json(dir.path(), &rust_cohort(), "current");

    cohortgrade(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--fail-on-regression")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 regressions, 0 improvements, 2 unchanged",
        ));
}

#[test]
fn compare_detects_regression() {
    let dir = TempDir::new().unwrap();
    let baseline = evaluate_to_json(dir.path(), &rust_cohort(), "baseline");

    // bruno's final drops from 6/10 to 3/10: 88 -> 79 on the cohort scale.
    let regraded = std::fs::read_to_string(rust_cohort())
        .unwrap()
        .replace("exam = \"final\"\nscore = 6.0", "exam = \"final\"\nscore = 3.0");
    let regraded_path = dir.path().join("regraded.toml");
    std::fs::write(&regraded_path, regraded).unwrap();
    let current = evaluate_to_json(dir.path(), &regraded_path, "current");

    cohortgrade(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 regressions"))
        .stdout(predicate::str::contains("bruno 85.0 -> 80.5 (-4.5)"));

    cohortgrade(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("### Regressions"));

    cohortgrade(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--fail-on-regression")
        .assert()
        .code(1);

    cohortgrade(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--threshold")
        .arg("5")
        .arg("--fail-on-regression")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 regressions"));
}

#[test]
fn compare_nonexistent_report() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Cohort grading, ranking and certificate verification",
        ));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    cohortgrade(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cohortgrade"));
}
