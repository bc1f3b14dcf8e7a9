//! The `cohortgrade init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("cohortgrade.toml").exists() {
        println!("cohortgrade.toml already exists, skipping.");
    } else {
        std::fs::write("cohortgrade.toml", SAMPLE_CONFIG)?;
        println!("Created cohortgrade.toml");
    }

    std::fs::create_dir_all("gradebooks")?;
    let example_path = Path::new("gradebooks/example.toml");
    if example_path.exists() {
        println!("gradebooks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_GRADEBOOK)?;
        println!("Created gradebooks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: cohortgrade validate --gradebook gradebooks/example.toml");
    println!("  2. Run: cohortgrade evaluate --gradebook gradebooks");
    println!("  3. Run: cohortgrade verify --gradebook gradebooks EX-2024-0001");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# cohortgrade configuration

output_dir = "./cohortgrade-results"
# json, html, all or none
default_format = "json"
parallelism = 4
# Minimum change in a student's average reported by `compare`
regression_threshold = 0.5
"#;

const EXAMPLE_GRADEBOOK: &str = r#"[cohort]
id = "example-2024"
code = "EX-2024"
course_id = "example"
course_title = "Example Course"
pass_min = 60.0
pass_max = 100.0

[[exams]]
id = "quiz"
name = "Quiz"
score_max = 10.0

[[exams]]
id = "final"
name = "Final exam"
score_max = 100.0

[[students]]
id = "alice"
name = "Alice"
enrolled_at = "2024-02-01T09:00:00Z"

[[students]]
id = "bob"
name = "Bob"
enrolled_at = "2024-02-03T09:00:00Z"

[[grades]]
student = "alice"
exam = "quiz"
score = 9.0

[[grades]]
student = "alice"
exam = "final"
score = 80.0

[[grades]]
student = "bob"
exam = "quiz"
score = 5.0

[[certificates]]
id = "cert-alice"
student = "alice"
code = "EX-2024-0001"
issued_at = "2024-07-01T12:00:00Z"
final_score = 88.0
"#;
