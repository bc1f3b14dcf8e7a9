//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined. Figures are
//! shown rounded to one decimal place; the embedded JSON keeps full precision.

use anyhow::Result;
use std::path::Path;

use cohortgrade_core::grading::round1;
use cohortgrade_core::report::CohortReport;
use cohortgrade_core::statistics::ExamStatistics;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a cohort report.
pub fn generate_html(report: &CohortReport) -> String {
    let mut html = String::new();
    let cohort = &report.cohort;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>cohortgrade report: {}</title>\n",
        html_escape(&cohort.code)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!(
        "<h1>{} <small>{}</small></h1>\n",
        html_escape(&cohort.course_title),
        html_escape(&cohort.code)
    ));
    html.push_str(&format!(
        "<p class=\"meta\">Scale {}–{} | {} exams | {} enrolled | {}</p>\n",
        cohort.pass_min,
        cohort.pass_max,
        cohort.exam_count,
        cohort.enrolled_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Cohort statistics
    let stats = report.statistics.rounded();
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Exams</th><th>Graded</th><th>Average</th><th>Passed</th><th>Failed</th><th>Pass rate</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{:.1}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr></tbody>\n",
        stats.total_exams,
        stats.total_graded,
        stats.average,
        stats.pass_count,
        stats.fail_count,
        stats.pass_rate,
    ));
    html.push_str("</table>\n");

    if !report.exams.is_empty() {
        html.push_str(&generate_bar_chart(&report.exams));
    }
    html.push_str("</section>\n");

    // Per-exam statistics
    html.push_str("<section class=\"exams\">\n");
    html.push_str("<h2>Exams</h2>\n");
    html.push_str("<table>\n");
    html.push_str("<thead><tr><th>Exam</th><th>Graded</th><th>Average</th><th>Passed</th><th>Failed</th><th>Pass rate</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for exam in report.exams.iter().map(ExamStatistics::rounded) {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.1}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
            html_escape(&exam.exam_name),
            exam.total_graded,
            exam.average,
            exam.pass_count,
            exam.fail_count,
            exam.pass_rate,
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Ranking
    let ranking = &report.ranking;
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Ranking</h2>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Best average {:.1} | cohort average {:.1} | {} of {} students graded</p>\n",
        round1(ranking.best_average),
        round1(ranking.cohort_average),
        ranking.total_graded(),
        ranking.total_enrolled,
    ));
    html.push_str("<table class=\"results-table\" id=\"ranking\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Rank</th><th onclick=\"sortTable(1)\">Student</th><th onclick=\"sortTable(2)\">Average</th><th onclick=\"sortTable(3)\">Graded exams</th><th>Position</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for r in &ranking.ranked {
        let view = ranking.view_for(&r.student_id);
        let class = if r.average >= cohort.pass_min {
            "pass"
        } else {
            "fail"
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{:.1}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            r.rank,
            html_escape(&r.student_id),
            round1(r.average),
            r.graded_exams,
            html_escape(&view.message.to_string()),
        ));
    }
    for student_id in &ranking.unranked {
        html.push_str(&format!(
            "<tr class=\"unranked\"><td>-</td><td>{}</td><td>-</td><td>0</td><td>not graded yet</td></tr>\n",
            html_escape(student_id),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &CohortReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// Horizontal bar chart of per-exam pass rates.
fn generate_bar_chart(exams: &[ExamStatistics]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = exams.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, exam) in exams.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let rate = exam.pass_rate / 100.0;
        let width = (rate * max_width as f64) as usize;

        let color = if exam.total_graded == 0 {
            "#9ca3af"
        } else if rate >= 0.8 {
            "#22c55e"
        } else if rate >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&exam.exam_name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            round1(exam.pass_rate)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --muted: #6b7280; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --muted: #9ca3af; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
h1 small { color: var(--muted); font-weight: normal; }
.meta { color: var(--muted); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.unranked { color: var(--muted); font-style: italic; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('ranking');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  const key = cell => {
    const n = parseFloat(cell.textContent);
    return isNaN(n) ? cell.textContent : n;
  };
  rows.sort((a, b) => {
    const va = key(a.cells[col]);
    const vb = key(b.cells[col]);
    const cmp = typeof va === 'number' && typeof vb === 'number'
      ? va - vb
      : String(va).localeCompare(String(vb));
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use cohortgrade_core::model::Exam;
    use cohortgrade_core::ranking::{rank, StudentScores};
    use cohortgrade_core::report::CohortSummary;
    use cohortgrade_core::statistics::{aggregate, per_exam, GradeEntry};

    fn make_test_report() -> CohortReport {
        let exams = vec![
            Exam {
                id: "midterm".into(),
                name: "Midterm <A>".into(),
                score_min: 0.0,
                score_max: 20.0,
            },
            Exam {
                id: "final".into(),
                name: "Final".into(),
                score_min: 0.0,
                score_max: 10.0,
            },
        ];
        let entries = vec![
            GradeEntry::graded("midterm", "ana", 92.5),
            GradeEntry::graded("midterm", "bruno", 64.0),
            GradeEntry::ungraded("final", "ana"),
        ];
        let students = vec![
            StudentScores {
                student_id: "ana".into(),
                enrolled_at: None,
                scores: vec![92.5],
            },
            StudentScores {
                student_id: "bruno".into(),
                enrolled_at: None,
                scores: vec![64.0],
            },
            StudentScores {
                student_id: "carla".into(),
                enrolled_at: None,
                scores: vec![],
            },
        ];

        CohortReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            cohort: CohortSummary {
                id: "rust-2024-a".into(),
                code: "RUST-2024-A".into(),
                course_id: "rust".into(),
                course_title: "Rust Fundamentals".into(),
                pass_min: 70.0,
                pass_max: 100.0,
                exam_count: 2,
                enrolled_count: 3,
            },
            statistics: aggregate(2, &entries, 70.0),
            exams: per_exam(&exams, &entries, 70.0),
            ranking: rank(&students, 3),
            grades: vec![],
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report();
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Rust Fundamentals"));
        assert!(html.contains("RUST-2024-A"));
        assert!(html.contains("ana"));
        assert!(html.contains("top of cohort"));
        assert!(html.contains("not graded yet"));
        assert!(html.contains("78.3"), "cohort average should be shown rounded");
    }

    #[test]
    fn html_report_escapes_names() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("Midterm &lt;A&gt;"));
        assert!(!html.contains("Midterm <A>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
