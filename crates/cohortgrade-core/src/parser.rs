//! TOML gradebook parser.
//!
//! Loads cohort gradebooks from TOML files and directories, and validates
//! them.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{
    Certificate, Cohort, Course, Enrollment, Exam, Grade, Gradebook, Scale, Student,
};

/// Intermediate TOML structure for parsing gradebook files.
#[derive(Debug, Deserialize)]
struct TomlGradebookFile {
    cohort: TomlCohort,
    #[serde(default)]
    exams: Vec<TomlExam>,
    #[serde(default)]
    students: Vec<TomlStudent>,
    #[serde(default)]
    grades: Vec<TomlGrade>,
    #[serde(default)]
    certificates: Vec<TomlCertificate>,
}

#[derive(Debug, Deserialize)]
struct TomlCohort {
    id: String,
    #[serde(default)]
    code: Option<String>,
    course_id: String,
    #[serde(default)]
    course_title: Option<String>,
    #[serde(default = "default_pass_min")]
    pass_min: f64,
    #[serde(default = "default_pass_max")]
    pass_max: f64,
}

fn default_pass_min() -> f64 {
    60.0
}

fn default_pass_max() -> f64 {
    100.0
}

#[derive(Debug, Deserialize)]
struct TomlExam {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    score_min: f64,
    score_max: f64,
}

#[derive(Debug, Deserialize)]
struct TomlStudent {
    id: String,
    #[serde(default)]
    name: Option<String>,
    /// RFC 3339 timestamp, e.g. "2024-02-01T09:00:00Z".
    enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TomlGrade {
    student: String,
    exam: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct TomlCertificate {
    id: String,
    student: String,
    code: String,
    issued_at: DateTime<Utc>,
    #[serde(default)]
    final_score: Option<f64>,
    #[serde(default)]
    document_url: Option<String>,
}

/// Parse a single TOML file into a `Gradebook`.
pub fn parse_gradebook(path: &Path) -> Result<Gradebook> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read gradebook file: {}", path.display()))?;

    parse_gradebook_str(&content, path)
}

/// Parse a TOML string into a `Gradebook` (useful for testing).
pub fn parse_gradebook_str(content: &str, source_path: &Path) -> Result<Gradebook> {
    let parsed: TomlGradebookFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let c = parsed.cohort;
    let cohort = Cohort {
        code: c.code.unwrap_or_else(|| c.id.to_uppercase()),
        course: Course {
            title: c.course_title.unwrap_or_else(|| c.course_id.clone()),
            id: c.course_id,
        },
        id: c.id,
        pass_min: c.pass_min,
        pass_max: c.pass_max,
    };

    let exams = parsed
        .exams
        .into_iter()
        .map(|e| Exam {
            name: e.name.unwrap_or_else(|| e.id.clone()),
            id: e.id,
            score_min: e.score_min,
            score_max: e.score_max,
        })
        .collect();

    let mut students = Vec::with_capacity(parsed.students.len());
    let mut enrollments = Vec::with_capacity(parsed.students.len());
    for s in parsed.students {
        enrollments.push(Enrollment {
            student_id: s.id.clone(),
            enrolled_at: s.enrolled_at,
        });
        students.push(Student {
            name: s.name.unwrap_or_else(|| s.id.clone()),
            id: s.id,
        });
    }

    let grades = parsed
        .grades
        .into_iter()
        .map(|g| Grade {
            student_id: g.student,
            exam_id: g.exam,
            score: g.score,
        })
        .collect();

    let certificates = parsed
        .certificates
        .into_iter()
        .map(|cert| Certificate {
            id: cert.id,
            student_id: cert.student,
            cohort_id: cohort.id.clone(),
            unique_code: cert.code,
            issued_at: cert.issued_at,
            final_score: cert.final_score,
            document_url: cert.document_url,
        })
        .collect();

    Ok(Gradebook {
        cohort,
        exams,
        students,
        enrollments,
        grades,
        certificates,
    })
}

/// Recursively load all `.toml` gradebook files from a directory.
pub fn load_gradebook_directory(dir: &Path) -> Result<Vec<Gradebook>> {
    let mut books = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            books.extend(load_gradebook_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_gradebook(&path) {
                Ok(book) => books.push(book),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(books)
}

/// Load a gradebook file, or every gradebook under a directory.
pub fn load_gradebooks(path: &Path) -> Result<Vec<Gradebook>> {
    if path.is_dir() {
        load_gradebook_directory(path)
    } else {
        Ok(vec![parse_gradebook(path)?])
    }
}

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Evaluation will still run; some data is ignored or clamped.
    Warning,
    /// Evaluation of this cohort will fail.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A finding from gradebook validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub severity: Severity,
    /// The exam, student or certificate concerned (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn warning(subject: &str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            subject: Some(subject.to_string()),
            message,
        }
    }

    fn error(subject: Option<&str>, message: String) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.map(str::to_string),
            message,
        }
    }
}

fn describe(scale: Scale) -> String {
    format!("[{}, {}]", scale.min, scale.max)
}

/// Validate a gradebook for common issues.
pub fn validate_gradebook(book: &Gradebook) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let cohort_scale = book.cohort.scale();

    if !cohort_scale.is_valid() {
        warnings.push(ValidationWarning::error(
            None,
            format!("cohort has a degenerate scale {}", describe(cohort_scale)),
        ));
    }

    // Exams: duplicate ids and degenerate scales
    let mut seen_exams = HashSet::new();
    for exam in &book.exams {
        if !seen_exams.insert(exam.id.as_str()) {
            warnings.push(ValidationWarning::warning(
                &exam.id,
                format!("duplicate exam ID: {}; the last definition wins", exam.id),
            ));
        }
        let effective = book.exam(&exam.id).is_some_and(|e| std::ptr::eq(e, exam));
        if effective && !exam.scale().is_valid() {
            warnings.push(ValidationWarning::error(
                Some(exam.id.as_str()),
                format!("exam has a degenerate scale {}", describe(exam.scale())),
            ));
        }
    }

    // Students: duplicate enrollments
    let mut seen_students = HashSet::new();
    for enrollment in &book.enrollments {
        if !seen_students.insert(enrollment.student_id.as_str()) {
            warnings.push(ValidationWarning::warning(
                &enrollment.student_id,
                format!("student {} is enrolled more than once", enrollment.student_id),
            ));
        }
    }

    // Grades
    let mut seen_grades = HashSet::new();
    for grade in &book.grades {
        let subject = format!("{}/{}", grade.student_id, grade.exam_id);
        if grade.score.is_nan() {
            warnings.push(ValidationWarning::error(
                Some(subject.as_str()),
                "score is not a number".into(),
            ));
        }
        match book.exam(&grade.exam_id) {
            None => warnings.push(ValidationWarning::warning(
                &subject,
                format!("grade refers to unknown exam {}", grade.exam_id),
            )),
            Some(exam) if exam.scale().is_valid() && !exam.scale().contains(grade.score) => {
                warnings.push(ValidationWarning::warning(
                    &subject,
                    format!(
                        "score {} is outside the exam scale {} and will be clamped",
                        grade.score,
                        describe(exam.scale())
                    ),
                ));
            }
            Some(_) => {}
        }
        if book.enrollment(&grade.student_id).is_none() {
            warnings.push(ValidationWarning::warning(
                &subject,
                format!("grade refers to non-enrolled student {}", grade.student_id),
            ));
        }
        if !seen_grades.insert((grade.student_id.as_str(), grade.exam_id.as_str())) {
            warnings.push(ValidationWarning::warning(
                &subject,
                "graded more than once; the last grade wins".into(),
            ));
        }
    }

    // Certificates
    let mut seen_codes = HashSet::new();
    for cert in &book.certificates {
        if !seen_codes.insert(cert.unique_code.as_str()) {
            warnings.push(ValidationWarning::warning(
                &cert.id,
                format!("duplicate certificate code: {}", cert.unique_code),
            ));
        }
        if book.student(&cert.student_id).is_none() {
            warnings.push(ValidationWarning::warning(
                &cert.id,
                format!("certificate refers to unknown student {}", cert.student_id),
            ));
        }
        if let Some(score) = cert.final_score {
            if cohort_scale.is_valid() && !cohort_scale.contains(score) {
                warnings.push(ValidationWarning::warning(
                    &cert.id,
                    format!(
                        "final score {score} is outside the cohort scale {}",
                        describe(cohort_scale)
                    ),
                ));
            }
        }
    }

    warnings
}

/// Returns true if any finding would make evaluation fail.
pub fn has_errors(warnings: &[ValidationWarning]) -> bool {
    warnings.iter().any(|w| w.severity == Severity::Error)
}
