//! Core data model types for cohortgrade.
//!
//! These mirror the records the platform's data store holds for one cohort.
//! Derived values (normalized scores, pass flags, certificate status) are
//! never stored here; they are computed on read by the grading modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// A closed numeric grading scale `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub min: f64,
    pub max: f64,
}

impl Scale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `true` if the scale has finite bounds and `max > min`.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }

    /// Validate the scale, naming the owning entity in the error.
    pub fn checked(self, entity: &str, id: &str) -> Result<Self, EvalError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(EvalError::Configuration {
                entity: entity.to_string(),
                id: id.to_string(),
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Width of the scale.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// The course a cohort is an edition of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
}

/// A scheduled edition of a course with its own grading scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: String,
    /// Human-facing edition code (e.g. "RUST-2024-A").
    pub code: String,
    pub course: Course,
    /// Lowest grade on the cohort scale that still counts as passing.
    pub pass_min: f64,
    /// Highest grade on the cohort scale.
    pub pass_max: f64,
}

impl Cohort {
    pub fn scale(&self) -> Scale {
        Scale::new(self.pass_min, self.pass_max)
    }

    /// The cohort scale, or a configuration error if it is degenerate.
    pub fn checked_scale(&self) -> Result<Scale, EvalError> {
        self.scale().checked("cohort", &self.id)
    }
}

/// A gradable assessment with the raw scale its grader used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub name: String,
    pub score_min: f64,
    pub score_max: f64,
}

impl Exam {
    pub fn scale(&self) -> Scale {
        Scale::new(self.score_min, self.score_max)
    }

    pub fn checked_scale(&self) -> Result<Scale, EvalError> {
        self.scale().checked("exam", &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
}

/// A student's participation in a cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String,
    pub enrolled_at: DateTime<Utc>,
}

/// The raw result of one student's submission for one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub student_id: String,
    pub exam_id: String,
    pub score: f64,
}

/// An issued certificate. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
    pub student_id: String,
    pub cohort_id: String,
    /// Public, shareable code.
    pub unique_code: String,
    pub issued_at: DateTime<Utc>,
    /// Final grade on the cohort scale, snapshotted at issuance.
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub document_url: Option<String>,
}

/// A certificate joined with the student and cohort it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub certificate: Certificate,
    pub student: Student,
    pub cohort: Cohort,
}

/// A point-in-time snapshot of everything the engine needs for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradebook {
    pub cohort: Cohort,
    #[serde(default)]
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub grades: Vec<Grade>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
}

impl Gradebook {
    /// The exam with this id. A later definition shadows an earlier one.
    pub fn exam(&self, id: &str) -> Option<&Exam> {
        self.exams.iter().rev().find(|e| e.id == id)
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn enrollment(&self, student_id: &str) -> Option<&Enrollment> {
        self.enrollments.iter().find(|e| e.student_id == student_id)
    }

    /// Join a certificate with its student and this gradebook's cohort.
    ///
    /// A student missing from the roster (e.g. removed after graduating) is
    /// named by their id.
    pub fn certificate_record(&self, certificate: &Certificate) -> CertificateRecord {
        let student = self
            .student(&certificate.student_id)
            .cloned()
            .unwrap_or_else(|| Student {
                id: certificate.student_id.clone(),
                name: certificate.student_id.clone(),
            });
        CertificateRecord {
            certificate: certificate.clone(),
            student,
            cohort: self.cohort.clone(),
        }
    }
}
