//! Certificate lookup and status derivation.
//!
//! A lookup key may be a certificate's internal id or its public code; both
//! are tried. The approved/rejected status is never stored: it is derived on
//! every read from the snapshotted final score and the cohort's current
//! passing minimum, so editing the minimum changes what is displayed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::grading::is_passing;
use crate::model::CertificateRecord;

/// Derived outcome shown on a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    /// No final score recorded yet.
    Pending,
    Approved,
    Rejected,
}

impl CertificateStatus {
    pub fn derive(final_score: Option<f64>, pass_min: f64) -> Self {
        match final_score {
            None => CertificateStatus::Pending,
            Some(score) if is_passing(score, pass_min) => CertificateStatus::Approved,
            Some(_) => CertificateStatus::Rejected,
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateStatus::Pending => write!(f, "Pending"),
            CertificateStatus::Approved => write!(f, "Approved"),
            CertificateStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Public view of a resolved certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateView {
    pub certificate_id: String,
    pub unique_code: String,
    pub student_id: String,
    pub student_name: String,
    pub course_id: String,
    pub course_title: String,
    pub cohort_id: String,
    pub cohort_code: String,
    pub issued_at: DateTime<Utc>,
    pub final_score: Option<f64>,
    pub document_url: Option<String>,
    pub status: CertificateStatus,
}

impl CertificateView {
    pub fn from_record(record: &CertificateRecord) -> Self {
        let cert = &record.certificate;
        Self {
            certificate_id: cert.id.clone(),
            unique_code: cert.unique_code.clone(),
            student_id: record.student.id.clone(),
            student_name: record.student.name.clone(),
            course_id: record.cohort.course.id.clone(),
            course_title: record.cohort.course.title.clone(),
            cohort_id: record.cohort.id.clone(),
            cohort_code: record.cohort.code.clone(),
            issued_at: cert.issued_at,
            final_score: cert.final_score,
            document_url: cert.document_url.clone(),
            status: CertificateStatus::derive(cert.final_score, record.cohort.pass_min),
        }
    }
}

/// Outcome of a certificate lookup. A miss is an ordinary result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CertificateLookup {
    Found(CertificateView),
    NotFound { key: String },
}

impl CertificateLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, CertificateLookup::Found(_))
    }

    /// Convert a miss into [`EvalError::CertificateNotFound`].
    pub fn into_result(self) -> Result<CertificateView, EvalError> {
        match self {
            CertificateLookup::Found(view) => Ok(view),
            CertificateLookup::NotFound { key } => Err(EvalError::CertificateNotFound { key }),
        }
    }
}

/// Resolve `key` against candidate records, as an id or as a unique code.
///
/// An id match wins over a code match if the key happens to be both.
pub fn resolve<'a, I>(key: &str, records: I) -> CertificateLookup
where
    I: IntoIterator<Item = &'a CertificateRecord>,
{
    let mut by_code = None;
    for record in records {
        if record.certificate.id == key {
            return CertificateLookup::Found(CertificateView::from_record(record));
        }
        if by_code.is_none() && record.certificate.unique_code == key {
            by_code = Some(record);
        }
    }

    match by_code {
        Some(record) => CertificateLookup::Found(CertificateView::from_record(record)),
        None => CertificateLookup::NotFound {
            key: key.to_string(),
        },
    }
}
