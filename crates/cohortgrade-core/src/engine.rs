//! Cohort evaluation orchestrator.
//!
//! Fetches gradebook snapshots from the injected store and runs them through
//! the pure pipeline: normalize every grade, derive pass flags, aggregate
//! per-exam and per-cohort statistics, and rank the students. Several
//! cohorts can be evaluated concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::certificate::{self, CertificateLookup};
use crate::error::EvalError;
use crate::grading::{is_passing, rescale, GradeView};
use crate::model::{Enrollment, Exam, Grade, Gradebook, Scale};
use crate::ranking::{rank, RankingView, StudentScores};
use crate::report::{CohortReport, CohortSummary, StudentGrade};
use crate::statistics::{aggregate, per_exam, GradeEntry};
use crate::traits::GradebookStore;

/// Configuration for the evaluation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum cohorts evaluated at once.
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_cohort_start(&self, cohort_id: &str);
    fn on_cohort_complete(&self, report: &CohortReport);
    fn on_cohort_error(&self, cohort_id: &str, error: &str);
    fn on_run_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_cohort_start(&self, _: &str) {}
    fn on_cohort_complete(&self, _: &CohortReport) {}
    fn on_cohort_error(&self, _: &str, _: &str) {}
    fn on_run_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The evaluation engine.
pub struct EvaluationEngine {
    store: Arc<dyn GradebookStore>,
    config: EngineConfig,
}

impl EvaluationEngine {
    pub fn new(store: Arc<dyn GradebookStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    async fn snapshot(&self, cohort_id: &str) -> Result<Gradebook, EvalError> {
        self.store
            .gradebook(cohort_id)
            .await
            .map_err(EvalError::store)?
            .ok_or_else(|| EvalError::UnknownCohort {
                id: cohort_id.to_string(),
            })
    }

    /// Evaluate one cohort from a fresh snapshot.
    pub async fn evaluate_cohort(&self, cohort_id: &str) -> Result<CohortReport, EvalError> {
        let book = self.snapshot(cohort_id).await?;
        let report = build_report(&book, Uuid::new_v4(), Utc::now())?;
        tracing::debug!(
            cohort = cohort_id,
            graded = report.statistics.total_graded,
            ranked = report.ranking.total_graded(),
            "cohort evaluated"
        );
        Ok(report)
    }

    /// Evaluate every cohort in the store.
    ///
    /// Cohorts that fail (e.g. a degenerate exam scale) are reported through
    /// `progress` and left out of the result; the rest are returned sorted
    /// by cohort id.
    pub async fn evaluate_all(&self, progress: &dyn ProgressReporter) -> Result<Vec<CohortReport>> {
        let start = Instant::now();
        let cohort_ids = self.store.cohort_ids().await?;
        tracing::info!(
            store = self.store.name(),
            cohorts = cohort_ids.len(),
            "evaluating cohorts"
        );
        let semaphore = Semaphore::new(self.config.parallelism.max(1));

        let mut futures = FuturesUnordered::new();
        for cohort_id in &cohort_ids {
            let semaphore = &semaphore;
            futures.push(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => {
                        progress.on_cohort_start(cohort_id);
                        self.evaluate_cohort(cohort_id).await
                    }
                    Err(_) => Err(EvalError::Store("semaphore closed".into())),
                };
                (cohort_id, result)
            });
        }

        let mut reports = Vec::new();
        let mut failed = 0usize;
        let total = futures.len();

        while let Some((cohort_id, result)) = futures.next().await {
            match result {
                Ok(report) => {
                    progress.on_cohort_complete(&report);
                    reports.push(report);
                }
                Err(e) => {
                    tracing::error!("evaluation failed for cohort {cohort_id}: {e}");
                    progress.on_cohort_error(cohort_id, &e.to_string());
                    failed += 1;
                }
            }
        }

        progress.on_run_complete(total, reports.len(), failed, start.elapsed());
        reports.sort_by(|a, b| a.cohort.id.cmp(&b.cohort.id));
        Ok(reports)
    }

    /// One student's position within a cohort.
    ///
    /// A student who is not enrolled or has no grades comes back unranked.
    pub async fn student_position(
        &self,
        cohort_id: &str,
        student_id: &str,
    ) -> Result<RankingView, EvalError> {
        let report = self.evaluate_cohort(cohort_id).await?;
        Ok(report.view_for(student_id))
    }

    /// Resolve a certificate by id or public code.
    pub async fn verify_certificate(&self, key: &str) -> Result<CertificateLookup, EvalError> {
        let (by_id, by_code) = futures::try_join!(
            self.store.certificate_by_id(key),
            self.store.certificate_by_code(key)
        )
        .map_err(EvalError::store)?;
        Ok(certificate::resolve(key, by_id.iter().chain(by_code.iter())))
    }
}

/// Deduplicate enrollments by student, keeping the earliest.
fn unique_enrollments(enrollments: &[Enrollment]) -> Vec<&Enrollment> {
    let mut earliest: HashMap<&str, &Enrollment> = HashMap::new();
    let mut order = Vec::new();
    for e in enrollments {
        match earliest.get_mut(e.student_id.as_str()) {
            Some(existing) => {
                if e.enrolled_at < existing.enrolled_at {
                    *existing = e;
                }
            }
            None => {
                order.push(e.student_id.as_str());
                earliest.insert(e.student_id.as_str(), e);
            }
        }
    }
    order.into_iter().map(|id| earliest[id]).collect()
}

/// Deduplicate exams by id. A later definition replaces an earlier one in
/// place, so the order is that of first appearance.
fn unique_exams(exams: &[Exam]) -> Vec<Exam> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<Exam> = Vec::with_capacity(exams.len());
    for exam in exams {
        match index.get(exam.id.as_str()) {
            Some(&i) => unique[i] = exam.clone(),
            None => {
                index.insert(exam.id.as_str(), unique.len());
                unique.push(exam.clone());
            }
        }
    }
    unique
}

/// Evaluate a gradebook snapshot into a report.
///
/// Grades for unknown exams or non-enrolled students are skipped with a
/// warning. When a (student, exam) pair is graded more than once the last
/// grade wins, as corrections overwrite earlier scores. The same goes for
/// an exam id defined more than once.
pub fn build_report(
    book: &Gradebook,
    id: Uuid,
    created_at: DateTime<Utc>,
) -> Result<CohortReport, EvalError> {
    let cohort = &book.cohort;
    let cohort_scale = cohort.checked_scale()?;
    let exams = unique_exams(&book.exams);
    if exams.len() < book.exams.len() {
        tracing::warn!(
            cohort = %cohort.id,
            "{} duplicate exam definition(s) replaced by later ones",
            book.exams.len() - exams.len()
        );
    }
    let exam_scales: HashMap<&str, Scale> = exams
        .iter()
        .map(|e| Ok((e.id.as_str(), e.checked_scale()?)))
        .collect::<Result<_, EvalError>>()?;

    let enrollments = unique_enrollments(&book.enrollments);

    let mut latest: HashMap<(&str, &str), &Grade> = HashMap::new();
    for grade in &book.grades {
        if !exam_scales.contains_key(grade.exam_id.as_str()) {
            tracing::warn!(
                cohort = %cohort.id,
                "skipping grade for unknown exam '{}'",
                grade.exam_id
            );
            continue;
        }
        if book.enrollment(&grade.student_id).is_none() {
            tracing::warn!(
                cohort = %cohort.id,
                "skipping grade for non-enrolled student '{}'",
                grade.student_id
            );
            continue;
        }
        latest.insert((grade.student_id.as_str(), grade.exam_id.as_str()), grade);
    }

    let mut entries = Vec::with_capacity(exams.len() * enrollments.len());
    let mut grades = Vec::new();
    let mut scores: HashMap<&str, Vec<f64>> = HashMap::new();

    for exam in &exams {
        let exam_scale = exam_scales[exam.id.as_str()];
        for enrollment in &enrollments {
            let student_id = enrollment.student_id.as_str();
            let Some(grade) = latest.get(&(student_id, exam.id.as_str())) else {
                entries.push(GradeEntry::ungraded(&exam.id, student_id));
                continue;
            };

            let normalized = rescale(grade.score, exam_scale, cohort_scale)?;
            entries.push(GradeEntry::graded(&exam.id, student_id, normalized));
            scores.entry(student_id).or_default().push(normalized);
            grades.push(StudentGrade {
                student_id: student_id.to_string(),
                exam_id: exam.id.clone(),
                view: GradeView {
                    raw_score: grade.score,
                    normalized_score: normalized,
                    passed: is_passing(normalized, cohort.pass_min),
                },
            });
        }
    }

    let students: Vec<StudentScores> = enrollments
        .iter()
        .map(|e| StudentScores {
            student_id: e.student_id.clone(),
            enrolled_at: Some(e.enrolled_at),
            scores: scores.remove(e.student_id.as_str()).unwrap_or_default(),
        })
        .collect();

    Ok(CohortReport {
        id,
        created_at,
        cohort: CohortSummary {
            id: cohort.id.clone(),
            code: cohort.code.clone(),
            course_id: cohort.course.id.clone(),
            course_title: cohort.course.title.clone(),
            pass_min: cohort.pass_min,
            pass_max: cohort.pass_max,
            exam_count: exams.len(),
            enrolled_count: enrollments.len(),
        },
        statistics: aggregate(exams.len(), &entries, cohort.pass_min),
        exams: per_exam(&exams, &entries, cohort.pass_min),
        ranking: rank(&students, enrollments.len()),
        grades,
    })
}
