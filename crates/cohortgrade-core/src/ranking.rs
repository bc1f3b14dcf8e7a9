//! Relative ranking of students within a cohort.
//!
//! Students are ordered by the mean of their own normalized scores. Students
//! without a single graded exam are left out of the ranking and out of the
//! cohort-level averages; they are reported as unranked.
//!
//! Equal averages are broken by earliest enrollment (a missing enrollment
//! date sorts after any known one), then by ascending student id, so the
//! order is total and reproducible regardless of input order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grading::round1;
use crate::statistics::mean;

/// A student's normalized scores within one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentScores {
    pub student_id: String,
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scores: Vec<f64>,
}

/// A student's place in the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStudent {
    pub student_id: String,
    /// 1-based position.
    pub rank: usize,
    pub average: f64,
    pub graded_exams: usize,
}

/// The ranked order of a cohort plus its cohort-level figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Students with at least one graded exam, best first.
    pub ranked: Vec<RankedStudent>,
    /// Students with no graded exams, sorted by id.
    pub unranked: Vec<String>,
    /// Highest personal average, `0` if nobody is ranked.
    pub best_average: f64,
    /// Mean of the personal averages, `0` if nobody is ranked.
    pub cohort_average: f64,
    pub total_enrolled: usize,
}

/// Rank as exposed in views: a position, or `"unranked"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RankRepr", try_from = "RankRepr")]
pub enum Rank {
    Ranked(usize),
    Unranked,
}

/// Wire form of [`Rank`]: a bare number or the string `"unranked"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RankRepr {
    Position(usize),
    Label(String),
}

const UNRANKED: &str = "unranked";

impl From<Rank> for RankRepr {
    fn from(rank: Rank) -> Self {
        match rank {
            Rank::Ranked(n) => RankRepr::Position(n),
            Rank::Unranked => RankRepr::Label(UNRANKED.to_string()),
        }
    }
}

impl TryFrom<RankRepr> for Rank {
    type Error = String;

    fn try_from(repr: RankRepr) -> Result<Self, Self::Error> {
        match repr {
            RankRepr::Position(0) => Err("rank positions start at 1".to_string()),
            RankRepr::Position(n) => Ok(Rank::Ranked(n)),
            RankRepr::Label(label) if label == UNRANKED => Ok(Rank::Unranked),
            RankRepr::Label(label) => Err(format!("invalid rank: '{label}'")),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Ranked(n) => write!(f, "#{n}"),
            Rank::Unranked => write!(f, "{UNRANKED}"),
        }
    }
}

/// Where a student sits relative to the rest of the cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "delta", rename_all = "snake_case")]
pub enum PositionMessage {
    OnlyGradedStudent,
    TopOfCohort,
    /// Points above the cohort average, one decimal place.
    AboveAverage(f64),
    /// Points below the cohort average (negative), one decimal place.
    BelowAverage(f64),
    AtAverage,
    NotGraded,
}

impl fmt::Display for PositionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionMessage::OnlyGradedStudent => write!(f, "only graded student"),
            PositionMessage::TopOfCohort => write!(f, "top of cohort"),
            PositionMessage::AboveAverage(delta) => {
                write!(f, "{delta:+.1} above cohort average")
            }
            PositionMessage::BelowAverage(delta) => {
                write!(f, "{delta:.1} below cohort average")
            }
            PositionMessage::AtAverage => write!(f, "at cohort average"),
            PositionMessage::NotGraded => write!(f, "not graded yet"),
        }
    }
}

/// One student's view of the cohort ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingView {
    pub student_id: String,
    pub my_average: Option<f64>,
    pub my_rank: Rank,
    pub best_average: f64,
    pub cohort_average: f64,
    pub total_enrolled: usize,
    /// Students with at least one graded exam.
    pub total_graded: usize,
    /// `my_average - best_average`.
    pub delta_to_best: Option<f64>,
    /// `my_average - cohort_average`.
    pub delta_to_average: Option<f64>,
    pub message: PositionMessage,
}

impl RankingView {
    /// Copy with every float rounded to one decimal place.
    pub fn rounded(&self) -> Self {
        Self {
            my_average: self.my_average.map(round1),
            best_average: round1(self.best_average),
            cohort_average: round1(self.cohort_average),
            delta_to_best: self.delta_to_best.map(round1),
            delta_to_average: self.delta_to_average.map(round1),
            ..self.clone()
        }
    }
}

struct Candidate<'a> {
    student_id: &'a str,
    enrolled_at: Option<DateTime<Utc>>,
    average: f64,
    graded_exams: usize,
}

fn by_enrollment(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rank the students of one cohort.
///
/// Entries sharing a student id are merged. `total_enrolled` is reported
/// as given; it may exceed the number of entries when some enrolled
/// students have no score record at all.
pub fn rank(students: &[StudentScores], total_enrolled: usize) -> Ranking {
    let mut order: Vec<&str> = Vec::new();
    let mut merged: HashMap<&str, (Option<DateTime<Utc>>, Vec<f64>)> = HashMap::new();
    for s in students {
        let slot = merged.entry(s.student_id.as_str()).or_insert_with(|| {
            order.push(s.student_id.as_str());
            (s.enrolled_at, Vec::new())
        });
        if by_enrollment(s.enrolled_at, slot.0).is_lt() {
            slot.0 = s.enrolled_at;
        }
        slot.1.extend_from_slice(&s.scores);
    }

    let mut candidates = Vec::new();
    let mut unranked = Vec::new();
    for id in order {
        let (enrolled_at, scores) = &merged[id];
        if scores.is_empty() {
            unranked.push(id.to_string());
        } else {
            candidates.push(Candidate {
                student_id: id,
                enrolled_at: *enrolled_at,
                average: mean(scores),
                graded_exams: scores.len(),
            });
        }
    }
    unranked.sort();

    candidates.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then_with(|| by_enrollment(a.enrolled_at, b.enrolled_at))
            .then_with(|| a.student_id.cmp(b.student_id))
    });

    let averages: Vec<f64> = candidates.iter().map(|c| c.average).collect();
    let best_average = averages.first().copied().unwrap_or(0.0);
    let cohort_average = mean(&averages);

    let ranked = candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| RankedStudent {
            student_id: c.student_id.to_string(),
            rank: i + 1,
            average: c.average,
            graded_exams: c.graded_exams,
        })
        .collect();

    Ranking {
        ranked,
        unranked,
        best_average,
        cohort_average,
        total_enrolled,
    }
}

impl Ranking {
    /// Number of students with at least one graded exam.
    pub fn total_graded(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn position(&self, student_id: &str) -> Option<&RankedStudent> {
        self.ranked.iter().find(|r| r.student_id == student_id)
    }

    /// Build the view for one student. Unknown students come back unranked.
    pub fn view_for(&self, student_id: &str) -> RankingView {
        let base = RankingView {
            student_id: student_id.to_string(),
            my_average: None,
            my_rank: Rank::Unranked,
            best_average: self.best_average,
            cohort_average: self.cohort_average,
            total_enrolled: self.total_enrolled,
            total_graded: self.total_graded(),
            delta_to_best: None,
            delta_to_average: None,
            message: PositionMessage::NotGraded,
        };

        let Some(me) = self.position(student_id) else {
            return base;
        };

        let delta_to_average = me.average - self.cohort_average;
        let message = if self.ranked.len() == 1 {
            PositionMessage::OnlyGradedStudent
        } else if me.rank == 1 {
            PositionMessage::TopOfCohort
        } else {
            let shown = round1(delta_to_average);
            if shown > 0.0 {
                PositionMessage::AboveAverage(shown)
            } else if shown < 0.0 {
                PositionMessage::BelowAverage(shown)
            } else {
                PositionMessage::AtAverage
            }
        };

        RankingView {
            my_average: Some(me.average),
            my_rank: Rank::Ranked(me.rank),
            delta_to_best: Some(me.average - self.best_average),
            delta_to_average: Some(delta_to_average),
            message,
            ..base
        }
    }
}
