//! Core domain model for the study log: problems, daily selections and drafts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CRATE_NAME: &str = "studylog-core";

/// Source name used for problems scraped from leetcode.cn.
pub const LEETCODE_SOURCE: &str = "leetcode";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the English labels in any casing plus the zh-CN labels leetcode.cn
/// returns for some queries.
impl FromStr for Difficulty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "简单" => Ok(Difficulty::Easy),
            "medium" | "中等" => Ok(Difficulty::Medium),
            "hard" | "困难" => Ok(Difficulty::Hard),
            _ => Err(ParseEnumError {
                kind: "difficulty",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StudyStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl StudyStatus {
    pub const ALL: [StudyStatus; 3] = [
        StudyStatus::NotStarted,
        StudyStatus::InProgress,
        StudyStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StudyStatus::NotStarted => "not_started",
            StudyStatus::InProgress => "in_progress",
            StudyStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for StudyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(StudyStatus::NotStarted),
            "in_progress" => Ok(StudyStatus::InProgress),
            "completed" => Ok(StudyStatus::Completed),
            _ => Err(ParseEnumError {
                kind: "study status",
                value: s.to_string(),
            }),
        }
    }
}

/// Canonical catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub title: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub source: String,
    pub source_id: String,
    pub source_url: String,
    pub study_status: StudyStatus,
    pub last_studied: Option<DateTime<Utc>>,
    pub is_daily: bool,
    pub daily_date: Option<NaiveDate>,
    pub is_top100: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the store assigns `id` and both timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProblem {
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub study_status: StudyStatus,
    #[serde(default)]
    pub last_studied: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_daily: bool,
    #[serde(default)]
    pub daily_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_top100: bool,
}

impl NewProblem {
    pub fn into_problem(self, id: i64, now: DateTime<Utc>) -> Problem {
        Problem {
            id,
            title: self.title,
            difficulty: self.difficulty,
            tags: normalize_tags(self.tags),
            source: self.source,
            source_id: self.source_id,
            source_url: self.source_url,
            study_status: self.study_status,
            last_studied: self.last_studied,
            is_daily: self.is_daily,
            daily_date: self.daily_date,
            is_top100: self.is_top100,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Historical record of which problem was the daily problem on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySelection {
    pub id: i64,
    pub date: NaiveDate,
    pub problem_id: i64,
    pub title: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub source: String,
    pub source_id: String,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

impl DailySelection {
    /// Snapshot of `problem` as today's pick; `id` is assigned by the store.
    pub fn snapshot(problem: &Problem, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            date,
            problem_id: problem.id,
            title: problem.title.clone(),
            difficulty: problem.difficulty,
            tags: problem.tags.clone(),
            source: problem.source.clone(),
            source_id: problem.source_id.clone(),
            source_url: problem.source_url.clone(),
            created_at: now,
        }
    }
}

/// Freshly fetched daily-problem candidate handed from the source client to
/// the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProblemDraft {
    pub date: NaiveDate,
    pub title: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub source: String,
    pub source_id: String,
    pub source_url: String,
}

/// Trims, drops empties and removes duplicates while keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}
