//! Problem-source contract and the leetcode.cn GraphQL client.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use studylog_core::{DailyProblemDraft, Difficulty, NewProblem, StudyStatus};
use thiserror::Error;
use tracing::{info, warn};

mod http;
mod leetcode;

pub use http::{GraphqlTransport, HttpClientConfig, DEFAULT_USER_AGENT};
pub use leetcode::{
    fallback_title, LeetCodeClient, LeetCodeConfig, DEFAULT_ENDPOINT, DEFAULT_PROBLEM_BASE_URL,
};

pub const CRATE_NAME: &str = "studylog-adapters";

/// Tag attached when only the featured query succeeded and topic tags are unknown.
pub const GENERIC_TAG: &str = "算法";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{operation}: upstream unavailable: {reason}")]
    UpstreamUnavailable {
        operation: &'static str,
        reason: String,
    },
    #[error("{operation}: malformed response: {reason}")]
    MalformedResponse {
        operation: &'static str,
        reason: String,
        body: String,
    },
    #[error("no featured problem in today's record")]
    NoDataFound,
    #[error("problem {slug:?} came back without a title")]
    EmptyProblem { slug: String },
}

impl SourceError {
    /// Transport failures may succeed on the next scheduled pass; shape and
    /// data problems will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::UpstreamUnavailable { .. })
    }
}

/// Today's featured problem as reported by the daily-record query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedProblem {
    pub source_id: String,
    pub slug: String,
    pub title: String,
    pub difficulty: Difficulty,
}

/// Full problem detail as reported by the slug query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetail {
    pub source_id: String,
    pub slug: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
}

impl ProblemDetail {
    pub fn into_new_problem(self, source: &str, source_url: String) -> NewProblem {
        NewProblem {
            title: self.title,
            difficulty: self.difficulty,
            tags: self.tags,
            source: source.to_string(),
            source_id: self.source_id,
            source_url,
            study_status: StudyStatus::NotStarted,
            last_studied: None,
            is_daily: false,
            daily_date: None,
            is_top100: false,
        }
    }
}

#[async_trait]
pub trait ProblemSource: Send + Sync {
    /// Value stored in `Problem::source` for problems from this source.
    fn source_name(&self) -> &str;

    fn problem_url(&self, slug: &str) -> String;

    async fn fetch_today_featured(&self) -> Result<FeaturedProblem, SourceError>;

    async fn fetch_by_slug(&self, slug: &str) -> Result<ProblemDetail, SourceError>;

    /// Slugs of problems whose numeric frontend id lies in `start..=end`.
    async fn fetch_slugs_in_range(&self, start: u32, end: u32) -> Result<Vec<String>, SourceError>;

    /// Featured query followed by slug enrichment. Enrichment failures degrade
    /// to a minimal draft built from the featured fields alone.
    async fn fetch_daily_draft(&self, date: NaiveDate) -> Result<DailyProblemDraft, SourceError> {
        let featured = self.fetch_today_featured().await?;
        let source_url = self.problem_url(&featured.slug);

        match self.fetch_by_slug(&featured.slug).await {
            Ok(detail) => {
                info!(slug = %featured.slug, title = %detail.title, "fetched daily problem");
                let source_id = if detail.source_id.is_empty() {
                    featured.source_id
                } else {
                    detail.source_id
                };
                Ok(DailyProblemDraft {
                    date,
                    title: detail.title,
                    difficulty: detail.difficulty,
                    tags: detail.tags,
                    source: self.source_name().to_string(),
                    source_id,
                    source_url: self.problem_url(&detail.slug),
                })
            }
            Err(err) => {
                warn!(slug = %featured.slug, error = %err, "detail lookup failed; using featured fields only");
                Ok(DailyProblemDraft {
                    date,
                    title: featured.title,
                    difficulty: featured.difficulty,
                    tags: vec![GENERIC_TAG.to_string()],
                    source: self.source_name().to_string(),
                    source_id: featured.source_id,
                    source_url,
                })
            }
        }
    }
}
