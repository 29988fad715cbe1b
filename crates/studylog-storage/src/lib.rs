//! Problem store contract plus PostgreSQL and in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use studylog_core::{DailySelection, Difficulty, NewProblem, Problem, StudyStatus};
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::MemoryProblemStore;
pub use postgres::PgProblemStore;

pub const CRATE_NAME: &str = "studylog-storage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("problem {0} not found")]
    NotFound(i64),
    #[error("problem {source_name}/{source_id} already exists")]
    Conflict { source_name: String, source_id: String },
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent catalog of coding problems and the daily-selection log.
///
/// `mark_as_daily` is the only multi-row write; implementations must apply it
/// atomically so readers never observe two daily problems or a cleared flag
/// without its replacement.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Inserts a problem and returns the id the store assigned to it.
    async fn create(&self, problem: NewProblem) -> StoreResult<i64>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Problem>;

    async fn find_all(&self) -> StoreResult<Vec<Problem>>;

    async fn find_by_source(&self, source: &str) -> StoreResult<Vec<Problem>>;

    async fn find_by_source_id(&self, source_id: &str) -> StoreResult<Vec<Problem>>;

    async fn find_by_difficulty(&self, difficulty: Difficulty) -> StoreResult<Vec<Problem>>;

    /// Overwrites every mutable column of `problem.id` and bumps `updated_at`.
    async fn update(&self, problem: &Problem) -> StoreResult<()>;

    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Sets the study status; `last_studied` is only written when provided.
    async fn update_study_status(
        &self,
        id: i64,
        status: StudyStatus,
        last_studied: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;

    /// Clears every daily flag, flags `id` for `date` and replaces that date's
    /// selection row with a snapshot of the problem.
    async fn mark_as_daily(&self, id: i64, date: NaiveDate) -> StoreResult<DailySelection>;

    /// The problem currently flagged as daily for `date`, if any.
    async fn daily_for(&self, date: NaiveDate) -> StoreResult<Option<Problem>>;

    async fn selection_for(&self, date: NaiveDate) -> StoreResult<Option<DailySelection>>;

    /// All selections, newest date first.
    async fn daily_history(&self) -> StoreResult<Vec<DailySelection>>;

    async fn random_problem(&self) -> StoreResult<Option<Problem>>;
}
