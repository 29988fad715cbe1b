use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use studylog_core::{normalize_tags, DailySelection, Difficulty, NewProblem, Problem, StudyStatus};
use tracing::{debug, info};

use crate::{ProblemStore, StoreError, StoreResult};

const PROBLEM_COLUMNS: &str = r#"
    id, title, difficulty, tags, source, source_id, source_url, study_status,
    last_studied, is_daily, daily_date, is_top100, created_at, updated_at
"#;

/// Advisory lock key taken by every `mark_as_daily` transaction. Overlapping
/// calls would otherwise each clear the old flag from their own snapshot and
/// both commit a daily row.
const DAILY_LOCK_KEY: i64 = 0x5354_4459_4441_4c59;

const SELECTION_COLUMNS: &str = r#"
    id, selected_on, problem_id, title, difficulty, tags, source, source_id,
    source_url, created_at
"#;

/// `ProblemStore` over PostgreSQL via sqlx.
#[derive(Debug, Clone)]
pub struct PgProblemStore {
    pool: PgPool,
}

impl PgProblemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        info!("applying database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn select_problems(&self, filter: &str, arg: Option<&str>) -> StoreResult<Vec<Problem>> {
        let sql = format!("SELECT {PROBLEM_COLUMNS} FROM coding_problems {filter} ORDER BY id");
        let mut query = sqlx::query_as::<_, ProblemRow>(&sql);
        if let Some(arg) = arg {
            query = query.bind(arg);
        }
        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ProblemRow::into_domain)
            .collect()
    }
}

#[derive(FromRow)]
struct ProblemRow {
    id: i64,
    title: String,
    difficulty: String,
    tags: Vec<String>,
    source: String,
    source_id: String,
    source_url: String,
    study_status: String,
    last_studied: Option<DateTime<Utc>>,
    is_daily: bool,
    daily_date: Option<NaiveDate>,
    is_top100: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProblemRow {
    fn into_domain(self) -> StoreResult<Problem> {
        let difficulty = self
            .difficulty
            .parse::<Difficulty>()
            .map_err(|e| StoreError::Corrupt(format!("coding_problems.id={}: {e}", self.id)))?;
        let study_status = self
            .study_status
            .parse::<StudyStatus>()
            .map_err(|e| StoreError::Corrupt(format!("coding_problems.id={}: {e}", self.id)))?;
        Ok(Problem {
            id: self.id,
            title: self.title,
            difficulty,
            tags: self.tags,
            source: self.source,
            source_id: self.source_id,
            source_url: self.source_url,
            study_status,
            last_studied: self.last_studied,
            is_daily: self.is_daily,
            daily_date: self.daily_date,
            is_top100: self.is_top100,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SelectionRow {
    id: i64,
    selected_on: NaiveDate,
    problem_id: i64,
    title: String,
    difficulty: String,
    tags: Vec<String>,
    source: String,
    source_id: String,
    source_url: String,
    created_at: DateTime<Utc>,
}

impl SelectionRow {
    fn into_domain(self) -> StoreResult<DailySelection> {
        let difficulty = self
            .difficulty
            .parse::<Difficulty>()
            .map_err(|e| StoreError::Corrupt(format!("daily_selections.id={}: {e}", self.id)))?;
        Ok(DailySelection {
            id: self.id,
            date: self.selected_on,
            problem_id: self.problem_id,
            title: self.title,
            difficulty,
            tags: self.tags,
            source: self.source,
            source_id: self.source_id,
            source_url: self.source_url,
            created_at: self.created_at,
        })
    }
}

fn map_unique_violation(err: sqlx::Error, source: &str, source_id: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => StoreError::Conflict {
            source_name: source.to_string(),
            source_id: source_id.to_string(),
        },
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl ProblemStore for PgProblemStore {
    async fn create(&self, problem: NewProblem) -> StoreResult<i64> {
        let tags = normalize_tags(&problem.tags);
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO coding_problems
                (title, difficulty, tags, source, source_id, source_url, study_status,
                 last_studied, is_daily, daily_date, is_top100, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(&problem.title)
        .bind(problem.difficulty.as_str())
        .bind(&tags)
        .bind(&problem.source)
        .bind(&problem.source_id)
        .bind(&problem.source_url)
        .bind(problem.study_status.as_str())
        .bind(problem.last_studied)
        .bind(problem.is_daily)
        .bind(problem.daily_date)
        .bind(problem.is_top100)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &problem.source, &problem.source_id))?;
        debug!(id, source_id = %problem.source_id, "inserted problem");
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Problem> {
        let sql = format!("SELECT {PROBLEM_COLUMNS} FROM coding_problems WHERE id = $1");
        sqlx::query_as::<_, ProblemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))?
            .into_domain()
    }

    async fn find_all(&self) -> StoreResult<Vec<Problem>> {
        self.select_problems("", None).await
    }

    async fn find_by_source(&self, source: &str) -> StoreResult<Vec<Problem>> {
        self.select_problems("WHERE source = $1", Some(source)).await
    }

    async fn find_by_source_id(&self, source_id: &str) -> StoreResult<Vec<Problem>> {
        self.select_problems("WHERE source_id = $1", Some(source_id))
            .await
    }

    async fn find_by_difficulty(&self, difficulty: Difficulty) -> StoreResult<Vec<Problem>> {
        self.select_problems("WHERE difficulty = $1", Some(difficulty.as_str()))
            .await
    }

    async fn update(&self, problem: &Problem) -> StoreResult<()> {
        let tags = normalize_tags(&problem.tags);
        let result = sqlx::query(
            r#"
            UPDATE coding_problems
               SET title = $2,
                   difficulty = $3,
                   tags = $4,
                   source = $5,
                   source_id = $6,
                   source_url = $7,
                   study_status = $8,
                   last_studied = $9,
                   is_daily = $10,
                   daily_date = $11,
                   is_top100 = $12,
                   updated_at = NOW()
             WHERE id = $1
            "#,
        )
        .bind(problem.id)
        .bind(&problem.title)
        .bind(problem.difficulty.as_str())
        .bind(&tags)
        .bind(&problem.source)
        .bind(&problem.source_id)
        .bind(&problem.source_url)
        .bind(problem.study_status.as_str())
        .bind(problem.last_studied)
        .bind(problem.is_daily)
        .bind(problem.daily_date)
        .bind(problem.is_top100)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &problem.source, &problem.source_id))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(problem.id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM coding_problems WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn update_study_status(
        &self,
        id: i64,
        status: StudyStatus,
        last_studied: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE coding_problems
               SET study_status = $2,
                   last_studied = COALESCE($3, last_studied),
                   updated_at = NOW()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(last_studied)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn mark_as_daily(&self, id: i64, date: NaiveDate) -> StoreResult<DailySelection> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(DAILY_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE coding_problems
               SET is_daily = FALSE,
                   daily_date = NULL
             WHERE is_daily
               AND id <> $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            UPDATE coding_problems
               SET is_daily = TRUE,
                   daily_date = $2,
                   updated_at = NOW()
             WHERE id = $1
            RETURNING {PROBLEM_COLUMNS}
            "#
        );
        let chosen = sqlx::query_as::<_, ProblemRow>(&sql)
            .bind(id)
            .bind(date)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(id))?
            .into_domain()?;

        sqlx::query("DELETE FROM daily_selections WHERE selected_on = $1")
            .bind(date)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            r#"
            INSERT INTO daily_selections
                (selected_on, problem_id, title, difficulty, tags, source, source_id,
                 source_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING {SELECTION_COLUMNS}
            "#
        );
        let selection = sqlx::query_as::<_, SelectionRow>(&sql)
            .bind(date)
            .bind(chosen.id)
            .bind(&chosen.title)
            .bind(chosen.difficulty.as_str())
            .bind(&chosen.tags)
            .bind(&chosen.source)
            .bind(&chosen.source_id)
            .bind(&chosen.source_url)
            .fetch_one(&mut *tx)
            .await?
            .into_domain()?;

        tx.commit().await?;
        Ok(selection)
    }

    async fn daily_for(&self, date: NaiveDate) -> StoreResult<Option<Problem>> {
        let sql = format!(
            "SELECT {PROBLEM_COLUMNS} FROM coding_problems WHERE is_daily AND daily_date = $1 LIMIT 1"
        );
        sqlx::query_as::<_, ProblemRow>(&sql)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(ProblemRow::into_domain)
            .transpose()
    }

    async fn selection_for(&self, date: NaiveDate) -> StoreResult<Option<DailySelection>> {
        let sql = format!("SELECT {SELECTION_COLUMNS} FROM daily_selections WHERE selected_on = $1");
        sqlx::query_as::<_, SelectionRow>(&sql)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(SelectionRow::into_domain)
            .transpose()
    }

    async fn daily_history(&self) -> StoreResult<Vec<DailySelection>> {
        let sql = format!("SELECT {SELECTION_COLUMNS} FROM daily_selections ORDER BY selected_on DESC");
        sqlx::query_as::<_, SelectionRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(SelectionRow::into_domain)
            .collect()
    }

    async fn random_problem(&self) -> StoreResult<Option<Problem>> {
        let sql = format!("SELECT {PROBLEM_COLUMNS} FROM coding_problems ORDER BY random() LIMIT 1");
        sqlx::query_as::<_, ProblemRow>(&sql)
            .fetch_optional(&self.pool)
            .await?
            .map(ProblemRow::into_domain)
            .transpose()
    }
}
