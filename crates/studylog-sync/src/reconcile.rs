use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use studylog_adapters::{ProblemSource, SourceError};
use studylog_core::{normalize_tags, DailyProblemDraft, NewProblem, StudyStatus};
use studylog_storage::{ProblemStore, StoreError};
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::scheduler::DailyJob;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("fetching daily problem failed: {0}")]
    FetchFailed(#[from] SourceError),
    #[error("{step} failed: {source}")]
    PersistFailed {
        step: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    fn persist(step: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ReconcileError::PersistFailed { step, source }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub run_id: Uuid,
    pub date: NaiveDate,
    pub problem_id: i64,
    pub title: String,
    /// `true` when the pass inserted a new catalog row.
    pub created: bool,
    /// `false` when the daily flag or history row could not be written.
    pub history_recorded: bool,
}

/// Merges today's fetched problem into the catalog and records it as the
/// daily problem.
#[derive(Clone)]
pub struct Reconciler {
    source: Arc<dyn ProblemSource>,
    store: Arc<dyn ProblemStore>,
}

impl Reconciler {
    pub fn new(source: Arc<dyn ProblemSource>, store: Arc<dyn ProblemStore>) -> Self {
        Self { source, store }
    }

    /// Fetches the daily draft for `today` and applies it.
    pub async fn run_pass(&self, today: NaiveDate) -> Result<ReconcileReport, ReconcileError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("reconcile", %run_id, %today);
        async move {
            let draft = self.source.fetch_daily_draft(today).await?;
            self.apply(run_id, today, draft).await
        }
        .instrument(span)
        .await
    }

    /// Upserts `draft` by `(source, source_id)` and marks the resulting row
    /// as the daily problem for `today`.
    pub async fn apply(
        &self,
        run_id: Uuid,
        today: NaiveDate,
        draft: DailyProblemDraft,
    ) -> Result<ReconcileReport, ReconcileError> {
        let existing = self
            .store
            .find_by_source(&draft.source)
            .await
            .map_err(ReconcileError::persist("find_by_source"))?
            .into_iter()
            .find(|p| p.source_id == draft.source_id);

        let (problem_id, created) = match existing {
            Some(mut problem) => {
                problem.tags = normalize_tags(&draft.tags);
                problem.is_daily = true;
                problem.daily_date = Some(today);
                problem.updated_at = Utc::now();
                self.store
                    .update(&problem)
                    .await
                    .map_err(ReconcileError::persist("update"))?;
                info!(problem_id = problem.id, source_id = %draft.source_id, "updated existing problem");
                (problem.id, false)
            }
            None => {
                let id = self
                    .store
                    .create(NewProblem {
                        title: draft.title.clone(),
                        difficulty: draft.difficulty,
                        tags: draft.tags.clone(),
                        source: draft.source.clone(),
                        source_id: draft.source_id.clone(),
                        source_url: draft.source_url.clone(),
                        study_status: StudyStatus::NotStarted,
                        last_studied: None,
                        is_daily: true,
                        daily_date: Some(today),
                        is_top100: false,
                    })
                    .await
                    .map_err(ReconcileError::persist("create"))?;
                info!(problem_id = id, source_id = %draft.source_id, "created problem");
                (id, true)
            }
        };

        let history_recorded = match self.store.mark_as_daily(problem_id, today).await {
            Ok(_) => true,
            Err(err) => {
                warn!(problem_id, error = %err, "could not record daily selection");
                false
            }
        };

        Ok(ReconcileReport {
            run_id,
            date: today,
            problem_id,
            title: draft.title,
            created,
            history_recorded,
        })
    }
}

#[async_trait]
impl DailyJob for Reconciler {
    async fn run_daily(&self, today: NaiveDate) -> Result<ReconcileReport, ReconcileError> {
        self.run_pass(today).await
    }
}
