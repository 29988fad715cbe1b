use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::IteratorRandom;
use studylog_core::{normalize_tags, DailySelection, Difficulty, NewProblem, Problem, StudyStatus};
use tokio::sync::RwLock;

use crate::{ProblemStore, StoreError, StoreResult};

/// Process-local store used by tests and by `serve --in-memory`.
///
/// A single `RwLock` guards both tables, which gives `mark_as_daily` the same
/// all-or-nothing visibility a database transaction does.
#[derive(Debug, Default)]
pub struct MemoryProblemStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_problem_id: i64,
    last_selection_id: i64,
    problems: BTreeMap<i64, Problem>,
    selections: BTreeMap<NaiveDate, DailySelection>,
}

impl MemoryProblemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.problems.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn matching(state: &MemoryState, pred: impl Fn(&Problem) -> bool) -> Vec<Problem> {
    state.problems.values().filter(|p| pred(p)).cloned().collect()
}

#[async_trait]
impl ProblemStore for MemoryProblemStore {
    async fn create(&self, problem: NewProblem) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        if !problem.source_id.is_empty()
            && state
                .problems
                .values()
                .any(|p| p.source == problem.source && p.source_id == problem.source_id)
        {
            return Err(StoreError::Conflict {
                source_name: problem.source,
                source_id: problem.source_id,
            });
        }
        state.last_problem_id += 1;
        let id = state.last_problem_id;
        state.problems.insert(id, problem.into_problem(id, Utc::now()));
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Problem> {
        self.state
            .read()
            .await
            .problems
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_all(&self) -> StoreResult<Vec<Problem>> {
        Ok(matching(&*self.state.read().await, |_| true))
    }

    async fn find_by_source(&self, source: &str) -> StoreResult<Vec<Problem>> {
        Ok(matching(&*self.state.read().await, |p| p.source == source))
    }

    async fn find_by_source_id(&self, source_id: &str) -> StoreResult<Vec<Problem>> {
        Ok(matching(&*self.state.read().await, |p| p.source_id == source_id))
    }

    async fn find_by_difficulty(&self, difficulty: Difficulty) -> StoreResult<Vec<Problem>> {
        Ok(matching(&*self.state.read().await, |p| {
            p.difficulty == difficulty
        }))
    }

    async fn update(&self, problem: &Problem) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !problem.source_id.is_empty()
            && state.problems.values().any(|p| {
                p.id != problem.id && p.source == problem.source && p.source_id == problem.source_id
            })
        {
            return Err(StoreError::Conflict {
                source_name: problem.source.clone(),
                source_id: problem.source_id.clone(),
            });
        }
        let existing = state
            .problems
            .get_mut(&problem.id)
            .ok_or(StoreError::NotFound(problem.id))?;
        let created_at = existing.created_at;
        *existing = Problem {
            tags: normalize_tags(&problem.tags),
            created_at,
            updated_at: Utc::now(),
            ..problem.clone()
        };
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.problems.remove(&id).ok_or(StoreError::NotFound(id))?;
        state.selections.retain(|_, s| s.problem_id != id);
        Ok(())
    }

    async fn update_study_status(
        &self,
        id: i64,
        status: StudyStatus,
        last_studied: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let problem = state.problems.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        problem.study_status = status;
        if let Some(at) = last_studied {
            problem.last_studied = Some(at);
        }
        problem.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_as_daily(&self, id: i64, date: NaiveDate) -> StoreResult<DailySelection> {
        let mut state = self.state.write().await;
        if !state.problems.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }

        let now = Utc::now();
        for problem in state.problems.values_mut().filter(|p| p.is_daily) {
            problem.is_daily = false;
            problem.daily_date = None;
        }
        let chosen = state
            .problems
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        chosen.is_daily = true;
        chosen.daily_date = Some(date);
        chosen.updated_at = now;

        let mut selection = DailySelection::snapshot(chosen, date, now);
        state.last_selection_id += 1;
        selection.id = state.last_selection_id;
        state.selections.insert(date, selection.clone());
        Ok(selection)
    }

    async fn daily_for(&self, date: NaiveDate) -> StoreResult<Option<Problem>> {
        Ok(self
            .state
            .read()
            .await
            .problems
            .values()
            .find(|p| p.is_daily && p.daily_date == Some(date))
            .cloned())
    }

    async fn selection_for(&self, date: NaiveDate) -> StoreResult<Option<DailySelection>> {
        Ok(self.state.read().await.selections.get(&date).cloned())
    }

    async fn daily_history(&self) -> StoreResult<Vec<DailySelection>> {
        Ok(self
            .state
            .read()
            .await
            .selections
            .values()
            .rev()
            .cloned()
            .collect())
    }

    async fn random_problem(&self) -> StoreResult<Option<Problem>> {
        let state = self.state.read().await;
        let picked = state.problems.values().choose(&mut rand::thread_rng()).cloned();
        Ok(picked)
    }
}
