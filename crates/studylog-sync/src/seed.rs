use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use studylog_adapters::{DEFAULT_PROBLEM_BASE_URL, GENERIC_TAG};
use studylog_core::{Difficulty, NewProblem, StudyStatus, LEETCODE_SOURCE};
use studylog_storage::{ProblemStore, StoreError};
use tracing::{info, warn};

pub const TOP100_TAG: &str = "Hot 100";

const EMBEDDED_SEED: &str = include_str!("../seeds/top100.yaml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntry {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Top100Seed {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub problems: Vec<SeedEntry>,
}

fn default_base_url() -> String {
    DEFAULT_PROBLEM_BASE_URL.to_string()
}

impl Top100Seed {
    pub fn embedded() -> Result<Self> {
        serde_yaml::from_str(EMBEDDED_SEED).context("parsing embedded top100 seed")
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading seed file {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))
    }

    /// The file at `path` when given, otherwise the list compiled into the binary.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path).await,
            None => Self::embedded(),
        }
    }

    fn new_problem(&self, entry: &SeedEntry) -> NewProblem {
        let base = self.base_url.trim_end_matches('/');
        NewProblem {
            title: entry.title.clone(),
            difficulty: entry.difficulty,
            tags: vec![TOP100_TAG.to_string(), GENERIC_TAG.to_string()],
            source: LEETCODE_SOURCE.to_string(),
            source_id: entry.id.clone(),
            source_url: format!("{base}/{}/", entry.slug),
            study_status: StudyStatus::NotStarted,
            last_studied: None,
            is_daily: false,
            daily_date: None,
            is_top100: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Inserts every seed entry whose external id is not yet in the catalog.
/// Per-entry failures are logged and counted.
pub async fn seed_top100(store: &dyn ProblemStore, seed: &Top100Seed) -> SeedSummary {
    let mut summary = SeedSummary::default();

    for entry in &seed.problems {
        match store.find_by_source_id(&entry.id).await {
            Ok(found) if found.iter().any(|p| p.source == LEETCODE_SOURCE) => {
                summary.skipped += 1;
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(source_id = %entry.id, error = %err, "seed lookup failed");
                summary.failed += 1;
                continue;
            }
        }

        match store.create(seed.new_problem(entry)).await {
            Ok(_) => summary.inserted += 1,
            Err(StoreError::Conflict { .. }) => summary.skipped += 1,
            Err(err) => {
                warn!(source_id = %entry.id, title = %entry.title, error = %err, "seed insert failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        failed = summary.failed,
        "top100 seed applied"
    );
    summary
}
