use std::time::Duration;

use serde::Serialize;
use studylog_adapters::{ProblemSource, SourceError};
use studylog_storage::{ProblemStore, StoreError};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fetches each slug and inserts the ones not yet in the catalog, pausing
/// `delay` between upstream requests.
pub async fn import_slugs(
    source: &dyn ProblemSource,
    store: &dyn ProblemStore,
    slugs: &[String],
    delay: Duration,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for (i, slug) in slugs.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let detail = match source.fetch_by_slug(slug).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!(%slug, error = %err, "import fetch failed");
                summary.failed += 1;
                continue;
            }
        };

        match store.find_by_source_id(&detail.source_id).await {
            Ok(found) if found.iter().any(|p| p.source == source.source_name()) => {
                summary.skipped += 1;
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%slug, error = %err, "import lookup failed");
                summary.failed += 1;
                continue;
            }
        }

        let url = source.problem_url(&detail.slug);
        let title = detail.title.clone();
        match store
            .create(detail.into_new_problem(source.source_name(), url))
            .await
        {
            Ok(id) => {
                info!(%slug, id, %title, "imported problem");
                summary.imported += 1;
            }
            Err(StoreError::Conflict { .. }) => summary.skipped += 1,
            Err(err) => {
                warn!(%slug, error = %err, "import insert failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        failed = summary.failed,
        "import finished"
    );
    summary
}

/// Resolves the frontend-id range to slugs, then imports them.
pub async fn import_range(
    source: &dyn ProblemSource,
    store: &dyn ProblemStore,
    start: u32,
    end: u32,
    delay: Duration,
) -> Result<ImportSummary, SourceError> {
    let slugs = source.fetch_slugs_in_range(start, end).await?;
    info!(start, end, count = slugs.len(), "resolved import range");
    Ok(import_slugs(source, store, &slugs, delay).await)
}
