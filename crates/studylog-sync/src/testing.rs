use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use studylog_adapters::{FeaturedProblem, ProblemDetail, ProblemSource, SourceError};
use studylog_core::Difficulty;

/// Scripted source: one featured problem plus a slug → detail table.
#[derive(Default)]
pub struct StubSource {
    pub featured: Mutex<Option<FeaturedProblem>>,
    pub details: HashMap<String, ProblemDetail>,
    pub range: Vec<String>,
    pub detail_calls: AtomicUsize,
}

impl StubSource {
    pub fn with_featured(featured: FeaturedProblem) -> Self {
        Self {
            featured: Mutex::new(Some(featured)),
            ..Default::default()
        }
    }

    pub fn with_detail(mut self, detail: ProblemDetail) -> Self {
        self.details.insert(detail.slug.clone(), detail);
        self
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProblemSource for StubSource {
    fn source_name(&self) -> &str {
        "leetcode"
    }

    fn problem_url(&self, slug: &str) -> String {
        format!("https://leetcode.cn/problems/{slug}/")
    }

    async fn fetch_today_featured(&self) -> Result<FeaturedProblem, SourceError> {
        self.featured
            .lock()
            .unwrap()
            .clone()
            .ok_or(SourceError::NoDataFound)
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<ProblemDetail, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .get(slug)
            .cloned()
            .ok_or_else(|| SourceError::UpstreamUnavailable {
                operation: "questionDetail",
                reason: "connection refused".into(),
            })
    }

    async fn fetch_slugs_in_range(&self, _: u32, _: u32) -> Result<Vec<String>, SourceError> {
        Ok(self.range.clone())
    }
}

pub fn featured(source_id: &str, slug: &str, title: &str) -> FeaturedProblem {
    FeaturedProblem {
        source_id: source_id.into(),
        slug: slug.into(),
        title: title.into(),
        difficulty: Difficulty::Easy,
    }
}

pub fn detail(source_id: &str, slug: &str, title: &str, tags: &[&str]) -> ProblemDetail {
    ProblemDetail {
        source_id: source_id.into(),
        slug: slug.into(),
        title: title.into(),
        difficulty: Difficulty::Easy,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}
