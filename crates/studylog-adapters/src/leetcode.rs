use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use studylog_core::{Difficulty, LEETCODE_SOURCE};
use tracing::{debug, warn};

use crate::http::{snippet, GraphqlTransport, HttpClientConfig};
use crate::{FeaturedProblem, ProblemDetail, ProblemSource, SourceError};

pub const DEFAULT_ENDPOINT: &str = "https://leetcode.cn/graphql/";
pub const DEFAULT_PROBLEM_BASE_URL: &str = "https://leetcode.cn/problems/";

const TODAY_OPERATION: &str = "questionOfToday";
const TODAY_QUERY: &str = "query questionOfToday { todayRecord { date userStatus question { questionFrontendId questionTitleSlug title translatedTitle difficulty } } }";

const DETAIL_OPERATION: &str = "questionDetail";
const DETAIL_QUERY: &str = "query questionDetail($titleSlug: String!) { question(titleSlug: $titleSlug) { questionId questionFrontendId title titleSlug difficulty topicTags { name slug } } }";

const LIST_OPERATION: &str = "problemsetQuestionList";
const LIST_PAGE_LIMIT: u64 = 100;
const LIST_QUERY: &str = "query problemsetQuestionList($categorySlug: String, $limit: Int, $skip: Int, $filters: QuestionListFilterInput) { problemsetQuestionList(categorySlug: $categorySlug, limit: $limit, skip: $skip, filters: $filters) { total questions { frontendQuestionId titleSlug difficulty title } } }";

#[derive(Debug, Clone)]
pub struct LeetCodeConfig {
    pub endpoint: String,
    pub problem_base_url: String,
    pub http: HttpClientConfig,
}

impl Default for LeetCodeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            problem_base_url: DEFAULT_PROBLEM_BASE_URL.to_string(),
            http: HttpClientConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeetCodeClient {
    transport: GraphqlTransport,
    problem_base_url: String,
}

impl LeetCodeClient {
    pub fn new(config: LeetCodeConfig) -> anyhow::Result<Self> {
        let transport = GraphqlTransport::new(config.endpoint, &config.http)?;
        let mut problem_base_url = config.problem_base_url;
        if !problem_base_url.ends_with('/') {
            problem_base_url.push('/');
        }
        Ok(Self {
            transport,
            problem_base_url,
        })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: JsonValue,
    ) -> Result<Envelope<T>, SourceError> {
        let body = self.transport.post(operation, query, variables).await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body).map_err(|e| {
            let body = snippet(&body);
            warn!(operation, error = %e, %body, "could not decode graphql response");
            SourceError::MalformedResponse {
                operation,
                reason: e.to_string(),
                body,
            }
        })?;
        if !envelope.errors.is_empty() {
            let messages = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(operation, %messages, "graphql errors in response");
        }
        Ok(envelope)
    }
}

/// Prefers the translated title; falls back to the original when it is blank.
pub fn fallback_title(translated: Option<&str>, original: &str) -> String {
    match translated.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => original.to_string(),
    }
}

fn parse_difficulty(
    operation: &'static str,
    raw: Option<&str>,
) -> Result<Difficulty, SourceError> {
    let raw = raw.unwrap_or_default();
    raw.parse::<Difficulty>()
        .map_err(|e| SourceError::MalformedResponse {
            operation,
            reason: e.to_string(),
            body: raw.to_string(),
        })
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodayData {
    #[serde(default)]
    today_record: Option<Vec<TodayRecord>>,
}

#[derive(Debug, Deserialize)]
struct TodayRecord {
    question: TodayQuestion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodayQuestion {
    question_frontend_id: String,
    question_title_slug: String,
    title: String,
    #[serde(default)]
    translated_title: Option<String>,
    difficulty: String,
}

#[derive(Debug, Deserialize)]
struct DetailData {
    question: Option<DetailQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailQuestion {
    #[serde(default)]
    question_frontend_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    title_slug: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    topic_tags: Vec<TopicTag>,
}

#[derive(Debug, Deserialize)]
struct TopicTag {
    name: String,
}

/// `(skip, count)` covering frontend ids `start..=end`, widened so the full
/// `u32` range cannot overflow.
fn list_window(start: u32, end: u32) -> (u64, u64) {
    let skip = u64::from(start.saturating_sub(1));
    let count = u64::from(end) - u64::from(start.max(1)) + 1;
    (skip, if end == 0 { 0 } else { count })
}

fn question_count(data: &JsonValue) -> u64 {
    data.pointer("/problemsetQuestionList/questions")
        .and_then(JsonValue::as_array)
        .map_or(0, |q| q.len() as u64)
}

/// Walks the untyped list response, keeping slugs whose frontend id parses as
/// a number inside `start..=end`.
fn slugs_in_range(data: &JsonValue, start: u32, end: u32) -> Vec<String> {
    data.pointer("/problemsetQuestionList/questions")
        .and_then(JsonValue::as_array)
        .map(|questions| {
            questions
                .iter()
                .filter_map(|q| {
                    let slug = q.get("titleSlug")?.as_str()?;
                    let id = match q.get("frontendQuestionId")? {
                        JsonValue::String(s) => s.trim().parse::<u32>().ok()?,
                        JsonValue::Number(n) => u32::try_from(n.as_u64()?).ok()?,
                        _ => return None,
                    };
                    (start..=end).contains(&id).then(|| slug.to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ProblemSource for LeetCodeClient {
    fn source_name(&self) -> &str {
        LEETCODE_SOURCE
    }

    fn problem_url(&self, slug: &str) -> String {
        format!("{}{slug}/", self.problem_base_url)
    }

    async fn fetch_today_featured(&self) -> Result<FeaturedProblem, SourceError> {
        let envelope: Envelope<TodayData> = self
            .query(TODAY_OPERATION, TODAY_QUERY, json!({}))
            .await?;
        let record = envelope
            .data
            .and_then(|d| d.today_record.unwrap_or_default().into_iter().next())
            .ok_or(SourceError::NoDataFound)?;
        let q = record.question;

        Ok(FeaturedProblem {
            difficulty: parse_difficulty(TODAY_OPERATION, Some(&q.difficulty))?,
            title: fallback_title(q.translated_title.as_deref(), &q.title),
            source_id: q.question_frontend_id,
            slug: q.question_title_slug,
        })
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<ProblemDetail, SourceError> {
        debug!(slug, "fetching problem detail");
        let envelope: Envelope<DetailData> = self
            .query(DETAIL_OPERATION, DETAIL_QUERY, json!({ "titleSlug": slug }))
            .await?;
        let empty = || SourceError::EmptyProblem {
            slug: slug.to_string(),
        };
        let question = envelope.data.and_then(|d| d.question).ok_or_else(empty)?;
        let title = question
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(empty)?;

        Ok(ProblemDetail {
            difficulty: parse_difficulty(DETAIL_OPERATION, question.difficulty.as_deref())?,
            source_id: question.question_frontend_id.unwrap_or_default(),
            slug: question
                .title_slug
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| slug.to_string()),
            tags: question.topic_tags.into_iter().map(|t| t.name).collect(),
            title,
        })
    }

    async fn fetch_slugs_in_range(&self, start: u32, end: u32) -> Result<Vec<String>, SourceError> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let (mut skip, mut remaining) = list_window(start, end);
        let mut slugs = Vec::new();
        while remaining > 0 {
            let limit = remaining.min(LIST_PAGE_LIMIT);
            let envelope: Envelope<JsonValue> = self
                .query(
                    LIST_OPERATION,
                    LIST_QUERY,
                    json!({
                        "categorySlug": "",
                        "skip": skip,
                        "limit": limit,
                        "filters": {},
                    }),
                )
                .await?;
            let data = envelope.data.unwrap_or(JsonValue::Null);
            slugs.extend(slugs_in_range(&data, start, end));
            // A short page means the catalog ended before the range did.
            if question_count(&data) < limit {
                break;
            }
            skip += limit;
            remaining -= limit;
        }
        Ok(slugs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translated_title_wins_when_present() {
        assert_eq!(fallback_title(Some("两数之和"), "Two Sum"), "两数之和");
    }

    #[test]
    fn blank_translated_title_falls_back_to_original() {
        assert_eq!(fallback_title(Some(""), "Two Sum"), "Two Sum");
        assert_eq!(fallback_title(Some("   "), "Two Sum"), "Two Sum");
        assert_eq!(fallback_title(None, "Two Sum"), "Two Sum");
    }

    #[test]
    fn list_window_covers_full_u32_range() {
        assert_eq!(list_window(1, 3), (0, 3));
        assert_eq!(list_window(0, 3), (0, 3));
        assert_eq!(list_window(101, 150), (100, 50));
        assert_eq!(list_window(0, u32::MAX), (0, u64::from(u32::MAX)));
        assert_eq!(list_window(u32::MAX, u32::MAX), (u64::from(u32::MAX) - 1, 1));
        assert_eq!(list_window(0, 0), (0, 0));
    }

    #[test]
    fn range_filter_accepts_string_and_numeric_ids() {
        let data = json!({
            "problemsetQuestionList": {
                "questions": [
                    {"frontendQuestionId": "1", "titleSlug": "two-sum"},
                    {"frontendQuestionId": 2, "titleSlug": "add-two-numbers"},
                    {"frontendQuestionId": "LCP 01", "titleSlug": "guess-numbers"},
                    {"frontendQuestionId": "9", "titleSlug": "palindrome-number"},
                    {"titleSlug": "missing-id"}
                ]
            }
        });
        assert_eq!(
            slugs_in_range(&data, 1, 5),
            vec!["two-sum".to_string(), "add-two-numbers".to_string()]
        );
        assert!(slugs_in_range(&JsonValue::Null, 1, 5).is_empty());
    }

    #[test]
    fn problem_url_normalises_base() {
        let client = LeetCodeClient::new(LeetCodeConfig {
            problem_base_url: "https://leetcode.cn/problems".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.problem_url("two-sum"),
            "https://leetcode.cn/problems/two-sum/"
        );
    }
}
