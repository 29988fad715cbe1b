//! JSON API over the problem catalog under `/api/coding`.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use studylog_core::{DailySelection, Difficulty, NewProblem, Problem, StudyStatus};
use studylog_storage::{ProblemStore, StoreError};
use studylog_sync::{
    seed_top100, Clock, DailyJob, ReconcileReport, SeedSummary, SystemClock, Top100Seed,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

mod error;

pub use error::ApiError;

pub const CRATE_NAME: &str = "studylog-web";

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 100;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProblemStore>,
    /// Backs `POST /daily/refresh`; absent when no upstream client is wired.
    pub job: Option<Arc<dyn DailyJob>>,
    /// Seed list for `POST /seed/top100`; the embedded list when absent.
    pub seed: Option<Arc<Top100Seed>>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProblemStore>) -> Self {
        Self {
            store,
            job: None,
            seed: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_job(mut self, job: Arc<dyn DailyJob>) -> Self {
        self.job = Some(job);
        self
    }

    pub fn with_seed(mut self, seed: Top100Seed) -> Self {
        self.seed = Some(Arc::new(seed));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/problems", get(list_problems_handler).post(create_problem_handler))
        .route(
            "/problems/{id}",
            get(get_problem_handler)
                .put(update_problem_handler)
                .delete(delete_problem_handler),
        )
        .route("/problems/{id}/study-status", put(study_status_handler))
        .route("/problems/source/{source}", get(problems_by_source_handler))
        .route(
            "/problems/difficulty/{difficulty}",
            get(problems_by_difficulty_handler),
        )
        .route("/daily", get(daily_handler))
        .route("/daily/history", get(daily_history_handler))
        .route("/daily/refresh", post(daily_refresh_handler))
        .route("/random", get(random_handler))
        .route("/stats", get(stats_handler))
        .route("/seed/top100", post(seed_handler));

    Router::new()
        .nest("/api/coding", api)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Serves until `shutdown` is cancelled.
pub async fn serve(state: AppState, port: u16, shutdown: CancellationToken) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    info!(port, "http api listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("http server")?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<String>,
    limit: Option<String>,
}

impl PageQuery {
    /// Missing, unparsable or out-of-range values fall back to the defaults.
    fn resolve(&self) -> (usize, usize) {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .unwrap_or(DEFAULT_LIMIT);
        (page, limit)
    }
}

#[derive(Debug, Serialize)]
struct ProblemPage {
    problems: Vec<Problem>,
    total: usize,
    page: usize,
    limit: usize,
}

#[derive(Debug, Serialize)]
struct ProblemList<T> {
    problems: Vec<T>,
    total: usize,
}

impl<T> From<Vec<T>> for ProblemList<T> {
    fn from(problems: Vec<T>) -> Self {
        Self {
            total: problems.len(),
            problems,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StudyStatusBody {
    study_status: String,
}

#[derive(Debug, Serialize)]
struct Stats {
    total: usize,
    easy: usize,
    medium: usize,
    hard: usize,
    by_difficulty: BTreeMap<&'static str, usize>,
    by_source: BTreeMap<String, usize>,
    by_status: BTreeMap<&'static str, usize>,
}

impl Stats {
    fn collect(problems: &[Problem]) -> Self {
        let mut by_difficulty: BTreeMap<_, _> = Difficulty::ALL.iter().map(|d| (d.as_str(), 0)).collect();
        let mut by_status: BTreeMap<_, _> = StudyStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut by_source = BTreeMap::new();
        for problem in problems {
            *by_difficulty.entry(problem.difficulty.as_str()).or_default() += 1;
            *by_status.entry(problem.study_status.as_str()).or_default() += 1;
            *by_source.entry(problem.source.clone()).or_default() += 1;
        }
        Self {
            total: problems.len(),
            easy: by_difficulty[Difficulty::Easy.as_str()],
            medium: by_difficulty[Difficulty::Medium.as_str()],
            hard: by_difficulty[Difficulty::Hard.as_str()],
            by_difficulty,
            by_source,
            by_status,
        }
    }
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid problem id".into()))
}

fn validated(payload: Result<Json<NewProblem>, JsonRejection>) -> ApiResult<NewProblem> {
    let Json(problem) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if problem.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }
    if problem.source.trim().is_empty() {
        return Err(ApiError::BadRequest("source is required".into()));
    }
    Ok(problem)
}

async fn list_problems_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ProblemPage>> {
    let (page, limit) = query.resolve();
    let all = state.store.find_all().await?;
    let total = all.len();
    let problems = all
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();
    Ok(Json(ProblemPage {
        problems,
        total,
        page,
        limit,
    }))
}

async fn create_problem_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewProblem>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut problem = validated(payload)?;
    // The daily flag only moves through `mark_as_daily`.
    problem.is_daily = false;
    problem.daily_date = None;
    let id = state.store.create(problem).await?;
    info!(id, "problem created");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_problem_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Problem>> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.find_by_id(id).await?))
}

async fn update_problem_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<NewProblem>, JsonRejection>,
) -> ApiResult<Json<Problem>> {
    let id = parse_id(&id)?;
    let problem = validated(payload)?;
    let existing = state.store.find_by_id(id).await?;
    let problem = Problem {
        is_daily: existing.is_daily,
        daily_date: existing.daily_date,
        ..problem.into_problem(id, existing.created_at)
    };
    state.store.update(&problem).await?;
    Ok(Json(state.store.find_by_id(id).await?))
}

async fn delete_problem_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    info!(id, "problem deleted");
    Ok(Json(json!({ "message": "problem deleted" })))
}

async fn study_status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<StudyStatusBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_id(&id)?;
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let status: StudyStatus = body
        .study_status
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid study status".into()))?;
    let last_studied = (status != StudyStatus::NotStarted).then(Utc::now);
    state
        .store
        .update_study_status(id, status, last_studied)
        .await?;
    Ok(Json(json!({ "message": "study status updated" })))
}

async fn problems_by_source_handler(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> ApiResult<Json<ProblemList<Problem>>> {
    Ok(Json(state.store.find_by_source(&source).await?.into()))
}

async fn problems_by_difficulty_handler(
    State(state): State<Arc<AppState>>,
    Path(difficulty): Path<String>,
) -> ApiResult<Json<ProblemList<Problem>>> {
    let difficulty: Difficulty = difficulty
        .parse()
        .map_err(|e: studylog_core::ParseEnumError| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(state.store.find_by_difficulty(difficulty).await?.into()))
}

/// Today's flagged problem, else the problem today's history row points at,
/// else a random pick that becomes today's problem.
async fn daily_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Problem>> {
    let today = state.clock.now().date_naive();
    let store = &state.store;

    if let Some(problem) = store.daily_for(today).await? {
        return Ok(Json(problem));
    }
    if let Some(selection) = store.selection_for(today).await? {
        match store.find_by_id(selection.problem_id).await {
            Ok(problem) => return Ok(Json(problem)),
            Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    let Some(picked) = store.random_problem().await? else {
        return Err(ApiError::NotFound("no problems in catalog".into()));
    };
    store.mark_as_daily(picked.id, today).await?;
    info!(id = picked.id, %today, "picked random daily problem");
    Ok(Json(store.find_by_id(picked.id).await?))
}

async fn daily_history_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ProblemList<DailySelection>>> {
    Ok(Json(state.store.daily_history().await?.into()))
}

async fn daily_refresh_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ReconcileReport>> {
    let job = state
        .job
        .clone()
        .ok_or_else(|| ApiError::Unavailable("daily refresh is not configured".into()))?;
    let today = state.clock.now().date_naive();
    Ok(Json(job.run_daily(today).await?))
}

async fn random_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Problem>> {
    state
        .store
        .random_problem()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no problems in catalog".into()))
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Stats>> {
    let problems = state.store.find_all().await?;
    Ok(Json(Stats::collect(&problems)))
}

async fn seed_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<SeedSummary>> {
    let seed = match &state.seed {
        Some(seed) => seed.clone(),
        None => Arc::new(Top100Seed::embedded()?),
    };
    Ok(Json(seed_top100(state.store.as_ref(), &seed).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{DateTime, Local, NaiveDate, TimeZone};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use studylog_storage::MemoryProblemStore;
    use studylog_sync::{ReconcileError, SeedEntry};
    use tower::ServiceExt;

    struct FixedClock(DateTime<Local>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            self.0
        }
    }

    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(Local.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn new_problem(source_id: &str, difficulty: Difficulty) -> NewProblem {
        NewProblem {
            title: format!("problem {source_id}"),
            difficulty,
            tags: vec!["数组".into()],
            source: "leetcode".into(),
            source_id: source_id.into(),
            source_url: format!("https://leetcode.cn/problems/p{source_id}/"),
            study_status: StudyStatus::NotStarted,
            last_studied: None,
            is_daily: false,
            daily_date: None,
            is_top100: false,
        }
    }

    async fn seeded_store(n: usize) -> Arc<MemoryProblemStore> {
        let store = Arc::new(MemoryProblemStore::new());
        for i in 1..=n {
            let difficulty = Difficulty::ALL[i % 3];
            store
                .create(new_problem(&i.to_string(), difficulty))
                .await
                .unwrap();
        }
        store
    }

    fn state(store: Arc<MemoryProblemStore>) -> AppState {
        AppState::new(store).with_clock(fixed_clock())
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn list_paginates_and_falls_back_on_bad_limits() {
        let app = app(state(seeded_store(120).await));

        let (status, body) = send(app.clone(), "GET", "/api/coding/problems", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 120);
        assert_eq!(body["limit"], 50);
        assert_eq!(body["problems"].as_array().unwrap().len(), 50);

        let (_, body) = send(app.clone(), "GET", "/api/coding/problems?page=3&limit=50", None).await;
        assert_eq!(body["problems"].as_array().unwrap().len(), 20);
        assert_eq!(body["problems"][0]["id"], 101);

        let (_, body) = send(app.clone(), "GET", "/api/coding/problems?page=0&limit=500", None).await;
        assert_eq!((body["page"].as_u64(), body["limit"].as_u64()), (Some(1), Some(50)));

        let (_, body) = send(app, "GET", "/api/coding/problems?page=9&limit=abc", None).await;
        assert!(body["problems"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let app = app(state(Arc::new(MemoryProblemStore::new())));

        let payload = json!({
            "title": "两数之和",
            "difficulty": "Easy",
            "tags": ["数组", "数组", " 哈希表 "],
            "source": "leetcode",
            "source_id": "1",
            "source_url": "https://leetcode.cn/problems/two-sum/"
        });
        let (status, body) = send(app.clone(), "POST", "/api/coding/problems", Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();

        let (status, body) = send(app.clone(), "GET", &format!("/api/coding/problems/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tags"], json!(["数组", "哈希表"]));
        assert_eq!(body["study_status"], "not_started");

        let update = json!({"title": "Two Sum", "difficulty": "Easy", "source": "leetcode", "source_id": "1"});
        let (status, body) =
            send(app.clone(), "PUT", &format!("/api/coding/problems/{id}"), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Two Sum");

        let (status, _) = send(app.clone(), "DELETE", &format!("/api/coding/problems/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(app, "GET", &format!("/api/coding/problems/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn bad_input_is_rejected_as_json() {
        let app = app(state(seeded_store(1).await));

        let (status, body) = send(app.clone(), "GET", "/api/coding/problems/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid problem id");

        let (status, _) = send(app.clone(), "GET", "/api/coding/problems/difficulty/Impossible", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/coding/problems",
            Some(json!({"title": "", "difficulty": "Easy", "source": "leetcode"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            app,
            "PUT",
            "/api/coding/problems/1/study-status",
            Some(json!({"study_status": "mastered"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid study status");
    }

    #[tokio::test]
    async fn study_status_stamps_last_studied() {
        let store = seeded_store(1).await;
        let app = app(state(store.clone()));

        let (status, _) = send(
            app.clone(),
            "PUT",
            "/api/coding/problems/1/study-status",
            Some(json!({"study_status": "in_progress"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let problem = store.find_by_id(1).await.unwrap();
        assert_eq!(problem.study_status, StudyStatus::InProgress);
        assert!(problem.last_studied.is_some());

        let (status, _) = send(
            app,
            "PUT",
            "/api/coding/problems/99/study-status",
            Some(json!({"study_status": "completed"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn daily_prefers_flag_then_picks_random() {
        let empty = app(state(Arc::new(MemoryProblemStore::new())));
        let (status, _) = send(empty, "GET", "/api/coding/daily", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let store = seeded_store(3).await;
        store.mark_as_daily(2, today()).await.unwrap();
        let app = app(state(store.clone()));
        let (status, body) = send(app.clone(), "GET", "/api/coding/daily", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 2);

        // Yesterday's flag does not count for today.
        let stale = seeded_store(3).await;
        stale
            .mark_as_daily(1, today().pred_opt().unwrap())
            .await
            .unwrap();
        let app = super::app(state(stale.clone()));
        let (status, body) = send(app.clone(), "GET", "/api/coding/daily", None).await;
        assert_eq!(status, StatusCode::OK);
        let picked = body["id"].as_i64().unwrap();
        assert_eq!(stale.daily_for(today()).await.unwrap().unwrap().id, picked);

        let (_, again) = send(app.clone(), "GET", "/api/coding/daily", None).await;
        assert_eq!(again["id"], picked);
        let (_, history) = send(app, "GET", "/api/coding/daily/history", None).await;
        assert_eq!(history["total"], 2);
        assert_eq!(history["problems"][0]["date"], "2026-10-18");
    }

    #[tokio::test]
    async fn writes_cannot_set_the_daily_flag() {
        let store = seeded_store(2).await;
        store.mark_as_daily(1, today()).await.unwrap();
        let app = app(state(store.clone()));

        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/coding/problems",
            Some(json!({
                "title": "三数之和", "difficulty": "Medium", "source": "leetcode",
                "source_id": "15", "is_daily": true, "daily_date": "2026-10-18"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created = store.find_by_id(body["id"].as_i64().unwrap()).await.unwrap();
        assert!(!created.is_daily);
        assert_eq!(created.daily_date, None);

        let (status, body) = send(
            app.clone(),
            "PUT",
            "/api/coding/problems/2",
            Some(json!({
                "title": "problem 2", "difficulty": "Hard", "source": "leetcode",
                "source_id": "2", "is_daily": true, "daily_date": "2026-10-18"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_daily"], false);

        // Updating the current daily problem keeps its flag.
        let (status, body) = send(
            app,
            "PUT",
            "/api/coding/problems/1",
            Some(json!({
                "title": "renamed", "difficulty": "Medium", "source": "leetcode",
                "source_id": "1", "is_daily": false
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_daily"], true);
        assert_eq!(body["daily_date"], "2026-10-18");

        let flagged: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_daily)
            .map(|p| p.id)
            .collect();
        assert_eq!(flagged, vec![1]);
    }

    #[tokio::test]
    async fn update_onto_taken_external_id_is_rejected() {
        let store = seeded_store(2).await;
        let app = app(state(store.clone()));
        let (status, body) = send(
            app,
            "PUT",
            "/api/coding/problems/2",
            Some(json!({"title": "dup", "difficulty": "easy", "source": "leetcode", "source_id": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(store.find_by_source_id("1").await.unwrap().len(), 1);
    }

    struct FixedJob;

    #[async_trait]
    impl DailyJob for FixedJob {
        async fn run_daily(&self, today: NaiveDate) -> Result<ReconcileReport, ReconcileError> {
            Ok(ReconcileReport {
                run_id: uuid::Uuid::new_v4(),
                date: today,
                problem_id: 7,
                title: "两数之和".into(),
                created: true,
                history_recorded: true,
            })
        }
    }

    #[tokio::test]
    async fn refresh_requires_a_job() {
        let store = Arc::new(MemoryProblemStore::new());
        let (status, body) = send(app(state(store.clone())), "POST", "/api/coding/daily/refresh", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());

        let wired = app(state(store).with_job(Arc::new(FixedJob)));
        let (status, body) = send(wired, "POST", "/api/coding/daily/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["problem_id"], 7);
        assert_eq!(body["date"], "2026-10-18");
    }

    #[tokio::test]
    async fn stats_and_seed() {
        let store = seeded_store(3).await;
        let seed = Top100Seed {
            base_url: "https://leetcode.cn/problems/".into(),
            problems: vec![
                SeedEntry {
                    id: "1".into(),
                    title: "两数之和".into(),
                    slug: "two-sum".into(),
                    difficulty: Difficulty::Easy,
                },
                SeedEntry {
                    id: "200".into(),
                    title: "岛屿数量".into(),
                    slug: "number-of-islands".into(),
                    difficulty: Difficulty::Medium,
                },
            ],
        };
        let app = app(state(store).with_seed(seed));

        let (status, body) = send(app.clone(), "POST", "/api/coding/seed/top100", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"inserted": 1, "skipped": 1, "failed": 0}));

        let (status, body) = send(app, "GET", "/api/coding/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 4);
        assert_eq!(body["easy"], 1);
        assert_eq!(body["medium"], 2);
        assert_eq!(body["hard"], 1);
        assert_eq!(body["by_source"]["leetcode"], 4);
        assert_eq!(body["by_status"]["not_started"], 4);
        assert_eq!(body["by_status"]["completed"], 0);
    }

    #[tokio::test]
    async fn cors_headers_are_permissive() {
        let app = app(state(seeded_store(1).await));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/coding/random")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
