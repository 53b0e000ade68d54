use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::access::{self, SequentialState};
use crate::catalog::{self, CatalogPage, CatalogQuery};
use crate::completion::{self, CompletionPayload, ProgressDecision};
use crate::config::Config;
use crate::dashboard::{self, Dashboard, DashboardInput};
use crate::models::{ActivityType, Course, LearningPath, ProgressRecord};
use crate::navigation::{self, NavigationState};
use crate::progress::{self, ProgressReport};
use crate::scorm::{self, CompletionData, ScormPackage, ScormVersion};
use crate::sessions::SessionRegistry;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let sessions = SessionRegistry::new(Duration::from_secs(config.session_idle_secs));
        Self {
            config: Arc::new(config),
            sessions,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // progress + navigation
        .route("/api/navigation", post(navigation_state))
        .route("/api/progress", post(progress_report))
        .route("/api/progress/decide", post(decide_progress))
        .route("/api/learning-paths/access", post(learning_path_access))
        .route("/api/learning-paths/access/check", post(check_course_access))
        .route("/api/catalog", post(query_catalog))
        .route("/api/dashboard", post(build_dashboard))
        // package inspection
        .route(
            "/api/scorm/packages/inspect",
            post(inspect_package).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // runtime API
        .route("/runtime/sessions", post(rt_install))
        .route("/runtime/:session_id", delete(rt_uninstall))
        .route("/runtime/:session_id/initialize", post(rt_initialize))
        .route("/runtime/:session_id/get", post(rt_get))
        .route("/runtime/:session_id/set", post(rt_set))
        .route("/runtime/:session_id/commit", post(rt_commit))
        .route("/runtime/:session_id/terminate", post(rt_terminate))
        .route("/runtime/:session_id/call", post(rt_call))
        .route("/runtime/:session_id/error/:code", get(rt_error))
        .with_state(state)
}

// --- compute endpoints ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NavigationReq {
    pub course: Course,
    #[serde(default)]
    pub completed_activity_ids: Vec<String>,
    pub current_activity_id: Option<String>,
}

async fn navigation_state(Json(req): Json<NavigationReq>) -> Json<NavigationState> {
    let completed: HashSet<String> = req.completed_activity_ids.into_iter().collect();
    Json(navigation::navigation_state(
        &req.course,
        &completed,
        req.current_activity_id.as_deref(),
    ))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReq {
    pub child_ids: Vec<String>,
    #[serde(default)]
    pub records: Vec<ProgressRecord>,
}

async fn progress_report(Json(req): Json<ProgressReq>) -> Json<ProgressReport> {
    Json(progress::report(&req.child_ids, &req.records))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DecideReq {
    pub activity_type: Option<ActivityType>,
    pub current: Option<ProgressRecord>,
    pub payload: CompletionPayload,
}

#[skip_serializing_none]
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DecideResp {
    pub changed: bool,
    pub decision: Option<ProgressDecision>,
}

async fn decide_progress(Json(req): Json<DecideReq>) -> ApiResult<DecideResp> {
    let decision =
        completion::decide_activity_progress(req.activity_type, req.current.as_ref(), &req.payload, Utc::now())
            .map_err(e400)?;
    Ok(Json(DecideResp {
        changed: decision.is_some(),
        decision,
    }))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccessReq {
    pub learning_path: LearningPath,
    #[serde(default)]
    pub records: Vec<ProgressRecord>,
}

async fn learning_path_access(Json(req): Json<AccessReq>) -> Json<SequentialState> {
    Json(access::learning_path_state(&req.learning_path, &req.records))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckReq {
    pub learning_path: LearningPath,
    #[serde(default)]
    pub records: Vec<ProgressRecord>,
    pub course_id: String,
}

async fn check_course_access(Json(req): Json<AccessCheckReq>) -> ApiResult<serde_json::Value> {
    let state = access::learning_path_state(&req.learning_path, &req.records);
    if !state.unlocked_course_ids.contains(&req.course_id) && !state.locked_course_ids.contains(&req.course_id) {
        return Err(e404("course is not part of this learning path"));
    }
    if !access::is_accessible_in_sequence(&req.course_id, &state) {
        tracing::info!(course_id = %req.course_id, learning_path = %req.learning_path.id, "locked course requested");
        return Err(e403("course is locked until earlier courses are completed"));
    }
    Ok(Json(serde_json::json!({ "accessible": true })))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReq {
    pub courses: Vec<Course>,
    #[serde(flatten)]
    pub query: CatalogQuery,
}

async fn query_catalog(Json(req): Json<CatalogReq>) -> ApiResult<serde_json::Value> {
    let page: CatalogPage<'_> = catalog::query_catalog(&req.courses, &req.query);
    serde_json::to_value(page).map(Json).map_err(e500)
}

async fn build_dashboard(Json(input): Json<DashboardInput>) -> Json<Dashboard> {
    Json(dashboard::build_dashboard(&input))
}

#[skip_serializing_none]
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InspectResp {
    pub package: ScormPackage,
    pub launch_url: Option<String>,
}

async fn inspect_package(State(state): State<AppState>, mut mp: Multipart) -> ApiResult<InspectResp> {
    let mut package_path = None;
    let mut zip_bytes: Option<Vec<u8>> = None;

    while let Some(field) = mp.next_field().await.map_err(e400)? {
        let name = field.name().unwrap_or("").to_string();
        if name == "packagePath" {
            package_path = Some(field.text().await.map_err(e400)?);
        } else if name == "file" {
            zip_bytes = Some(field.bytes().await.map_err(e400)?.to_vec());
        }
    }

    let bytes = zip_bytes.ok_or(e400("file is required"))?;
    let package = ScormPackage::from_zip_bytes(&bytes).map_err(e400)?;
    let launch_url = package_path.map(|path| package.launch_url(&state.config.content_base_url, &path));
    Ok(Json(InspectResp { package, launch_url }))
}

// --- runtime endpoints ---

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct InstallReq {
    #[serde(default)]
    pub version: ScormVersion,
    pub activity_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InstallResp {
    pub session_id: Uuid,
    pub version: ScormVersion,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RuntimeSetReq {
    pub element: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RuntimeGetReq {
    pub element: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RuntimeCallReq {
    pub method: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// `result` is the SCORM return string; `errorCode` what GetLastError would say.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeReply {
    pub result: String,
    pub error_code: String,
    pub activity_id: Option<String>,
    pub completion: Option<CompletionData>,
}

impl RuntimeReply {
    fn new(result: impl Into<String>, rt: &scorm::ScormRuntime) -> Self {
        Self {
            result: result.into(),
            error_code: rt.last_error().to_string(),
            activity_id: None,
            completion: None,
        }
    }
}

async fn rt_install(State(state): State<AppState>, Json(req): Json<InstallReq>) -> Json<InstallResp> {
    let session_id = state.sessions.install(req.version, req.activity_id).await;
    Json(InstallResp {
        session_id,
        version: req.version,
    })
}

async fn rt_uninstall(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> StatusCode {
    if state.sessions.uninstall(session_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn on_session<F>(state: &AppState, session_id: Uuid, f: F) -> ApiResult<RuntimeReply>
where
    F: FnOnce(&mut crate::sessions::ScormSession) -> RuntimeReply,
{
    state
        .sessions
        .with_session(session_id, f)
        .await
        .map(Json)
        .ok_or_else(|| e404("session not found"))
}

async fn rt_initialize(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> ApiResult<RuntimeReply> {
    on_session(&state, session_id, |s| {
        let result = s.runtime.initialize();
        RuntimeReply::new(result, &s.runtime)
    })
    .await
}

async fn rt_get(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<RuntimeGetReq>,
) -> ApiResult<RuntimeReply> {
    on_session(&state, session_id, |s| {
        let value = s.runtime.get_value(&req.element);
        RuntimeReply::new(value, &s.runtime)
    })
    .await
}

async fn rt_set(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<RuntimeSetReq>,
) -> ApiResult<RuntimeReply> {
    on_session(&state, session_id, |s| {
        let result = s.runtime.set_value(&req.element, &req.value);
        RuntimeReply::new(result, &s.runtime)
    })
    .await
}

async fn rt_commit(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> ApiResult<RuntimeReply> {
    on_session(&state, session_id, |s| {
        let result = s.runtime.commit();
        RuntimeReply::new(result, &s.runtime)
    })
    .await
}

async fn rt_terminate(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> ApiResult<RuntimeReply> {
    on_session(&state, session_id, |s| {
        let result = s.runtime.terminate();
        RuntimeReply {
            activity_id: s.activity_id.clone(),
            completion: s.take_completion(),
            ..RuntimeReply::new(result, &s.runtime)
        }
    })
    .await
}

async fn rt_call(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<RuntimeCallReq>,
) -> ApiResult<RuntimeReply> {
    let reply = state
        .sessions
        .with_session(session_id, |s| {
            scorm::api::dispatch(&mut s.runtime, &req.method, &req.args).map(|result| RuntimeReply {
                activity_id: s.activity_id.clone(),
                completion: s.take_completion(),
                ..RuntimeReply::new(result, &s.runtime)
            })
        })
        .await
        .ok_or_else(|| e404("session not found"))?;
    reply
        .map(Json)
        .ok_or_else(|| e400(format!("unknown runtime method {}", req.method)))
}

async fn rt_error(
    State(state): State<AppState>,
    Path((session_id, code)): Path<(Uuid, String)>,
) -> ApiResult<RuntimeReply> {
    on_session(&state, session_id, |s| {
        let result = s.runtime.error_string(&code);
        RuntimeReply::new(result, &s.runtime)
    })
    .await
}

// --- helpers ---
fn e400<E: std::fmt::Display>(msg: E) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

fn e403<T: Into<String>>(msg: T) -> (StatusCode, String) {
    (StatusCode::FORBIDDEN, msg.into())
}

fn e404<T: Into<String>>(msg: T) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, msg.into())
}

fn e500<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    tracing::error!(error=%e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
