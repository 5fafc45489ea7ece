#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use planning_console::config::AppConfig;
use planning_console::plans::{HttpTransport, PlanClient, TOTAL_COUNT_HEADER};
use planning_console::session::{MemorySession, Session, SessionStore, TokenPair};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";

const VOLUMES: [&str; 3] = [
    "Bərabər Bölünmə",
    "Tarixi Məlumatlara Əsaslanan Bölgü",
    "Dəyişən Bölünmə",
];
const SEARCHABLE: [&str; 5] = ["docNo", "projectName", "description", "volumeDivision", "status"];

/// How the fake backend behaves
#[derive(Debug, Clone)]
pub struct BackendOptions {
    pub seed: usize,
    pub total_header: bool,
    pub list_delay: Option<Duration>,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            total_header: true,
            list_delay: None,
        }
    }
}

#[derive(Default)]
struct BackendState {
    plans: Mutex<Vec<Value>>,
    tokens: Mutex<HashSet<String>>,
    options: Mutex<Option<BackendOptions>>,
    list_requests: AtomicUsize,
    mutations: AtomicUsize,
    logins: AtomicUsize,
}

/// In-process stand-in for the account service and a json-server `/plans` resource
pub struct Backend {
    pub port: u16,
    pub base_url: String,
    state: Arc<BackendState>,
}

pub fn seed_plan(n: usize) -> Value {
    let year = 2023 + (n % 4) as i32;
    let status = if n % 2 == 0 { "Deaktiv" } else { "Aktiv" };
    json!({
        "id": format!("plan-{n}"),
        "docNo": format!("DOC-{n:03}"),
        "projectName": format!("Layihe {n}"),
        "year": year,
        "description": format!("Plan {n} təsviri"),
        "volumeDivision": VOLUMES[n % VOLUMES.len()],
        "status": status,
    })
}

impl Backend {
    pub async fn start(options: BackendOptions) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = Arc::new(BackendState::default());
        *state.plans.lock().unwrap() = (1..=options.seed).map(seed_plan).collect();
        *state.options.lock().unwrap() = Some(options);

        let app = Router::new()
            .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
            .route("/Account/Login", post(login))
            .route("/plans", get(list_plans).post(create_plan))
            .route("/plans/:id", patch(update_plan).delete(delete_plan))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind fake backend")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let backend = Self { port, base_url, state };
        backend.wait_ready(Duration::from_secs(5)).await?;
        Ok(backend)
    }

    pub async fn seeded(count: usize) -> Result<Self> {
        Self::start(BackendOptions {
            seed: count,
            ..Default::default()
        })
        .await
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("fake backend did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Config pointing both services at this backend
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::development();
        config.api.auth_base_url = self.base_url.clone();
        config.api.plans_base_url = self.base_url.clone();
        config.api.request_timeout_secs = 5;
        config
    }

    /// Session holding a token this backend accepts
    pub fn logged_in_session(&self) -> Session {
        let token = uuid::Uuid::new_v4().to_string();
        self.state.tokens.lock().unwrap().insert(token.clone());
        Arc::new(MemorySession::with_tokens(TokenPair::new(token, "refresh")))
    }

    pub fn client(&self, session: Session) -> PlanClient<HttpTransport> {
        PlanClient::from_config(&self.config(), session).expect("plan client")
    }

    pub fn list_requests(&self) -> usize {
        self.state.list_requests.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.state.mutations.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    pub fn plans(&self) -> Vec<Value> {
        self.state.plans.lock().unwrap().clone()
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn authorized(state: &BackendState, headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| state.tokens.lock().unwrap().contains(token))
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<LoginBody>) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);
    if body.username != USERNAME || body.password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    }
    let access = uuid::Uuid::new_v4().to_string();
    state.tokens.lock().unwrap().insert(access.clone());
    Json(json!({
        "access_token": access,
        "refresh_token": uuid::Uuid::new_v4().to_string(),
    }))
    .into_response()
}

fn values<'a>(query: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    query.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
}

fn field<'a>(plan: &'a Value, name: &str) -> &'a str {
    plan.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn matches(plan: &Value, query: &[(String, String)]) -> bool {
    for key in ["status", "volumeDivision"] {
        let wanted = values(query, key);
        if !wanted.is_empty() && !wanted.contains(&field(plan, key)) {
            return false;
        }
    }
    match values(query, "q").first() {
        Some(q) => {
            let q = q.to_lowercase();
            SEARCHABLE.iter().any(|name| field(plan, name).to_lowercase().contains(&q))
        }
        None => true,
    }
}

async fn list_plans(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Response {
    state.list_requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "token expired");
    }
    let options = state.options.lock().unwrap().clone().unwrap_or_default();
    if let Some(delay) = options.list_delay {
        tokio::time::sleep(delay).await;
    }

    let query: Vec<(String, String)> = url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
        .into_owned()
        .collect();
    let number = |key: &str| {
        query
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.parse::<usize>().ok())
    };

    let plans = state.plans.lock().unwrap().clone();
    let matching: Vec<Value> = plans.into_iter().filter(|p| matches(p, &query)).collect();
    let total = matching.len();
    let page = match (number("_page"), number("_limit")) {
        (Some(page), Some(limit)) => matching
            .into_iter()
            .skip(page.saturating_sub(1) * limit)
            .take(limit)
            .collect(),
        _ => matching,
    };

    let mut response = Json(Value::Array(page)).into_response();
    if options.total_header {
        if let Ok(value) = HeaderValue::from_str(&total.to_string()) {
            response.headers_mut().insert(TOTAL_COUNT_HEADER, value);
        }
    }
    response
}

async fn create_plan(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "token expired");
    }
    state.mutations.fetch_add(1, Ordering::SeqCst);
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), json!(uuid::Uuid::new_v4().to_string()));
    }
    state.plans.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_plan(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "token expired");
    }
    state.mutations.fetch_add(1, Ordering::SeqCst);
    let mut plans = state.plans.lock().unwrap();
    let Some(plan) = plans.iter_mut().find(|p| p["id"] == json!(id)) else {
        return error(StatusCode::NOT_FOUND, "plan not found");
    };
    if let (Some(target), Some(patch)) = (plan.as_object_mut(), body.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
    Json(plan.clone()).into_response()
}

async fn delete_plan(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "token expired");
    }
    state.mutations.fetch_add(1, Ordering::SeqCst);
    let mut plans = state.plans.lock().unwrap();
    let before = plans.len();
    plans.retain(|p| p["id"] != json!(id));
    if plans.len() == before {
        return error(StatusCode::NOT_FOUND, "plan not found");
    }
    Json(json!({ "id": id })).into_response()
}

/// Session with a token the backend never issued
pub fn stale_session() -> Session {
    Arc::new(MemorySession::with_tokens(TokenPair::new("expired-token", "refresh")))
}

pub fn is_logged_in(session: &Session) -> bool {
    session.is_authenticated()
}
