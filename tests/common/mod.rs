//! 集成测试使用的进程内后端

#![allow(dead_code)]

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cv_analyzer::infrastructure::{DirectorySink, FileSessionStore};
use cv_analyzer::{ApiClient, Config, ExportCoordinator, JobOrchestrator, ScoringApi, SessionController};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const XLSX_BYTES: &[u8] = b"PK\x03\x04ranking";

#[derive(Debug, Default)]
pub struct BackendState {
    /// 访问码 -> (令牌, 初始积分)
    pub codes: HashMap<String, (String, u32)>,
    /// 令牌 -> 剩余积分
    pub credits: HashMap<String, u32>,
    /// 按接收顺序记录的上传文件名
    pub uploads: Vec<String>,
    pub job_description: Option<String>,
    /// 设置后 session-info 直接返回该状态码
    pub session_info_status: Option<StatusCode>,
    pub exported_rows: Vec<usize>,
}

#[derive(Clone, Default)]
pub struct Backend {
    pub state: Arc<Mutex<BackendState>>,
}

impl Backend {
    pub fn with_code(code: &str, token: &str, credits: u32) -> Self {
        let backend = Self::default();
        backend
            .state
            .lock()
            .unwrap()
            .codes
            .insert(code.to_string(), (token.to_string(), credits));
        backend
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state.lock().unwrap().uploads.clone()
    }
}

/// 启动后端，返回基础地址
pub async fn spawn(backend: Backend) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/api/validate-code", post(validate_code))
        .route("/api/session-info", get(session_info))
        .route("/api/analyze", post(analyze_single))
        .route("/api/analyze-batch", post(analyze_batch))
        .route("/api/export-excel", post(export_excel))
        .with_state(backend);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// 客户端各组件
pub struct Client {
    pub session: Arc<SessionController>,
    pub jobs: JobOrchestrator,
    pub exporter: ExportCoordinator,
}

pub fn config(base_url: &str, dir: &Path) -> Config {
    Config {
        session_file: dir.join("session.toml").to_string_lossy().into_owned(),
        export_dir: dir.join("exports").to_string_lossy().into_owned(),
        request_timeout_secs: 10,
        ..Config::default().with_api_base_url(base_url)
    }
}

pub fn client(config: &Config) -> Client {
    let api: Arc<dyn ScoringApi> = Arc::new(ApiClient::new(config).unwrap());
    let store = Arc::new(FileSessionStore::open_or_reset(&config.session_file).unwrap());
    let session = Arc::new(SessionController::new(api.clone(), store));
    let sink = Arc::new(DirectorySink::new(&config.export_dir));
    Client {
        jobs: JobOrchestrator::new(session.clone(), api.clone()),
        exporter: ExportCoordinator::new(session.clone(), api, sink),
        session,
    }
}

// ========== 路由处理 ==========

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Token inválido" }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// 校验令牌并扣除一次积分，返回剩余积分
fn charge(backend: &Backend, headers: &HeaderMap) -> Result<u32, Response> {
    let token = bearer(headers).ok_or_else(unauthorized)?;
    let mut state = backend.state.lock().unwrap();
    let credits = state.credits.get_mut(&token).ok_or_else(unauthorized)?;
    if *credits == 0 {
        return Err((StatusCode::PAYMENT_REQUIRED, Json(json!({ "detail": "Sin créditos" }))).into_response());
    }
    *credits -= 1;
    Ok(*credits)
}

async fn validate_code(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let code = body["code"].as_str().unwrap_or_default();
    let mut state = backend.state.lock().unwrap();
    match state.codes.get(code).cloned() {
        Some((token, credits)) => {
            state.credits.insert(token.clone(), credits);
            Json(json!({ "valid": true, "token": token, "credits": credits })).into_response()
        }
        None => (StatusCode::BAD_REQUEST, Json(json!({ "detail": "Código inválido" }))).into_response(),
    }
}

async fn session_info(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    let state = backend.state.lock().unwrap();
    if let Some(status) = state.session_info_status {
        return (status, Json(json!({ "detail": "Token inválido" }))).into_response();
    }
    let Some(credits) = bearer(&headers).and_then(|t| state.credits.get(&t).copied()) else {
        return unauthorized();
    };
    Json(json!({ "credits_remaining": credits, "session_id": "s-1" })).into_response()
}

async fn read_files(backend: &Backend, mut multipart: Multipart, field_name: &str) -> Vec<String> {
    let mut names = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == field_name {
            names.push(field.file_name().unwrap_or_default().to_string());
            let _ = field.bytes().await.unwrap();
        } else if name == "job_description" {
            let text = field.text().await.unwrap();
            backend.state.lock().unwrap().job_description = Some(text);
        }
    }
    backend.state.lock().unwrap().uploads.extend(names.iter().cloned());
    names
}

async fn analyze_single(State(backend): State<Backend>, headers: HeaderMap, multipart: Multipart) -> Response {
    let remaining = match charge(&backend, &headers) {
        Ok(remaining) => remaining,
        Err(response) => return response,
    };
    let names = read_files(&backend, multipart, "file").await;
    let name = names.first().cloned().unwrap_or_default();
    Json(json!({
        "nombre": name,
        "email": "ana@example.com",
        "puntaje": "78/100",
        "fortalezas": ["Rust"],
        "mejoras": [],
        "credits_remaining": remaining
    }))
    .into_response()
}

async fn analyze_batch(State(backend): State<Backend>, headers: HeaderMap, multipart: Multipart) -> Response {
    let remaining = match charge(&backend, &headers) {
        Ok(remaining) => remaining,
        Err(response) => return response,
    };
    let names = read_files(&backend, multipart, "files").await;
    let ranking: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let fit = if i == 0 { "Excelente" } else { "Bueno" };
            json!({
                "nombre": n,
                "puntaje": 90.4 - (i as f64) * 10.0,
                "ajuste": fit,
                "razon_si": "Experiencia relevante",
                "razon_no": "Poca experiencia en pagos"
            })
        })
        .collect();
    Json(json!({
        "ranking": ranking,
        "conclusion_global": "El primer candidato destaca",
        "credits_remaining": remaining
    }))
    .into_response()
}

async fn export_excel(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let Some(token) = bearer(&headers) else {
        return unauthorized();
    };
    let mut state = backend.state.lock().unwrap();
    if !state.credits.contains_key(&token) {
        return unauthorized();
    }
    let rows = body["ranking"].as_array().map(Vec::len).unwrap_or(0);
    state.exported_rows.push(rows);
    (
        [(
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )],
        XLSX_BYTES,
    )
        .into_response()
}
