//! 单元测试使用的假服务

use crate::clients::{AnalysisOutcome, ScoringApi};
use crate::error::{AppError, AppResult};
use crate::models::wire::{CodeValidationResponse, SessionInfoResponse};
use crate::models::{AnalysisResult, AuthToken, CandidateScore, Document, FitLabel, RankingResult};
use crate::services::submission_builder::{Payload, SubmissionBuilder, SubmissionMode};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// 假服务记录的调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Validate(String),
    SessionInfo(String),
    Analyze { token: String, documents: Vec<String> },
    Export { token: String, rows: usize },
}

/// 按脚本依次返回结果的评分服务
#[derive(Default)]
pub(crate) struct FakeApi {
    validate: Mutex<VecDeque<AppResult<CodeValidationResponse>>>,
    session: Mutex<VecDeque<AppResult<SessionInfoResponse>>>,
    analyze: Mutex<VecDeque<AppResult<AnalysisOutcome>>>,
    export: Mutex<VecDeque<AppResult<Vec<u8>>>>,
    gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// analyze 调用会一直挂起，直到返回的 Sender 被触发
    pub fn gated(self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        *self.gate.try_lock().unwrap() = Some(rx);
        (self, tx)
    }

    pub fn on_validate(self, result: AppResult<CodeValidationResponse>) -> Self {
        self.validate.lock().unwrap().push_back(result);
        self
    }

    pub fn on_session_info(self, result: AppResult<SessionInfoResponse>) -> Self {
        self.session.lock().unwrap().push_back(result);
        self
    }

    pub fn on_analyze(self, result: AppResult<AnalysisOutcome>) -> Self {
        self.analyze.lock().unwrap().push_back(result);
        self
    }

    pub fn on_export(self, result: AppResult<Vec<u8>>) -> Self {
        self.export.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T>(queue: &Mutex<VecDeque<AppResult<T>>>, name: &str) -> AppResult<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("unexpected {name} call"))
}

#[async_trait]
impl ScoringApi for FakeApi {
    async fn validate_code(&self, code: &str) -> AppResult<CodeValidationResponse> {
        self.record(Call::Validate(code.to_string()));
        next(&self.validate, "validate_code")
    }

    async fn session_info(&self, token: &AuthToken) -> AppResult<SessionInfoResponse> {
        self.record(Call::SessionInfo(token.as_str().to_string()));
        next(&self.session, "session_info")
    }

    async fn analyze(&self, token: &AuthToken, payload: &Payload) -> AppResult<AnalysisOutcome> {
        self.record(Call::Analyze {
            token: token.as_str().to_string(),
            documents: payload.documents().map(|d| d.name.clone()).collect(),
        });
        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        next(&self.analyze, "analyze")
    }

    async fn export_ranking(&self, token: &AuthToken, ranking: &[CandidateScore]) -> AppResult<Vec<u8>> {
        self.record(Call::Export {
            token: token.as_str().to_string(),
            rows: ranking.len(),
        });
        next(&self.export, "export_ranking")
    }
}

// ========== 测试数据 ==========

pub(crate) fn valid_code(token: &str, credits: u32) -> AppResult<CodeValidationResponse> {
    Ok(CodeValidationResponse {
        valid: true,
        token: Some(token.to_string()),
        credits,
        message: None,
    })
}

pub(crate) fn rejected_code(message: Option<&str>) -> AppResult<CodeValidationResponse> {
    Ok(CodeValidationResponse {
        valid: false,
        token: None,
        credits: 0,
        message: message.map(str::to_string),
    })
}

pub(crate) fn session_info(credits: u32) -> AppResult<SessionInfoResponse> {
    Ok(SessionInfoResponse {
        credits_remaining: credits,
        session_id: Some("s-1".to_string()),
    })
}

pub(crate) fn transient() -> AppError {
    AppError::network(
        "/test",
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
    )
}

pub(crate) fn candidate(name: &str, score: u8, fit: &str) -> CandidateScore {
    CandidateScore {
        name: name.to_string(),
        score,
        fit: FitLabel::parse(fit),
        reason_for: format!("{name} +"),
        reason_against: format!("{name} -"),
    }
}

pub(crate) fn ranking_outcome(names: &[&str], credits_remaining: u32) -> AppResult<AnalysisOutcome> {
    let ranking = names
        .iter()
        .enumerate()
        .map(|(i, n)| candidate(n, 90 - (i as u8) * 10, "Bueno"))
        .collect();
    Ok(AnalysisOutcome {
        result: AnalysisResult::Ranking(RankingResult {
            ranking,
            conclusion: "ok".to_string(),
        }),
        credits_remaining,
    })
}

pub(crate) fn batch_payload(names: &[&str]) -> Payload {
    let docs = names
        .iter()
        .map(|n| Document::from_bytes(*n, b"cv".to_vec(), "application/pdf"))
        .collect();
    SubmissionBuilder::new()
        .build(SubmissionMode::Batch, docs, Some("Backend engineer"))
        .unwrap()
}
