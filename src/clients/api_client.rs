/// 后端 API 客户端
///
/// 封装所有与评分服务相关的 HTTP 调用，负责把 HTTP 层面的失败
/// 归类为应用错误（网络 / 认证 / 服务器）
use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError, ValidationError};
use crate::models::wire::{
    BatchAnalysisResponse, CodeValidationRequest, CodeValidationResponse, ErrorBody, ExportRequest,
    SessionInfoResponse, SingleAnalysisResponse,
};
use crate::models::{AnalysisResult, AuthToken, CandidateScore};
use crate::services::submission_builder::{Payload, PayloadPart, SubmissionMode};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const VALIDATE_CODE: &str = "/api/validate-code";
const SESSION_INFO: &str = "/api/session-info";
const ANALYZE_SINGLE: &str = "/api/analyze";
const ANALYZE_BATCH: &str = "/api/analyze-batch";
const EXPORT_RANKING: &str = "/api/export-excel";

/// 分析完成后的响应：结果 + 服务器给出的剩余积分
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub credits_remaining: u32,
}

/// 远程评分服务接口
#[async_trait]
pub trait ScoringApi: Send + Sync {
    /// 校验访问码
    async fn validate_code(&self, code: &str) -> AppResult<CodeValidationResponse>;

    /// 查询会话信息（剩余积分）
    async fn session_info(&self, token: &AuthToken) -> AppResult<SessionInfoResponse>;

    /// 提交分析
    async fn analyze(&self, token: &AuthToken, payload: &Payload) -> AppResult<AnalysisOutcome>;

    /// 导出排名，返回表格文件的二进制内容
    async fn export_ranking(&self, token: &AuthToken, ranking: &[CandidateScore]) -> AppResult<Vec<u8>>;
}

/// 基于 reqwest 的 API 客户端
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::network(&config.api_base_url, e))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 发送请求，返回成功状态的响应
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::network(endpoint, e))?;

        let status = response.status();
        debug!("{} -> {}", endpoint, status);

        if status.is_success() {
            return Ok(response);
        }

        let message = match response.bytes().await {
            Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message),
            Err(e) => {
                warn!("读取错误响应失败 ({}): {}", endpoint, e);
                None
            }
        };

        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::TokenRejected {
                message: message.unwrap_or_else(|| "登录已失效，请重新输入访问码".to_string()),
            }
            .into());
        }

        Err(AppError::rejected(endpoint, status.as_u16(), message))
    }

    async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> AppResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::network(endpoint, e))?;
        serde_json::from_slice(&body).map_err(|e| AppError::malformed(endpoint, e))
    }

    /// 把负载转换为 multipart 表单，保持部分顺序
    fn build_form(payload: &Payload) -> AppResult<Form> {
        let mut form = Form::new();
        for part in payload.parts() {
            form = match part {
                PayloadPart::File { field, document } => {
                    let file = Part::bytes(document.content.clone())
                        .file_name(document.name.clone())
                        .mime_str(&document.media_type)
                        .map_err(|_| ValidationError::InvalidMediaType {
                            name: document.name.clone(),
                            media_type: document.media_type.clone(),
                        })?;
                    form.part(*field, file)
                }
                PayloadPart::Text { field, value } => form.text(*field, value.clone()),
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl ScoringApi for ApiClient {
    async fn validate_code(&self, code: &str) -> AppResult<CodeValidationResponse> {
        let request = self
            .http
            .post(self.url(VALIDATE_CODE))
            .json(&CodeValidationRequest { code });
        let response = self.send(VALIDATE_CODE, request).await?;
        Self::read_json(VALIDATE_CODE, response).await
    }

    async fn session_info(&self, token: &AuthToken) -> AppResult<SessionInfoResponse> {
        let request = self.http.get(self.url(SESSION_INFO)).bearer_auth(token.as_str());
        let response = self.send(SESSION_INFO, request).await?;
        Self::read_json(SESSION_INFO, response).await
    }

    async fn analyze(&self, token: &AuthToken, payload: &Payload) -> AppResult<AnalysisOutcome> {
        let endpoint = match payload.mode() {
            SubmissionMode::Single => ANALYZE_SINGLE,
            SubmissionMode::Batch => ANALYZE_BATCH,
        };

        let request = self
            .http
            .post(self.url(endpoint))
            .bearer_auth(token.as_str())
            .multipart(Self::build_form(payload)?);
        let response = self.send(endpoint, request).await?;

        match payload.mode() {
            SubmissionMode::Single => {
                let body: SingleAnalysisResponse = Self::read_json(endpoint, response).await?;
                Ok(AnalysisOutcome {
                    result: AnalysisResult::Single(body.analysis),
                    credits_remaining: body.credits_remaining,
                })
            }
            SubmissionMode::Batch => {
                let body: BatchAnalysisResponse = Self::read_json(endpoint, response).await?;
                Ok(AnalysisOutcome {
                    result: AnalysisResult::Ranking(body.result),
                    credits_remaining: body.credits_remaining,
                })
            }
        }
    }

    async fn export_ranking(&self, token: &AuthToken, ranking: &[CandidateScore]) -> AppResult<Vec<u8>> {
        let request = self
            .http
            .post(self.url(EXPORT_RANKING))
            .bearer_auth(token.as_str())
            .json(&ExportRequest { ranking });
        let response = self.send(EXPORT_RANKING, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::network(EXPORT_RANKING, e))?;
        Ok(bytes.to_vec())
    }
}
