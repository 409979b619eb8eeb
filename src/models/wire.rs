//! 与后端交互的请求/响应结构

use crate::models::analysis::{CandidateAnalysis, CandidateScore, RankingResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct CodeValidationRequest<'a> {
    pub code: &'a str,
}

/// 访问码校验响应
#[derive(Debug, Clone, Deserialize)]
pub struct CodeValidationResponse {
    pub valid: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub message: Option<String>,
}

/// 会话信息响应
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfoResponse {
    pub credits_remaining: u32,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// 单份分析响应
#[derive(Debug, Clone, Deserialize)]
pub struct SingleAnalysisResponse {
    #[serde(flatten)]
    pub analysis: CandidateAnalysis,
    pub credits_remaining: u32,
}

/// 批量分析响应
#[derive(Debug, Clone, Deserialize)]
pub struct BatchAnalysisResponse {
    #[serde(flatten)]
    pub result: RankingResult,
    pub credits_remaining: u32,
}

#[derive(Debug, Serialize)]
pub struct ExportRequest<'a> {
    pub ranking: &'a [CandidateScore],
}

/// 错误响应体
///
/// `detail` 可能是字符串，也可能是 `[{ "msg": ... }]` 形式的列表
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// 提取可展示的消息
    pub fn into_message(self) -> Option<String> {
        let from_detail = match self.detail {
            Some(Value::String(s)) => Some(s),
            Some(Value::Array(items)) => {
                let msgs: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        other => other.get("msg").and_then(|m| m.as_str()).map(str::to_string),
                    })
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            _ => None,
        };
        from_detail.or(self.message).filter(|m| !m.trim().is_empty())
    }
}
