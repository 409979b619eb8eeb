use thiserror::Error;

/// 通用的连接失败提示（服务器没有返回可展示的消息时使用）
pub const CONNECTIVITY_MESSAGE: &str = "无法连接服务器，请检查网络连接后重试";

/// 分析失败的通用提示
pub const ANALYSIS_FAILED_MESSAGE: &str = "分析失败，请稍后重试";

/// 服务器响应无法解析时的提示
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "服务器响应异常，请稍后重试";

/// 访问码被拒绝时的通用提示
pub const INVALID_CODE_MESSAGE: &str = "访问码无效";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 客户端前置条件校验失败（不会发起网络请求）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 访问码或令牌被拒绝
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 网络错误，可安全重试
    #[error("网络错误: {0}")]
    Transient(#[from] TransientError),
    /// 服务器返回了结构化的失败
    #[error("服务器错误: {0}")]
    Remote(#[from] RemoteError),
    /// 已有分析任务在进行中
    #[error("已有分析任务正在进行")]
    ConcurrentSubmission,
    /// 会话存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 读取简历文件失败
    #[error("读取文件失败 ({path}): {source}")]
    Document {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 客户端校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("请输入访问码")]
    EmptyCode,
    #[error("请至少选择一份简历")]
    NoDocuments,
    #[error("批量分析需要填写职位描述")]
    MissingDescription,
    #[error("文件 {name} 为空")]
    EmptyDocument { name: String },
    #[error("单份分析只能提交一份简历，当前选择了 {count} 份")]
    TooManyDocuments { count: usize },
    #[error("积分不足: 需要 {required}，剩余 {available}")]
    InsufficientCredits { required: u32, available: u32 },
    #[error("文件 {name} 的类型无效: {media_type}")]
    InvalidMediaType { name: String, media_type: String },
}

/// 认证错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 访问码被服务器拒绝
    #[error("{message}")]
    CodeRejected { message: String },
    /// 兑换访问码时无法连通服务器
    #[error("{message}")]
    Unreachable {
        message: String,
        #[source]
        source: Box<AppError>,
    },
    /// 令牌无效或已过期
    #[error("{message}")]
    TokenRejected { message: String },
    /// 当前没有持有令牌
    #[error("尚未登录，请先兑换访问码")]
    NotAuthenticated,
}

/// 网络错误
#[derive(Debug, Error)]
pub enum TransientError {
    #[error("请求失败 ({endpoint}): {source}")]
    Network {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

/// 服务器返回的失败
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("服务器拒绝请求 ({endpoint}): status={status}, message={message:?}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    #[error("无法解析服务器响应 ({endpoint}): {source}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

/// 会话存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("读写会话文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("会话文件格式错误 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("序列化会话失败: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 没有可导出的排名
    #[error("没有可导出的排名结果")]
    NoRanking,
    #[error("保存导出文件失败 ({path}): {source}")]
    SaveFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建网络请求失败错误
    pub fn network(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Transient(TransientError::Network {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建服务器拒绝错误
    pub fn rejected(endpoint: impl Into<String>, status: u16, message: Option<String>) -> Self {
        AppError::Remote(RemoteError::Rejected {
            endpoint: endpoint.into(),
            status,
            message,
        })
    }

    /// 创建响应解析失败错误
    pub fn malformed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Remote(RemoteError::MalformedResponse {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 面向用户的提示
    ///
    /// 服务器给出消息时原样返回，否则使用通用提示
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Auth(e) => e.to_string(),
            AppError::Transient(_) => CONNECTIVITY_MESSAGE.to_string(),
            AppError::Remote(RemoteError::Rejected {
                message: Some(message),
                ..
            }) if !message.trim().is_empty() => message.clone(),
            AppError::Remote(RemoteError::MalformedResponse { .. }) => UNEXPECTED_RESPONSE_MESSAGE.to_string(),
            AppError::Remote(_) => ANALYSIS_FAILED_MESSAGE.to_string(),
            AppError::ConcurrentSubmission => "已有分析任务正在进行，请等待完成".to_string(),
            AppError::Store(_) => "无法保存会话信息".to_string(),
            AppError::Export(ExportError::NoRanking) => "没有可导出的排名结果".to_string(),
            AppError::Export(_) => "无法保存导出文件".to_string(),
            AppError::Document { path, .. } => format!("无法读取文件: {}", path),
        }
    }

    /// 是否可以直接重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_shown_verbatim() {
        let err = AppError::rejected("/api/analyze-batch", 403, Some("Créditos insuficientes.".into()));
        assert_eq!(err.user_message(), "Créditos insuficientes.");
        assert!(!err.is_retryable());
    }

    #[test]
    fn blank_server_message_falls_back() {
        let err = AppError::rejected("/api/analyze-batch", 500, Some("  ".into()));
        assert_eq!(err.user_message(), ANALYSIS_FAILED_MESSAGE);

        let err = AppError::rejected("/api/analyze-batch", 500, None);
        assert_eq!(err.user_message(), ANALYSIS_FAILED_MESSAGE);
    }

    #[test]
    fn malformed_response_is_not_retryable() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AppError::malformed("/api/validate-code", source);
        assert_eq!(err.user_message(), UNEXPECTED_RESPONSE_MESSAGE);
        assert!(!err.is_retryable());
    }

    #[test]
    fn network_errors_use_connectivity_message() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = AppError::network("/api/session-info", io);
        assert_eq!(err.user_message(), CONNECTIVITY_MESSAGE);
        assert!(err.is_retryable());
    }

    #[test]
    fn auth_errors_carry_their_message() {
        let err: AppError = AuthError::CodeRejected {
            message: "Código no válido".into(),
        }
        .into();
        assert_eq!(err.user_message(), "Código no válido");
    }
}
